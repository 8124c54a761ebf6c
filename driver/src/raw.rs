use crate::{PortConfig, PortError, PortRegister, PortResult};
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::marker::PhantomData;
use std::path::Path;

/// Port registers accessed through a memory-mapped window of physical memory.
///
/// The window covers one page starting at the page containing `base`, so register offsets are
/// relative to `base` and must stay inside that page.
pub struct RawPort {
    mmap: MmapRaw,
    base_offset: usize,
}

impl RawPort {
    const PAGE_SIZE: u64 = 4096;

    pub fn create(path: impl AsRef<Path>, base: u64) -> PortResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        let page = base & !(Self::PAGE_SIZE - 1);
        let mmap = MmapOptions::new()
            .offset(page)
            .len(Self::PAGE_SIZE as usize)
            .map_raw(&file)?;

        debug!("Mapped port registers at {:#x} from {}", base, path.as_ref().display());

        Ok(RawPort {
            mmap,
            base_offset: (base - page) as usize,
        })
    }

    pub fn new_mem(base: u64) -> PortResult<Self> {
        Self::create("/dev/mem", base)
    }

    /// Gets the register at `offset` bytes from the base address.
    ///
    /// # Errors
    /// - `PortError::InvalidArgument` if the register lies outside the mapped page.
    pub fn register(&self, offset: usize) -> PortResult<RawRegister<'_>> {
        let index = self.base_offset + offset;
        if index >= self.mmap.len() {
            return Err(PortError::InvalidArgument);
        }

        // In bounds of the mapping, checked above
        let ptr = unsafe { self.mmap.as_mut_ptr().add(index) };

        Ok(RawRegister {
            ptr,
            offset,
            _port: PhantomData,
        })
    }

    /// Gets the direction and data registers at the given offsets.
    ///
    /// The registers still have to be borrowed into a [PortConfig], see [RawRegisterPair::config].
    pub fn register_pair(
        &self,
        direction_offset: usize,
        data_offset: usize,
    ) -> PortResult<RawRegisterPair<'_>> {
        Ok(RawRegisterPair {
            direction: self.register(direction_offset)?,
            data: self.register(data_offset)?,
        })
    }
}

impl Debug for RawPort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawPort({:?}+{:#x})", self.mmap.as_ptr().addr(), self.base_offset)
    }
}

/// A single byte-wide register inside a [RawPort] mapping.
pub struct RawRegister<'a> {
    ptr: *mut u8,
    offset: usize,
    _port: PhantomData<&'a RawPort>,
}

impl Debug for RawRegister<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawRegister(+{:#x})", self.offset)
    }
}

impl PortRegister for RawRegister<'_> {
    fn read(&self) -> PortResult<u8> {
        Ok(unsafe { self.ptr.read_volatile() })
    }

    fn write(&self, value: u8) -> PortResult<()> {
        unsafe { self.ptr.write_volatile(value) };
        Ok(())
    }
}

#[derive(Debug)]
pub struct RawRegisterPair<'a> {
    pub direction: RawRegister<'a>,
    pub data: RawRegister<'a>,
}

impl RawRegisterPair<'_> {
    pub fn config(&self) -> PortConfig<'_> {
        PortConfig::new(&self.direction, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn port_file(name: &str) -> std::path::PathBuf {
        let file_name = format!("portlcd-raw-{}-{}", name, std::process::id());
        let path = std::env::temp_dir().join(file_name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 2 * RawPort::PAGE_SIZE as usize]).unwrap();
        path
    }

    #[test]
    fn registers_read_back_written_values() {
        let path = port_file("rw");
        let port = RawPort::create(&path, 0x20).unwrap();
        let pair = port.register_pair(0x0A, 0x0B).unwrap();
        let config = pair.config();

        config.direction.write(0xF3).unwrap();
        config.data.write(0x02).unwrap();
        config.data.set_bits(0x01).unwrap();

        assert_eq!(config.direction.read().unwrap(), 0xF3);
        assert_eq!(config.data.read().unwrap(), 0x03);

        drop(pair);
        drop(port);
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents[0x2A], 0xF3);
        assert_eq!(contents[0x2B], 0x03);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn unaligned_base_maps_enclosing_page() {
        let path = port_file("unaligned");
        let port = RawPort::create(&path, 0x1FF0).unwrap();
        port.register(0x05).unwrap().write(0xAB).unwrap();
        drop(port);
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents[0x1FF5], 0xAB);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn offsets_outside_the_page_are_rejected() {
        let path = port_file("bounds");
        let port = RawPort::create(&path, 0xFF0).unwrap();
        assert_eq!(port.register(0x10).unwrap_err(), PortError::InvalidArgument);
        assert!(port.register(0x0F).is_ok());
        drop(port);
        std::fs::remove_file(path).unwrap();
    }
}
