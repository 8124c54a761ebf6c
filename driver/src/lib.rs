pub mod delay;
pub mod lcd;
pub mod raw;
pub mod soft;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PortError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for PortError {
    fn from(err: std::io::Error) -> Self {
        PortError::Io(err.kind())
    }
}

pub type PortResult<T> = Result<T, PortError>;

/// A byte-wide I/O register of the host microcontroller port.
///
/// Registers are shared handles, so writing goes through `&self`. Implementations are expected to
/// be confined to a single thread of control; nothing here synchronizes concurrent access.
pub trait PortRegister: Debug {
    /// Reads the current register value.
    fn read(&self) -> PortResult<u8>;

    /// Writes a new register value.
    fn write(&self, value: u8) -> PortResult<()>;

    /// Sets the bits in `mask`, leaving the other bits untouched.
    fn set_bits(&self, mask: u8) -> PortResult<()> {
        let value = self.read()?;
        self.write(value | mask)
    }

    /// Clears the bits in `mask`, leaving the other bits untouched.
    fn clear_bits(&self, mask: u8) -> PortResult<()> {
        let value = self.read()?;
        self.write(value & !mask)
    }
}

/// The port the display is wired to.
///
/// `direction` selects which of the eight lines are outputs, `data` drives their levels.
/// Both handles are borrowed; the caller keeps ownership of the registers.
#[derive(Copy, Clone, Debug)]
pub struct PortConfig<'a> {
    pub direction: &'a dyn PortRegister,
    pub data: &'a dyn PortRegister,
}

impl<'a> PortConfig<'a> {
    pub fn new(direction: &'a dyn PortRegister, data: &'a dyn PortRegister) -> Self {
        PortConfig { direction, data }
    }
}
