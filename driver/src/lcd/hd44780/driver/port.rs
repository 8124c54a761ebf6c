use crate::delay::SpinDelay;
use crate::lcd::hd44780::driver::{
    CursorDirection, DATA_MASK, E_MASK, FOUR_BIT_HANDSHAKE, HD44780Driver, RS_MASK,
};
use crate::{PortConfig, PortResult};
use embedded_hal::delay::DelayNs;
use log::{debug, trace};
use std::fmt::Debug;

/// HD44780 driver for a display wired to a single 8-bit port.
///
/// The upper nibble of the port carries data in 4-bit mode, bit 1 is RS and bit 0 is E. The R/W
/// line is expected to be tied low, so the controller is never read: after every byte the driver
/// waits [Self::BYTE_SETTLE_US] microseconds, and after every instruction additionally
/// [Self::COMMAND_SETTLE_MS] milliseconds, which covers even the slow clear and return home
/// instructions.
///
/// Between instructions RS is left high, so character bytes can be sent without touching it.
#[derive(Debug)]
pub struct PortHD44780Driver<'a, D: DelayNs = SpinDelay> {
    config: PortConfig<'a>,
    delay: D,
}

impl<'a> PortHD44780Driver<'a, SpinDelay> {
    pub fn new(config: PortConfig<'a>) -> Self {
        Self::with_delay(config, SpinDelay)
    }
}

impl<'a, D: DelayNs> PortHD44780Driver<'a, D> {
    /// Gap between the two nibbles of a byte, one instruction cycle of a 1 MHz core.
    pub const NIBBLE_GAP_NS: u32 = 1_000;
    pub const BYTE_SETTLE_US: u32 = 50;
    pub const COMMAND_SETTLE_MS: u32 = 5;

    /// Direction register value while driving the display: data nibble, RS and E as outputs.
    pub const DIRECTION_ACTIVE: u8 = DATA_MASK | RS_MASK | E_MASK;
    /// Direction register value written when switching ports: only the data nibble as outputs.
    pub const DIRECTION_RECONFIGURED: u8 = DATA_MASK;

    pub fn with_delay(config: PortConfig<'a>, delay: D) -> Self {
        PortHD44780Driver { config, delay }
    }

    pub fn config(&self) -> PortConfig<'a> {
        self.config
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Swaps the port the display is driven through and returns the previous one.
    ///
    /// Only the upper nibble of the new port is switched to output; the lower nibble is left to
    /// whatever else shares the port.
    pub fn set_config(&mut self, config: PortConfig<'a>) -> PortResult<PortConfig<'a>> {
        debug!("Switching LCD port to {:?}", config);
        let previous = std::mem::replace(&mut self.config, config);
        self.config.direction.write(Self::DIRECTION_RECONFIGURED)?;
        Ok(previous)
    }

    /// Presents the upper nibble of `nibble` on the data lines and strobes E.
    ///
    /// The lower nibble of the data register (RS and E) is kept as it is.
    pub fn send_nibble(&mut self, nibble: u8) -> PortResult<()> {
        debug_assert_eq!(nibble & !DATA_MASK, 0, "nibble must be in the upper half");
        trace!("Writing nibble: {:04b}", nibble >> 4);

        let data = self.config.data;
        data.set_bits(E_MASK)?;
        let control = data.read()? & !DATA_MASK;
        data.write(nibble | control)?;
        data.clear_bits(E_MASK)?;
        Ok(())
    }

    /// Sends a whole byte as two nibbles, high first, then waits for the controller to process it.
    pub fn send_byte(&mut self, byte: u8) -> PortResult<()> {
        trace!("Sending byte: {:08b}", byte);

        self.send_nibble(byte & DATA_MASK)?;
        self.delay.delay_ns(Self::NIBBLE_GAP_NS);
        self.send_nibble((byte & !DATA_MASK) << 4)?;

        self.delay.delay_us(Self::BYTE_SETTLE_US);
        Ok(())
    }
}

impl<D: DelayNs + Debug> HD44780Driver for PortHD44780Driver<'_, D> {
    fn init(&mut self) -> PortResult<()> {
        debug!("Initializing LCD on {:?}", self.config);

        self.config.direction.write(Self::DIRECTION_ACTIVE)?;
        self.config.data.write(0)?;

        self.send_command(FOUR_BIT_HANDSHAKE)?;
        self.function_set(false, true, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.set_display_control(true, false, false)?;
        self.clear_display()?;
        Ok(())
    }

    /// Drops RS for the duration of the byte and raises it again afterwards.
    fn send_command(&mut self, command: u8) -> PortResult<()> {
        trace!("Sending command: {:08b}", command);

        self.config.data.clear_bits(RS_MASK)?;
        self.send_byte(command)?;
        self.config.data.set_bits(RS_MASK)?;

        self.delay.delay_ms(Self::COMMAND_SETTLE_MS);
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> PortResult<()> {
        self.send_byte(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoopDelay;
    use crate::soft::{SoftRegister, Transmission, decode_transmissions};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct RecordingDelay {
        waits: Vec<Duration>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waits.push(Duration::from_nanos(ns as u64));
        }

        fn delay_us(&mut self, us: u32) {
            self.waits.push(Duration::from_micros(us as u64));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.waits.push(Duration::from_millis(ms as u64));
        }
    }

    #[test]
    fn nibble_keeps_control_bits() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(RS_MASK);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction, &data), NoopDelay);

        driver.send_nibble(0xA0).unwrap();

        assert_eq!(data.history(), vec![0x03, 0xA3, 0xA2]);
    }

    #[test]
    fn byte_is_sent_high_nibble_first() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(RS_MASK);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction, &data), NoopDelay);

        driver.send_byte(0xA5).unwrap();

        assert_eq!(data.history(), vec![0x03, 0xA3, 0xA2, 0xA3, 0x53, 0x52]);
    }

    #[test]
    fn every_nibble_is_strobed_once() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(RS_MASK);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction, &data), NoopDelay);

        for byte in [0x00, 0x0F, 0xF0, 0xFF, 0x3C] {
            driver.send_byte(byte).unwrap();
        }

        let history = data.history();
        let falling_edges = std::iter::once(RS_MASK)
            .chain(history.iter().copied())
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| w[0] & E_MASK != 0 && w[1] & E_MASK == 0)
            .count();
        assert_eq!(falling_edges, 10);
        assert_eq!(
            decode_transmissions(RS_MASK, &history),
            [0x00, 0x0F, 0xF0, 0xFF, 0x3C].map(Transmission::data).to_vec()
        );
    }

    #[test]
    fn byte_timing() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(RS_MASK);
        let mut driver = PortHD44780Driver::with_delay(
            PortConfig::new(&direction, &data),
            RecordingDelay::default(),
        );

        driver.send_byte(b'x').unwrap();

        assert_eq!(
            driver.delay_mut().waits,
            vec![Duration::from_micros(1), Duration::from_micros(50)]
        );
    }

    #[test]
    fn command_toggles_rs_and_waits() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(RS_MASK);
        let mut driver = PortHD44780Driver::with_delay(
            PortConfig::new(&direction, &data),
            RecordingDelay::default(),
        );

        driver.send_command(0x84).unwrap();

        assert_eq!(
            data.history(),
            vec![0x00, 0x01, 0x81, 0x80, 0x81, 0x41, 0x40, 0x42]
        );
        assert_eq!(data.value() & RS_MASK, RS_MASK);
        assert_eq!(
            driver.delay_mut().waits,
            vec![
                Duration::from_micros(1),
                Duration::from_micros(50),
                Duration::from_millis(5),
            ]
        );
    }

    #[test]
    fn data_leaves_rs_alone() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(0);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction, &data), NoopDelay);

        driver.send_data(b'A').unwrap();

        assert_eq!(
            decode_transmissions(0, &data.history()),
            vec![Transmission::command(b'A')]
        );
    }

    #[test]
    fn init_sequence() {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(0xFF);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction, &data), NoopDelay);

        driver.init().unwrap();

        assert_eq!(direction.history(), vec![0xF3]);
        let history = data.history();
        // Zeroing the port drops E as well; only decode what follows
        assert_eq!(history[0], 0x00);
        assert_eq!(
            decode_transmissions(history[0], &history[1..]),
            [0x02, 0x28, 0x06, 0x0C, 0x01].map(Transmission::command).to_vec()
        );
        // RS back high, low nibble of the final clear still on the data lines
        assert_eq!(data.value() & !DATA_MASK, RS_MASK);
        assert_eq!(data.value(), 0x12);
    }

    #[test]
    fn set_config_switches_port() {
        let direction_a = SoftRegister::new(0);
        let data_a = SoftRegister::new(0);
        let direction_b = SoftRegister::new(0x0F);
        let data_b = SoftRegister::new(RS_MASK);
        let mut driver =
            PortHD44780Driver::with_delay(PortConfig::new(&direction_a, &data_a), NoopDelay);

        let previous = driver.set_config(PortConfig::new(&direction_b, &data_b)).unwrap();
        driver.send_data(b'Z').unwrap();

        assert_eq!(previous.direction.read().unwrap(), 0);
        assert_eq!(direction_b.history(), vec![0xF0]);
        assert!(data_a.history().is_empty());
        assert_eq!(
            decode_transmissions(RS_MASK, &data_b.history()),
            vec![Transmission::data(b'Z')]
        );
    }
}
