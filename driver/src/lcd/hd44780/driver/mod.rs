mod port;

use crate::{PortError, PortResult};
pub use port::*;
use std::fmt::Debug;

/// Port line carrying the enable strobe.
pub const E_BIT: u8 = 0;
/// Port line carrying register select.
pub const RS_BIT: u8 = 1;
pub const E_MASK: u8 = 1 << E_BIT;
pub const RS_MASK: u8 = 1 << RS_BIT;
/// Port lines carrying the data nibble.
pub const DATA_MASK: u8 = 0b11110000;

pub const ROWS: u8 = 2;
pub const COLUMNS: u8 = 16;
/// DDRAM distance between the start of two consecutive rows.
pub const ROW_STRIDE: u8 = 0x40;

pub const CLEAR_DISPLAY: u8 = 0b00000001;
pub const RETURN_HOME: u8 = 0b00000010;
pub const ENTRY_MODE_SET: u8 = 0b00000100;
pub const DISPLAY_CONTROL: u8 = 0b00001000;
pub const CURSOR_SHIFT: u8 = 0b00010000;
pub const FUNCTION_SET: u8 = 0b00100000;
pub const SET_CGRAM_ADDRESS: u8 = 0b01000000;
pub const SET_DDRAM_ADDRESS: u8 = 0b10000000;

/// Sent first after power-up, while the controller still listens on all eight lines.
/// Its upper nibble switches the interface to 4-bit mode.
pub const FOUR_BIT_HANDSHAKE: u8 = 0b00000010;

// Entry mode flags
pub const ENTRY_INCREMENT: u8 = 0b00000010;
pub const ENTRY_SHIFT: u8 = 0b00000001;

// Display control flags
pub const DISPLAY_ON: u8 = 0b00000100;
pub const CURSOR_ON: u8 = 0b00000010;
pub const BLINK_ON: u8 = 0b00000001;

// Cursor shift flags
pub const SHIFT_DISPLAY: u8 = 0b00001000;
pub const SHIFT_RIGHT: u8 = 0b00000100;

// Function set flags
pub const EIGHT_BIT_MODE: u8 = 0b00010000;
pub const TWO_ROWS: u8 = 0b00001000;
pub const WIDE_CHARACTERS: u8 = 0b00000100;

/// Write-only interface to an HD44780 controller.
///
/// There is no busy flag readback: implementations wait a fixed time after every transmission.
pub trait HD44780Driver: Debug {
    /// Initializes the controller: 4-bit interface, two rows, left-to-right entry, display on,
    /// cleared.
    fn init(&mut self) -> PortResult<()>;

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> PortResult<()> {
        self.send_command(CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position. The display contents are kept.
    fn return_home(&mut self) -> PortResult<()> {
        self.send_command(RETURN_HOME)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> PortResult<()> {
        let mut command = ENTRY_MODE_SET;
        if cursor_direction == CursorDirection::Right {
            command |= ENTRY_INCREMENT;
        }
        if shift {
            command |= ENTRY_SHIFT;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> PortResult<()> {
        let mut command = DISPLAY_CONTROL;
        if display_on {
            command |= DISPLAY_ON;
        }
        if cursor_on {
            command |= CURSOR_ON;
        }
        if blink_on {
            command |= BLINK_ON;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> PortResult<()> {
        let mut command = CURSOR_SHIFT;
        if display_shift {
            command |= SHIFT_DISPLAY;
        }
        if direction == CursorDirection::Right {
            command |= SHIFT_RIGHT;
        }
        self.send_command(command)
    }

    /// Sets the interface width, number of rows and font.
    fn function_set(&mut self, eight_bit: bool, two_rows: bool, wide_font: bool) -> PortResult<()> {
        let mut command = FUNCTION_SET;
        if eight_bit {
            command |= EIGHT_BIT_MODE;
        }
        if two_rows {
            command |= TWO_ROWS;
        }
        if wide_font {
            command |= WIDE_CHARACTERS;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> PortResult<()> {
        if address > 0b00111111 {
            return Err(PortError::InvalidArgument);
        }
        self.send_command(SET_CGRAM_ADDRESS | address)
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> PortResult<()> {
        if address > 0b01111111 {
            return Err(PortError::InvalidArgument);
        }
        self.send_command(SET_DDRAM_ADDRESS | address)
    }

    // Low-level commands
    // These are used by the high-level functions above and implemented by the transport.

    /// Sends an instruction byte with RS low.
    fn send_command(&mut self, command: u8) -> PortResult<()>;

    /// Sends a character byte. Relies on RS already being high.
    fn send_data(&mut self, data: u8) -> PortResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}
