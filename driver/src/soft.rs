//! Software port registers and a minimal display model.
//!
//! [SoftRegister] stands in for a real port: it keeps its value in memory and records every write.
//! [decode_transmissions] turns the recorded data register writes back into the bytes the display
//! would have latched, and [SoftScreen] replays those bytes to show what would end up on the glass.

use crate::lcd::hd44780::driver::{
    CLEAR_DISPLAY, COLUMNS, DATA_MASK, E_MASK, RETURN_HOME, ROWS, ROW_STRIDE, RS_MASK,
    SET_CGRAM_ADDRESS, SET_DDRAM_ADDRESS,
};
use crate::{PortRegister, PortResult};
use log::trace;
use std::cell::{Cell, RefCell};

/// In-memory port register. Every write is appended to the history.
#[derive(Debug, Default)]
pub struct SoftRegister {
    value: Cell<u8>,
    history: RefCell<Vec<u8>>,
}

impl SoftRegister {
    pub fn new(initial: u8) -> Self {
        SoftRegister {
            value: Cell::new(initial),
            history: RefCell::new(Vec::new()),
        }
    }

    pub fn value(&self) -> u8 {
        self.value.get()
    }

    /// Gets all values written so far, oldest first.
    pub fn history(&self) -> Vec<u8> {
        self.history.borrow().clone()
    }

    /// Drains the history, keeping the current value.
    pub fn take_history(&self) -> Vec<u8> {
        self.history.take()
    }
}

impl PortRegister for SoftRegister {
    fn read(&self) -> PortResult<u8> {
        Ok(self.value.get())
    }

    fn write(&self, value: u8) -> PortResult<()> {
        self.value.set(value);
        self.history.borrow_mut().push(value);
        Ok(())
    }
}

/// A byte as latched by the display controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transmission {
    /// Register select level, `true` for character data, `false` for instructions.
    pub rs: bool,
    pub byte: u8,
}

impl Transmission {
    pub fn command(byte: u8) -> Self {
        Transmission { rs: false, byte }
    }

    pub fn data(byte: u8) -> Self {
        Transmission { rs: true, byte }
    }
}

/// Reconstructs the transmitted bytes from a sequence of data register values.
///
/// The controller latches the upper nibble on every falling edge of E. Nibbles are paired high
/// first; a trailing unpaired nibble is dropped. The RS level of a byte is the one present when its
/// second nibble was latched.
pub fn decode_transmissions(initial: u8, history: &[u8]) -> Vec<Transmission> {
    let mut transmissions = Vec::new();
    let mut previous = initial;
    let mut high: Option<u8> = None;

    for &value in history {
        if previous & E_MASK != 0 && value & E_MASK == 0 {
            let nibble = value & DATA_MASK;
            match high.take() {
                None => high = Some(nibble),
                Some(high_nibble) => transmissions.push(Transmission {
                    rs: value & RS_MASK != 0,
                    byte: high_nibble | (nibble >> 4),
                }),
            }
        }
        previous = value;
    }

    transmissions
}

/// What the display would show after replaying a list of transmissions.
///
/// Only the instructions the driver relies on are modeled. Anything else is ignored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoftScreen {
    cells: [[u8; COLUMNS as usize]; ROWS as usize],
    address: u8,
    cgram: bool,
}

impl Default for SoftScreen {
    fn default() -> Self {
        SoftScreen {
            cells: [[b' '; COLUMNS as usize]; ROWS as usize],
            address: 0,
            cgram: false,
        }
    }
}

impl SoftScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transmissions(transmissions: &[Transmission]) -> Self {
        let mut screen = Self::new();
        for transmission in transmissions {
            screen.apply(*transmission);
        }
        screen
    }

    pub fn apply(&mut self, transmission: Transmission) {
        let byte = transmission.byte;

        if transmission.rs {
            if self.cgram {
                self.address = (self.address + 1) & 0b00111111;
                return;
            }
            let row = (self.address / ROW_STRIDE) as usize;
            let column = (self.address % ROW_STRIDE) as usize;
            if row < ROWS as usize && column < COLUMNS as usize {
                self.cells[row][column] = byte;
            }
            self.address = (self.address + 1) & 0b01111111;
            return;
        }

        if byte & SET_DDRAM_ADDRESS != 0 {
            self.address = byte & 0b01111111;
            self.cgram = false;
        } else if byte & SET_CGRAM_ADDRESS != 0 {
            self.address = byte & 0b00111111;
            self.cgram = true;
        } else if byte & RETURN_HOME != 0 && byte & 0b11111100 == 0 {
            self.address = 0;
            self.cgram = false;
        } else if byte == CLEAR_DISPLAY {
            self.cells = [[b' '; COLUMNS as usize]; ROWS as usize];
            self.address = 0;
            self.cgram = false;
        } else {
            trace!("SoftScreen ignoring instruction {:08b}", byte);
        }
    }

    /// Gets the DDRAM address the next character would be written to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gets a row as text. Bytes outside printable ASCII are shown as `?`.
    pub fn row(&self, row: usize) -> String {
        self.cells[row]
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect()
    }
}
