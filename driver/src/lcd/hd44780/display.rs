//! Two-row, sixteen-column text display on top of an [HD44780Driver].
//!
//! The display tracks a single write column, not a full position: the row the cursor is on is
//! never remembered. Running off the end of a line always continues at the start of the second
//! row, even when the cursor already was on the second row. Clearing the display resets the
//! controller's address but not the tracked column. Callers rely on both behaviors.

use crate::lcd::hd44780::driver::{
    COLUMNS, HD44780Driver, PortHD44780Driver, ROWS, SET_DDRAM_ADDRESS,
};
use crate::{PortConfig, PortResult};
use embedded_hal::delay::DelayNs;
use log::warn;
use std::fmt;
use std::fmt::Debug;

#[derive(Debug)]
pub struct CharDisplay<T: HD44780Driver> {
    driver: T,
    cursor_column: u8,
}

impl<T: HD44780Driver> CharDisplay<T> {
    /// Highest value [Self::number] renders as digits.
    pub const NUMBER_MAX: u8 = 19;

    /// Wraps a driver. The controller is not touched until [Self::init].
    pub fn new(driver: T) -> Self {
        CharDisplay {
            driver,
            cursor_column: 0,
        }
    }

    pub fn driver(&self) -> &T {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut T {
        &mut self.driver
    }

    pub fn into_inner(self) -> T {
        self.driver
    }

    /// Gets the column the next character will be written to, as tracked by the driver.
    pub fn cursor_column(&self) -> u8 {
        self.cursor_column
    }

    /// Initializes the controller and starts writing at the first column.
    ///
    /// Can be called again at any time to bring the display back to a known state.
    pub fn init(&mut self) -> PortResult<()> {
        self.driver.init()?;
        self.cursor_column = 0;
        Ok(())
    }

    /// Moves the cursor to `column` of `row`.
    ///
    /// Coordinates are not validated. Anything outside the 2x16 grid produces an address the
    /// controller interprets on its own terms, and a column past 16 disables line wrapping in
    /// [Self::write] until the cursor is moved again.
    pub fn move_cursor(&mut self, row: u8, column: u8) -> PortResult<()> {
        if row >= ROWS || column >= COLUMNS {
            warn!("Cursor moved outside of the display: row {}, column {}", row, column);
        }

        self.driver.send_command(SET_DDRAM_ADDRESS | (row << 6) | column)?;
        self.cursor_column = column;
        Ok(())
    }

    /// Writes the bytes of `text` as character codes.
    ///
    /// When the tracked column reaches the end of a line, writing continues at the start of the
    /// second row.
    pub fn write(&mut self, text: impl AsRef<[u8]>) -> PortResult<()> {
        for &byte in text.as_ref() {
            if self.cursor_column == COLUMNS {
                self.move_cursor(1, 0)?;
            }

            self.driver.send_data(byte)?;
            self.cursor_column = self.cursor_column.wrapping_add(1);
        }
        Ok(())
    }

    /// Clears both rows. The tracked column is kept.
    pub fn clear(&mut self) -> PortResult<()> {
        self.driver.clear_display()
    }

    /// Returns the controller's cursor to the first column of the first row. The tracked column is
    /// kept.
    pub fn home(&mut self) -> PortResult<()> {
        self.driver.return_home()
    }

    /// Shows or hides the cursor, keeping the display on.
    pub fn set_cursor_visibility(&mut self, visible: bool, blink: bool) -> PortResult<()> {
        self.driver.set_display_control(true, visible, blink)
    }

    /// Writes `value` as exactly two characters.
    ///
    /// Single digits are padded with a trailing space and values above [Self::NUMBER_MAX] are
    /// shown as `xx`. Digits are sent straight to the controller without advancing the tracked
    /// column; the `xx` placeholder goes through [Self::write] and does advance it.
    pub fn number(&mut self, value: u8) -> PortResult<()> {
        if value > Self::NUMBER_MAX {
            return self.write("xx");
        }

        if value > 9 {
            self.driver.send_data(value / 10 + b'0')?;
            self.driver.send_data(value % 10 + b'0')?;
        } else {
            self.driver.send_data(value + b'0')?;
            self.driver.send_data(b' ')?;
        }
        Ok(())
    }

    /// Overwrites the current line with spaces, counting from `column` to the end of the line.
    ///
    /// Spaces are written from wherever the controller's cursor currently is, and the tracked
    /// column is not advanced.
    pub fn clear_line_from(&mut self, column: u8) -> PortResult<()> {
        for _ in column..COLUMNS {
            self.driver.send_data(b' ')?;
        }
        Ok(())
    }

    /// Clears `row` from `column` to the end of the line.
    ///
    /// Clearing from the first row also clears the whole second row. Afterwards the cursor is put
    /// back on `row`, at the column that was tracked before the call.
    pub fn clear_from(&mut self, row: u8, column: u8) -> PortResult<()> {
        let initial_column = self.cursor_column;

        self.move_cursor(row, column)?;
        self.clear_line_from(column)?;

        if row == 0 {
            self.move_cursor(1, 0)?;
            self.clear_line_from(0)?;
        }

        self.move_cursor(row, initial_column)?;
        self.cursor_column = initial_column;
        Ok(())
    }
}

impl<'a, D: DelayNs + Debug> CharDisplay<PortHD44780Driver<'a, D>> {
    /// Moves the display to another port, see [PortHD44780Driver::set_config].
    pub fn set_config(&mut self, config: PortConfig<'a>) -> PortResult<PortConfig<'a>> {
        self.driver.set_config(config)
    }
}

impl<T: HD44780Driver> fmt::Write for CharDisplay<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s).map_err(|_| fmt::Error)
    }
}
