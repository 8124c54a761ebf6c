//! HD44780 character LCD module.
//!
//! [driver] holds the instruction set and the port-multiplexed 4-bit transport, [display] the
//! 2x16 cursor and addressing model built on top of it.

pub mod display;
pub mod driver;
