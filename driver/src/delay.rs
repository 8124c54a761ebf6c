//! Blocking delays used to pace the display protocol.
//!
//! The display is never polled for its busy flag, so every wait is open-loop and has to run to
//! completion before the next transmission. Any [DelayNs] implementation works; these two cover
//! hosts without a HAL.

use embedded_hal::delay::DelayNs;
use std::hint::spin_loop;
use std::time::{Duration, Instant};

/// Busy-waits on the monotonic clock. Does not yield to the scheduler.
#[derive(Copy, Clone, Debug, Default)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let duration = Duration::from_nanos(ns as u64);
        let start = Instant::now();
        while start.elapsed() < duration {
            spin_loop();
        }
    }
}

/// Returns immediately. Meant for simulated ports, where there is no controller to wait for.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
