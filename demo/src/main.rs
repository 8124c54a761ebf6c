mod config;

use crate::config::Config;
use dotenv::dotenv;
use log::{debug, info};
use portlcd_driver::delay::NoopDelay;
use portlcd_driver::lcd::hd44780::display::CharDisplay;
use portlcd_driver::lcd::hd44780::driver::{COLUMNS, HD44780Driver, PortHD44780Driver};
use portlcd_driver::raw::RawPort;
use portlcd_driver::soft::{SoftRegister, SoftScreen, decode_transmissions};
use portlcd_driver::PortConfig;
use std::fmt::Write;
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;
use time::OffsetDateTime;

const UNKNOWN_STR: &str = "???";

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    let config = Config::try_load()?.unwrap_or_default();
    debug!("{:?}", config);

    if config.simulate {
        let direction = SoftRegister::new(0);
        let data = SoftRegister::new(0);
        let mut display = CharDisplay::new(PortHD44780Driver::with_delay(
            PortConfig::new(&direction, &data),
            NoopDelay,
        ));

        run(&mut display, config.frames)?;

        let history = data.history();
        let transmissions = decode_transmissions(history[0], &history[1..]);
        let screen = SoftScreen::from_transmissions(&transmissions);
        info!("Simulated display after {} port writes:", history.len());
        info!("+----------------+");
        info!("|{}|", screen.row(0));
        info!("|{}|", screen.row(1));
        info!("+----------------+");
    } else {
        info!("LCD @ {} base {:#x}, DDR +{:#x}, PORT +{:#x}",
            config.mem_path, config.base_address, config.direction_offset, config.data_offset);

        let port = RawPort::create(&config.mem_path, config.base_address)?;
        let registers = port.register_pair(config.direction_offset, config.data_offset)?;
        let mut display = CharDisplay::new(PortHD44780Driver::new(registers.config()));

        run(&mut display, config.frames)?;
    }

    Ok(())
}

/// Shows the host name on the first row and a clock with a frame counter on the second.
fn run<T: HD44780Driver>(display: &mut CharDisplay<T>, frames: u32) -> eyre::Result<()> {
    display.init()?;

    let host = System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string());
    let host = &host.as_bytes()[..host.len().min(COLUMNS as usize)];
    display.write(host)?;

    for frame in 0..frames {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

        display.clear_from(1, 0)?;
        display.move_cursor(1, 0)?;
        write!(display, "{:02}:{:02}:{:02}  ", now.hour(), now.minute(), now.second())?;
        // Counts up to the "xx" placeholder and starts over
        display.number((frame % 21) as u8)?;

        if frame + 1 < frames {
            sleep(Duration::from_secs(1));
        }
    }

    Ok(())
}
