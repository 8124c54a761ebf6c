use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Drive an in-memory port instead of real registers.
    pub simulate: bool,
    pub mem_path: String,
    /// Physical address the register offsets are relative to.
    pub base_address: u64,
    pub direction_offset: usize,
    pub data_offset: usize,
    /// How many times the clock line is refreshed, one second apart.
    pub frames: u32,
}

impl Config {
    /// Loads the config from `$CONFIG_FILE`, or `config.json` if unset.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn try_load() -> Result<Option<Self>, ConfigError> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            simulate: true,
            mem_path: "/dev/mem".to_string(),
            base_address: 0,
            // DDRB/PORTB on an ATmega328P
            direction_offset: 0x24,
            data_offset: 0x25,
            frames: 1,
        }
    }
}
