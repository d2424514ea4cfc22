pub mod gate;
pub mod link;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// When false, messages are logged instead of written to the serial port.
    #[serde(default)]
    pub enable: bool,

    /// e.g. /dev/ttyACM0 (Arduino) or /dev/ttyUSB0
    pub serial_dev: Option<String>,

    #[serde(default = "default_baud")]
    pub baud: u32,
}

fn default_baud() -> u32 { 9600 }

impl Default for LinkConfig {
    fn default() -> Self {
        Self { enable: false, serial_dev: None, baud: default_baud() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Minimum gap between announcements while a target stays in view.
    #[serde(default = "default_refresh_s")]
    pub refresh_s: f64,
}

fn default_refresh_s() -> f64 { 5.0 }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { refresh_s: default_refresh_s() }
    }
}
