use anyhow::{Context, Result};
use ranger_proto::ranging::RangingMessage;
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

use crate::LinkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Link disabled or port not open; the message went to the log only.
    Logged,
}

/// Serial channel to the actuator controller. One write attempt per message, no queue.
pub struct ActuatorLink {
    enabled: bool,
    dev: Option<String>,
    port: Option<SerialStream>,
}

impl ActuatorLink {
    pub fn disabled() -> Self {
        Self { enabled: false, dev: None, port: None }
    }

    /// A missing device with the link enabled is a config error. A device that
    /// fails to open only degrades the link to logging.
    pub fn open(cfg: &LinkConfig) -> Result<Self> {
        if !cfg.enable {
            info!("link: disabled, messages will be logged");
            return Ok(Self::disabled());
        }
        let dev = cfg.serial_dev.clone().context("link.serial_dev missing (enable=true)")?;

        match tokio_serial::new(&dev, cfg.baud).open_native_async() {
            Ok(p) => {
                info!("link: opened {} @ {}", dev, cfg.baud);
                Ok(Self::from_port(dev, p))
            }
            Err(e) => {
                warn!("link: open serial {} failed: {} - messages will be logged", dev, e);
                Ok(Self { enabled: true, dev: Some(dev), port: None })
            }
        }
    }

    /// Enabled link over an already opened port.
    pub fn from_port(dev: impl Into<String>, port: SerialStream) -> Self {
        Self { enabled: true, dev: Some(dev.into()), port: Some(port) }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub async fn send(&mut self, msg: &RangingMessage) -> Delivery {
        if !self.enabled {
            info!("link: would send {:?}", msg);
            return Delivery::Logged;
        }
        let Some(port) = self.port.as_mut() else {
            warn!("link: serial port is not open, dropping {:?}", msg);
            return Delivery::Logged;
        };

        let bytes = match msg.encode() {
            Ok(b) => b,
            Err(e) => {
                warn!("link: encode {:?} failed: {}", msg, e);
                return Delivery::Logged;
            }
        };

        let res = async {
            port.write_all(&bytes).await?;
            port.flush().await
        }
        .await;

        match res {
            Ok(()) => {
                info!("link: sent {:?}", msg);
                Delivery::Sent
            }
            Err(e) => {
                warn!(
                    "link: write to {} failed: {} - closing port, dropping {:?}",
                    self.dev.as_deref().unwrap_or("?"),
                    e,
                    msg
                );
                self.port = None;
                Delivery::Logged
            }
        }
    }
}
