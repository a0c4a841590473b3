//! Configuration for the thermpdo bridge.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermpdo_common::LoggingConfig;
use thiserror::Error;

use crate::args::BridgeArgs;
use crate::bus::{CobId, SensorAddress};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] thermpdo_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermBridgeConfig {
    /// Sensor side (I2C)
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Frame side (CAN)
    #[serde(default)]
    pub can: CanConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// DS1621 connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// I2C character device (default: "/dev/i2c-1")
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: PathBuf,

    /// 7-bit device address (default: 0x48)
    #[serde(default = "default_address")]
    pub address: u8,

    /// Switch the device to one-shot mode at startup
    #[serde(default = "default_one_shot")]
    pub one_shot: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            address: default_address(),
            one_shot: default_one_shot(),
        }
    }
}

fn default_i2c_bus() -> PathBuf {
    PathBuf::from("/dev/i2c-1")
}

fn default_address() -> u8 {
    SensorAddress::DEFAULT.raw()
}

fn default_one_shot() -> bool {
    true
}

/// PDO transmission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanConfig {
    /// SocketCAN interface (default: "slcan0")
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Standard identifier of the PDO (default: 0x1AB)
    #[serde(default = "default_cob_id")]
    pub cob_id: u16,

    /// Seconds between PDOs and between sensor acquisitions
    #[serde(default = "default_interval")]
    pub interval_secs: f64,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            cob_id: default_cob_id(),
            interval_secs: default_interval(),
        }
    }
}

fn default_interface() -> String {
    "slcan0".to_string()
}

fn default_cob_id() -> u16 {
    CobId::DEFAULT.raw()
}

fn default_interval() -> f64 {
    10.0
}

impl ThermBridgeConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(thermpdo_common::load_config(path)?)
    }

    /// Resolve the configuration for a command line.
    ///
    /// An explicit `--config` must exist. Without one, the default file is
    /// used when present and built-in defaults otherwise. Command line values
    /// win over the file.
    pub fn from_args(args: &BridgeArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None if Path::new(BridgeArgs::DEFAULT_CONFIG).exists() => {
                Self::load_from_file(BridgeArgs::DEFAULT_CONFIG)?
            }
            None => Self::default(),
        };

        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Override file values with command line values.
    pub fn apply_args(&mut self, args: &BridgeArgs) {
        if let Some(address) = args.address {
            self.sensor.address = address;
        }
        if let Some(interval) = args.interval {
            self.can.interval_secs = interval;
        }
        if let Some(cob_id) = args.cob_id {
            self.can.cob_id = cob_id;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.i2c_bus.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "sensor.i2c_bus cannot be empty".to_string(),
            ));
        }

        // 0x00-0x02 and 0x78-0x7F are reserved I2C addresses
        if !(0x03..=0x77).contains(&self.sensor.address) {
            return Err(ConfigError::Validation(format!(
                "sensor.address 0x{:02x} is not a valid 7-bit I2C address",
                self.sensor.address
            )));
        }

        if self.can.interface.is_empty() {
            return Err(ConfigError::Validation(
                "can.interface cannot be empty".to_string(),
            ));
        }

        if self.can.cob_id > CobId::MAX {
            return Err(ConfigError::Validation(format!(
                "can.cob_id 0x{:x} does not fit a standard 11-bit identifier",
                self.can.cob_id
            )));
        }

        self.interval()?;

        Ok(())
    }

    pub fn address(&self) -> SensorAddress {
        SensorAddress(self.sensor.address)
    }

    pub fn cob_id(&self) -> Result<CobId, ConfigError> {
        CobId::new(self.can.cob_id).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// The PDO and acquisition period.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        let secs = self.can.interval_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "can.interval_secs must be a positive number of seconds, got {}",
                secs
            )));
        }

        Duration::try_from_secs_f64(secs)
            .map_err(|e| ConfigError::Validation(format!("can.interval_secs {}: {}", secs, e)))
    }
}
