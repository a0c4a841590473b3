//! SMBus register bus on Linux i2c-dev.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};

use crate::bus::{RegisterBus, SensorAddress};

/// Register bus backed by `/dev/i2c-N`.
///
/// One device handle is opened per slave address on first use and kept for
/// the lifetime of the bus.
pub struct LinuxI2cBus {
    path: PathBuf,
    devices: HashMap<SensorAddress, LinuxI2CDevice>,
}

impl LinuxI2cBus {
    /// Open the bus and bind the handle for `address`.
    pub fn open(path: impl AsRef<Path>, address: SensorAddress) -> Result<Self, LinuxI2CError> {
        let mut bus = Self {
            path: path.as_ref().to_path_buf(),
            devices: HashMap::new(),
        };
        bus.device(address)?;
        Ok(bus)
    }

    fn device(&mut self, address: SensorAddress) -> Result<&mut LinuxI2CDevice, LinuxI2CError> {
        match self.devices.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let device = LinuxI2CDevice::new(&self.path, u16::from(address.raw()))?;
                Ok(entry.insert(device))
            }
        }
    }
}

impl RegisterBus for LinuxI2cBus {
    type Error = LinuxI2CError;

    fn read_byte(&mut self, address: SensorAddress, register: u8) -> Result<u8, Self::Error> {
        self.device(address)?.smbus_read_byte_data(register)
    }

    fn write_byte(
        &mut self,
        address: SensorAddress,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        self.device(address)?.smbus_write_byte_data(register, value)
    }

    fn read_word(&mut self, address: SensorAddress, register: u8) -> Result<u16, Self::Error> {
        self.device(address)?.smbus_read_word_data(register)
    }
}
