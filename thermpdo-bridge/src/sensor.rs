//! DS1621 one-shot acquisition and temperature decoding.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::bus::{RegisterBus, SensorAddress};
use crate::error::SensorError;
use crate::registers::{
    ACCESS_CONFIG, CONFIG_DONE, CONFIG_ONE_SHOT, READ_COUNTER, READ_SLOPE, READ_TEMPERATURE,
    START_CONVERT,
};

/// Delay between two reads of the DONE flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum number of DONE flag reads per conversion (about 1.5 s).
pub const MAX_POLLS: u32 = 15;

/// Settling time after rewriting the configuration register.
pub const CONFIG_SETTLE: Duration = Duration::from_millis(10);

/// Status reported instead of a reading when no register bus is available.
pub const SIMULATION_STATUS: &str = "Simulation mode enabled.";

/// A decoded temperature sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Standard (1/2 degree) resolution, Celsius.
    pub lo_res_c: f64,
    /// Interpolated high resolution, Celsius.
    pub hi_res_c: f64,
    /// Interpolated high resolution, Fahrenheit.
    pub hi_res_f: f64,
    /// Local time the sample was taken.
    pub captured_at: DateTime<Local>,
}

impl Reading {
    /// Decode the raw temperature word and the interpolation registers.
    pub fn from_registers(
        word: u16,
        count: u8,
        slope: u8,
        captured_at: DateTime<Local>,
    ) -> Result<Self, SensorError> {
        let hi_res_c = decode_high_resolution(word, count, slope)?;
        Ok(Self {
            lo_res_c: decode_standard(word),
            hi_res_c,
            hi_res_f: celsius_to_fahrenheit(hi_res_c),
            captured_at,
        })
    }

    /// Capture date as `MM/DD/YYYY`.
    pub fn date(&self) -> String {
        self.captured_at.format("%m/%d/%Y").to_string()
    }

    /// Capture time of day as `HH:MM:SS`.
    pub fn time(&self) -> String {
        self.captured_at.format("%H:%M:%S").to_string()
    }
}

/// Result of one acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    /// Conversion completed and was decoded.
    Reading(Reading),
    /// The DONE flag never set within the polling budget.
    Timeout,
    /// No register bus; carries a fixed status message.
    SimulatedStatus(&'static str),
}

/// Decode the 9-bit, 1/2 degree temperature.
///
/// The SMBus word carries the MSB (integer degrees, two's complement) in its
/// low byte and the half-degree flag in bit 15.
pub fn decode_standard(word: u16) -> f64 {
    let mut half_degrees = i32::from((word << 1) & 0x1FE) | i32::from((word >> 15) & 0x01);
    if half_degrees > 255 {
        half_degrees -= 512;
    }
    f64::from(half_degrees) / 2.0
}

/// Interpolate the high resolution temperature from count remain and slope.
///
/// `T = whole - 0.25 + (slope - count) / slope`, where `whole` is the signed
/// integer-degree byte of the temperature word.
pub fn decode_high_resolution(word: u16, count: u8, slope: u8) -> Result<f64, SensorError> {
    if slope == 0 {
        return Err(SensorError::InvalidSlope);
    }

    let mut whole = i32::from(word & 0xFF);
    if whole > 127 {
        whole -= 256;
    }

    let slope = f64::from(slope);
    Ok(f64::from(whole) - 0.25 + (slope - f64::from(count)) / slope)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    32.0 + celsius * 9.0 / 5.0
}

/// Runs the DS1621 conversion protocol against a register bus.
///
/// A reader built with [`SensorReader::simulated`] has no bus and answers
/// every acquisition with [`AcquisitionOutcome::SimulatedStatus`].
pub struct SensorReader<B> {
    bus: Option<B>,
}

impl<B: RegisterBus> SensorReader<B> {
    /// Create a reader for a live bus.
    pub fn new(bus: B) -> Self {
        Self { bus: Some(bus) }
    }

    /// Create a reader for the degraded mode without hardware.
    pub fn simulated() -> Self {
        Self { bus: None }
    }

    pub fn is_simulated(&self) -> bool {
        self.bus.is_none()
    }

    /// Put the device in one-shot mode if it is not already.
    pub async fn enable_one_shot(&mut self, address: SensorAddress) -> Result<(), SensorError> {
        let Some(bus) = self.bus.as_mut() else {
            return Ok(());
        };

        let config = bus
            .read_byte(address, ACCESS_CONFIG)
            .map_err(|e| SensorError::transport(ACCESS_CONFIG, e))?;

        if config & CONFIG_ONE_SHOT == 0 {
            let config = config | CONFIG_ONE_SHOT;
            info!(%address, "Writing config register: 0x{:02x}", config);
            bus.write_byte(address, ACCESS_CONFIG, config)
                .map_err(|e| SensorError::transport(ACCESS_CONFIG, e))?;
            tokio::time::sleep(CONFIG_SETTLE).await;
        }

        Ok(())
    }

    /// Perform one full acquisition cycle.
    ///
    /// Blocks the caller for up to [`MAX_POLLS`] x [`POLL_INTERVAL`] while the
    /// conversion runs.
    pub async fn acquire(
        &mut self,
        address: SensorAddress,
    ) -> Result<AcquisitionOutcome, SensorError> {
        let Some(bus) = self.bus.as_mut() else {
            return Ok(AcquisitionOutcome::SimulatedStatus(SIMULATION_STATUS));
        };

        bus.write_byte(address, START_CONVERT, 0)
            .map_err(|e| SensorError::transport(START_CONVERT, e))?;

        if !wait_for_conversion(bus, address).await? {
            return Ok(AcquisitionOutcome::Timeout);
        }

        let word = bus
            .read_word(address, READ_TEMPERATURE)
            .map_err(|e| SensorError::transport(READ_TEMPERATURE, e))?;
        let count = bus
            .read_byte(address, READ_COUNTER)
            .map_err(|e| SensorError::transport(READ_COUNTER, e))?;
        let slope = bus
            .read_byte(address, READ_SLOPE)
            .map_err(|e| SensorError::transport(READ_SLOPE, e))?;

        debug!(
            %address,
            count,
            slope,
            "Raw conversion registers: word 0x{:04x}",
            word
        );

        Reading::from_registers(word, count, slope, Local::now()).map(AcquisitionOutcome::Reading)
    }
}

/// Poll the DONE flag. Returns `false` when the budget runs out.
async fn wait_for_conversion<B: RegisterBus>(
    bus: &mut B,
    address: SensorAddress,
) -> Result<bool, SensorError> {
    for _ in 0..MAX_POLLS {
        tokio::time::sleep(POLL_INTERVAL).await;

        let status = bus
            .read_byte(address, ACCESS_CONFIG)
            .map_err(|e| SensorError::transport(ACCESS_CONFIG, e))?;
        if status & CONFIG_DONE != 0 {
            return Ok(true);
        }
    }

    Ok(false)
}
