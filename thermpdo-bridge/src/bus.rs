//! Bus abstractions the bridge is built on.
//!
//! - [`RegisterBus`] - byte/word register transfers to a device (SMBus style)
//! - [`FrameBus`] - periodic transmission of a single 8-byte frame (CAN style)
//!
//! The Linux implementations live in [`crate::adapters`]; tests plug in
//! in-memory doubles.

use std::fmt;
use std::time::Duration;

use crate::error::FrameBusError;

/// 7-bit register-bus address of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorAddress(pub u8);

impl SensorAddress {
    /// Factory default DS1621 address (A2..A0 tied low).
    pub const DEFAULT: SensorAddress = SensorAddress(0x48);

    pub fn raw(self) -> u8 {
        self.0
    }
}

impl Default for SensorAddress {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Register-level transactor for a low-speed device bus.
///
/// Word reads follow SMBus ordering: the first byte on the wire is the low
/// byte of the returned value.
pub trait RegisterBus {
    /// Transport error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read one byte from `register`.
    fn read_byte(&mut self, address: SensorAddress, register: u8) -> Result<u8, Self::Error>;

    /// Write one byte to `register`.
    fn write_byte(
        &mut self,
        address: SensorAddress,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error>;

    /// Read a 16-bit word from `register`.
    fn read_word(&mut self, address: SensorAddress, register: u8) -> Result<u16, Self::Error>;
}

/// Length of a frame payload.
pub const PAYLOAD_LEN: usize = 8;

/// Frame payload bytes.
pub type Payload = [u8; PAYLOAD_LEN];

/// Standard (11-bit) frame identifier, the COB-ID of the emitted PDO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CobId(u16);

impl CobId {
    /// Largest standard identifier.
    pub const MAX: u16 = 0x7FF;

    /// Default transmit identifier.
    pub const DEFAULT: CobId = CobId(0x1AB);

    pub fn new(raw: u16) -> Result<Self, FrameBusError> {
        if raw > Self::MAX {
            return Err(FrameBusError::InvalidId(raw));
        }
        Ok(Self(raw))
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for CobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03x}", self.0)
    }
}

/// A frame handed to the frame bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub id: CobId,
    pub data: Payload,
}

/// Frame bus transmitter supporting one in-place-updatable periodic send.
pub trait FrameBus {
    /// Opaque handle to a running periodic transmission.
    type Handle;

    /// Start transmitting `frame` every `interval`.
    fn send_periodic(&mut self, frame: Frame, interval: Duration)
    -> Result<Self::Handle, FrameBusError>;

    /// Replace the payload of a running transmission without restarting it.
    fn update_payload(&mut self, handle: &Self::Handle, data: Payload) -> Result<(), FrameBusError>;

    /// Stop the transmission and release its resources.
    fn stop(&mut self, handle: Self::Handle) -> Result<(), FrameBusError>;
}
