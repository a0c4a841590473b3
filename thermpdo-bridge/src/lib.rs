//! Bridge from a DS1621 I2C thermometer to a CAN PDO.
//!
//! A [`sensor::SensorReader`] runs the DS1621 one-shot conversion protocol
//! over a [`bus::RegisterBus`]; a [`publisher::PeriodicPublisher`] keeps one
//! periodic frame alive on a [`bus::FrameBus`] and refreshes its payload from
//! every new reading.
//!
//! # Frame
//!
//! ```text
//! id      <cob_id> (standard 11-bit)
//! data    [hiResC: f32 LE][hiResF: f32 LE]
//! ```

pub mod args;
pub mod bus;
pub mod config;
pub mod error;
pub mod publisher;
pub mod registers;
pub mod sensor;

#[cfg(target_os = "linux")]
pub mod adapters;

pub use bus::{CobId, Frame, FrameBus, Payload, RegisterBus, SensorAddress};
pub use error::{FrameBusError, SensorError};
pub use publisher::{PeriodicPublisher, TickCounters, TickOutcome};
pub use sensor::{AcquisitionOutcome, Reading, SensorReader};
