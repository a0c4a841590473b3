//! Error types for the sensor and frame bus layers.

use thiserror::Error;

/// Errors that abort a single acquisition cycle.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A register transfer failed on the bus.
    #[error("Transfer of register 0x{register:02x} failed: {source}")]
    Transport {
        register: u8,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The slope register read back zero, so the interpolation is undefined.
    #[error("Slope register reads zero, high resolution temperature is undefined")]
    InvalidSlope,
}

impl SensorError {
    /// Wrap a bus error for the given register.
    pub fn transport<E>(register: u8, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            register,
            source: Box::new(source),
        }
    }
}

/// Errors raised by a frame bus transmitter.
#[derive(Debug, Error)]
pub enum FrameBusError {
    /// Identifier does not fit a standard (11-bit) frame.
    #[error("Invalid standard frame identifier 0x{0:x}")]
    InvalidId(u16),

    /// The periodic send is no longer running.
    #[error("Periodic transmission is not running")]
    Closed,

    /// I/O error from the underlying interface.
    #[error("Frame bus I/O error: {0}")]
    Io(#[from] std::io::Error),
}
