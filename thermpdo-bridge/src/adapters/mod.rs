//! Linux implementations of the bus traits.
//!
//! - **i2c**: SMBus register transfers through `/dev/i2c-N` (`i2cdev`)
//! - **can**: periodic frames on a SocketCAN interface (`socketcan`)

mod can;
mod i2c;

pub use can::{PeriodicTask, SocketCanBus};
pub use i2c::LinuxI2cBus;
