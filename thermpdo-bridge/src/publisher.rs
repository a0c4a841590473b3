//! Periodic PDO publishing.
//!
//! [`PeriodicPublisher`] keeps one periodic frame alive on the frame bus and
//! refreshes its payload from a new acquisition on every tick.
//!
//! # Payload
//!
//! ```text
//! byte 0..4  hiResC  f32 little-endian
//! byte 4..8  hiResF  f32 little-endian
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bus::{CobId, Frame, FrameBus, Payload, RegisterBus, SensorAddress};
use crate::error::{FrameBusError, SensorError};
use crate::sensor::{AcquisitionOutcome, Reading, SensorReader};

/// Pack two temperatures as little-endian `f32` values.
pub fn encode_temperatures(hi_res_c: f32, hi_res_f: f32) -> Payload {
    let mut payload = [0u8; 8];
    payload[..4].copy_from_slice(&hi_res_c.to_le_bytes());
    payload[4..].copy_from_slice(&hi_res_f.to_le_bytes());
    payload
}

/// Payload for a reading.
pub fn encode_reading(reading: &Reading) -> Payload {
    encode_temperatures(reading.hi_res_c as f32, reading.hi_res_f as f32)
}

/// Unpack `(hiResC, hiResF)` from a payload.
pub fn decode_payload(payload: &Payload) -> (f32, f32) {
    let [c0, c1, c2, c3, f0, f1, f2, f3] = *payload;
    (
        f32::from_le_bytes([c0, c1, c2, c3]),
        f32::from_le_bytes([f0, f1, f2, f3]),
    )
}

/// Payload sent before any reading was taken: two quiet NaNs.
pub fn placeholder_payload() -> Payload {
    encode_temperatures(f32::NAN, f32::NAN)
}

/// What happened during one tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// A reading was encoded into the payload.
    Encoded(Reading),
    /// Conversion timed out; payload kept.
    TimedOut,
    /// No hardware; payload kept.
    Simulated(&'static str),
    /// Register transfer failed; payload kept.
    IoError(SensorError),
}

/// Per-outcome tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounters {
    pub ticks: u64,
    pub readings: u64,
    pub timeouts: u64,
    pub simulated: u64,
    pub io_errors: u64,
}

/// The live outgoing frame and its periodic-send handle.
pub struct PeriodicFrame<H> {
    id: CobId,
    payload: Payload,
    handle: H,
}

impl<H> PeriodicFrame<H> {
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// Drives a [`SensorReader`] on a fixed cadence and keeps a periodic frame
/// current.
///
/// # Example
///
/// ```ignore
/// let publisher =
///     PeriodicPublisher::initialize(reader, can, cob_id, interval, address).await?;
/// let counters = publisher.run_until(tokio::signal::ctrl_c()).await?;
/// ```
pub struct PeriodicPublisher<R, F: FrameBus> {
    reader: SensorReader<R>,
    frame_bus: F,
    frame: PeriodicFrame<F::Handle>,
    address: SensorAddress,
    interval: Duration,
    counters: TickCounters,
}

impl<R: RegisterBus, F: FrameBus> PeriodicPublisher<R, F> {
    /// Take a first reading and start the periodic transmission.
    ///
    /// The transmission only starts once the first payload is known, so the
    /// bus never sees a frame from a reading that was not taken.
    pub async fn initialize(
        mut reader: SensorReader<R>,
        mut frame_bus: F,
        cob_id: CobId,
        interval: Duration,
        address: SensorAddress,
    ) -> Result<Self, FrameBusError> {
        let mut counters = TickCounters::default();
        let outcome = acquire_once(&mut reader, address).await;
        counters.record(&outcome);

        let payload = match &outcome {
            TickOutcome::Encoded(reading) => encode_reading(reading),
            _ => placeholder_payload(),
        };
        log_outcome(&outcome, &counters);

        let handle = frame_bus.send_periodic(
            Frame {
                id: cob_id,
                data: payload,
            },
            interval,
        )?;

        info!(
            cob_id = %cob_id,
            interval_secs = interval.as_secs_f64(),
            "Emitting PDO"
        );

        Ok(Self {
            reader,
            frame_bus,
            frame: PeriodicFrame {
                id: cob_id,
                payload,
                handle,
            },
            address,
            interval,
            counters,
        })
    }

    pub fn frame(&self) -> &PeriodicFrame<F::Handle> {
        &self.frame
    }

    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Acquire, re-encode and push the payload to the running transmission.
    ///
    /// Only a successful reading changes the payload; every tick pushes
    /// exactly one update.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = acquire_once(&mut self.reader, self.address).await;
        self.counters.record(&outcome);

        if let TickOutcome::Encoded(reading) = &outcome {
            self.frame.payload = encode_reading(reading);
        }
        log_outcome(&outcome, &self.counters);

        if let Err(e) = self
            .frame_bus
            .update_payload(&self.frame.handle, self.frame.payload)
        {
            error!(cob_id = %self.frame.id, error = %e, "Failed to update PDO payload");
        }

        outcome
    }

    /// Tick every interval until `shutdown` resolves, then stop the
    /// transmission.
    ///
    /// Shutdown is only observed between ticks; a running acquisition is
    /// never cancelled.
    pub async fn run_until<S>(mut self, shutdown: S) -> Result<TickCounters, FrameBusError>
    where
        S: Future,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            self.tick().await;
        }

        info!("User exit request");
        self.stop()
    }

    /// Stop the periodic transmission and release it.
    pub fn stop(self) -> Result<TickCounters, FrameBusError> {
        let Self {
            mut frame_bus,
            frame,
            counters,
            ..
        } = self;

        frame_bus.stop(frame.handle)?;

        info!(
            cob_id = %frame.id,
            ticks = counters.ticks,
            readings = counters.readings,
            timeouts = counters.timeouts,
            io_errors = counters.io_errors,
            "Stopped PDO"
        );

        Ok(counters)
    }
}

async fn acquire_once<R: RegisterBus>(
    reader: &mut SensorReader<R>,
    address: SensorAddress,
) -> TickOutcome {
    match reader.acquire(address).await {
        Ok(AcquisitionOutcome::Reading(reading)) => TickOutcome::Encoded(reading),
        Ok(AcquisitionOutcome::Timeout) => TickOutcome::TimedOut,
        Ok(AcquisitionOutcome::SimulatedStatus(message)) => TickOutcome::Simulated(message),
        Err(e) => TickOutcome::IoError(e),
    }
}

fn log_outcome(outcome: &TickOutcome, counters: &TickCounters) {
    match outcome {
        TickOutcome::Encoded(reading) => {
            debug!(
                lo_res_c = reading.lo_res_c,
                hi_res_c = reading.hi_res_c,
                hi_res_f = reading.hi_res_f,
                date = %reading.date(),
                time = %reading.time(),
                "Temperature reading"
            );
        }
        TickOutcome::TimedOut => {
            warn!("Conversion timed out");
        }
        TickOutcome::Simulated(message) => {
            // Repeats every tick, only worth reporting once.
            if counters.simulated == 1 {
                info!(message = %message, "No sensor data");
            } else {
                debug!(message = %message, "No sensor data");
            }
        }
        TickOutcome::IoError(e) => {
            warn!(error = %e, "Sensor read failed");
        }
    }
}

impl TickCounters {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Encoded(_) => self.readings += 1,
            TickOutcome::TimedOut => self.timeouts += 1,
            TickOutcome::Simulated(_) => self.simulated += 1,
            TickOutcome::IoError(_) => self.io_errors += 1,
        }
    }
}
