//! Periodic CAN transmission on a SocketCAN interface.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use socketcan::{CanFrame, CanSocket, EmbeddedFrame, Socket, StandardId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::{Frame, FrameBus, Payload};
use crate::error::FrameBusError;

/// Frame bus on a raw SocketCAN socket (`can0`, `slcan0`, ...).
pub struct SocketCanBus {
    interface: String,
    socket: Arc<CanSocket>,
}

/// A running periodic transmission.
///
/// The sender task re-reads the payload from the watch channel before every
/// frame, so updates take effect on the next period without restarting it.
pub struct PeriodicTask {
    payload: watch::Sender<Payload>,
    task: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn a sender that hands a frame to `write` every `interval`, the
    /// first one immediately.
    pub fn spawn<W>(
        interface: String,
        id: StandardId,
        data: Payload,
        interval: Duration,
        write: W,
    ) -> Self
    where
        W: FnMut(&CanFrame) -> io::Result<()> + Send + 'static,
    {
        let (payload, updates) = watch::channel(data);
        let task = tokio::spawn(transmit(interface, id, interval, updates, write));

        Self { payload, task }
    }

    /// Replace the payload sent from the next period on.
    pub fn update(&self, data: Payload) -> Result<(), FrameBusError> {
        if self.task.is_finished() {
            return Err(FrameBusError::Closed);
        }
        self.payload.send(data).map_err(|_| FrameBusError::Closed)
    }

    /// Abort the sender task.
    pub fn abort(self) {
        self.task.abort();
    }
}

async fn transmit<W>(
    interface: String,
    id: StandardId,
    interval: Duration,
    mut updates: watch::Receiver<Payload>,
    mut write: W,
) where
    W: FnMut(&CanFrame) -> io::Result<()>,
{
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let data = *updates.borrow_and_update();
        let Some(frame) = CanFrame::new(id, &data) else {
            warn!(interface = %interface, "Could not build CAN frame");
            continue;
        };

        match write(&frame) {
            Ok(()) => debug!(interface = %interface, id = id.as_raw(), "Sent PDO"),
            Err(e) => warn!(interface = %interface, error = %e, "Failed to send PDO"),
        }
    }
}

impl SocketCanBus {
    /// Open a raw CAN socket bound to `interface`.
    ///
    /// The socket is non-blocking: a full transmit queue drops that period's
    /// frame instead of stalling the runtime.
    pub fn open(interface: &str) -> Result<Self, FrameBusError> {
        let socket = CanSocket::open(interface)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            interface: interface.to_string(),
            socket: Arc::new(socket),
        })
    }
}

impl FrameBus for SocketCanBus {
    type Handle = PeriodicTask;

    fn send_periodic(
        &mut self,
        frame: Frame,
        interval: Duration,
    ) -> Result<PeriodicTask, FrameBusError> {
        let raw_id = frame.id.raw();
        let id = StandardId::new(raw_id).ok_or(FrameBusError::InvalidId(raw_id))?;
        let socket = Arc::clone(&self.socket);

        Ok(PeriodicTask::spawn(
            self.interface.clone(),
            id,
            frame.data,
            interval,
            move |can_frame| socket.write_frame(can_frame),
        ))
    }

    fn update_payload(
        &mut self,
        handle: &PeriodicTask,
        data: Payload,
    ) -> Result<(), FrameBusError> {
        handle.update(data)
    }

    fn stop(&mut self, handle: PeriodicTask) -> Result<(), FrameBusError> {
        handle.abort();
        Ok(())
    }
}
