//! Capability contract shared by the classic and CAN-FD backends, and by the
//! facade that forwards to them.
use core::time::Duration;

use futures_util::Future;

use crate::transport::frame::CanMessage;
use crate::transport::traits::cyclic_task::CyclicTask;

/// Operations every bus backend provides.
pub trait CanBackend {
    type Error: core::fmt::Debug;
    /// Handle returned by [`CanBackend::send_periodic`].
    type Cyclic: CyclicTask;

    /// Discard outbound frames that were queued but not yet placed on the wire.
    fn flush_tx_buffer(&mut self) -> Result<(), Self::Error>;

    /// Wait up to `timeout` (forever when `None`) for the next frame.
    /// Returns `Ok(None)` when the timeout elapses.
    fn recv<'a>(
        &'a mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<CanMessage>, Self::Error>> + 'a;

    /// Enqueue a frame for transmission, waiting up to `timeout` (forever when
    /// `None`) for room in the transmit queue.
    fn send<'a>(
        &'a mut self,
        message: &'a CanMessage,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Hand a frame to the cyclic scheduler: one transmission every `period`,
    /// stopping after `duration` when provided.
    fn send_periodic(
        &mut self,
        message: &CanMessage,
        period: Duration,
        duration: Option<Duration>,
    ) -> Result<Self::Cyclic, Self::Error>;

    /// Release the driver resources held by the backend.
    fn shutdown(&mut self) -> Result<(), Self::Error>;
}
