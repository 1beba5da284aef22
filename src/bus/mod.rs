//! Bus facade binding, at construction time, to either a classic CAN backend or a
//! CAN-FD backend and forwarding every operation to it.
//!
//! The facade adds no behavior of its own: no validation, no retry, no buffering.
//! Each call reaches the active backend exactly once with its arguments unchanged,
//! and any backend error comes back unmodified inside [`BusError`].
//!
//! ```rust,ignore
//! use korri_ixxat::{BusConfig, IxxatBus};
//! use korri_ixxat::transport::traits::can_backend::CanBackend;
//!
//! let config = BusConfig::new().fd(true).data_bitrate(4_000_000);
//! let mut bus = IxxatBus::open(&driver, 0, config)?;
//! bus.send(&message, Some(Duration::from_millis(100))).await?;
//! let reply = bus.recv(Some(Duration::from_millis(500))).await?;
//! bus.shutdown()?;
//! ```
use core::time::Duration;

use crate::config::{BackendParams, BusConfig};
use crate::error::BusError;
use crate::transport::frame::CanMessage;
use crate::transport::traits::{
    can_backend::CanBackend, can_driver::CanDriver, cyclic_task::CyclicTask,
};

//==================================================================================IXXAT_BUS
/// A bus bound to one of two backends for its whole lifetime.
pub enum IxxatBus<C, F> {
    /// Classic CAN controller.
    Classic(C),
    /// CAN-FD controller.
    Fd(F),
}

impl<C: CanBackend, F: CanBackend> IxxatBus<C, F> {
    /// Resolve `config` for `channel` and construct the selected backend.
    ///
    /// Only one of the driver's constructors is invoked: `open_fd` when
    /// `config.fd` is set, `open_classic` otherwise.
    pub fn open<D>(
        driver: &D,
        channel: u8,
        config: BusConfig,
    ) -> Result<Self, BusError<C::Error, F::Error>>
    where
        D: CanDriver<Classic = C, Fd = F>,
    {
        match config.resolve(channel) {
            BackendParams::Fd(params) => {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "Opening CAN-FD channel {} ({} / {} bit/s, fifo rx={} tx={})",
                    params.channel,
                    params.bitrate,
                    params.data_bitrate,
                    params.rx_fifo_size,
                    params.tx_fifo_size
                );
                driver.open_fd(params).map(Self::Fd).map_err(BusError::Fd)
            }
            BackendParams::Classic(params) => {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "Opening classic channel {} ({} bit/s, fifo rx={} tx={})",
                    params.channel,
                    params.bitrate,
                    params.rx_fifo_size,
                    params.tx_fifo_size
                );
                driver
                    .open_classic(params)
                    .map(Self::Classic)
                    .map_err(BusError::Classic)
            }
        }
    }

    /// `true` when bound to the CAN-FD backend.
    pub fn is_fd(&self) -> bool {
        matches!(self, Self::Fd(_))
    }

    /// The classic backend, when bound to it.
    pub fn classic(&self) -> Option<&C> {
        match self {
            Self::Classic(backend) => Some(backend),
            Self::Fd(_) => None,
        }
    }

    /// The CAN-FD backend, when bound to it.
    pub fn fd(&self) -> Option<&F> {
        match self {
            Self::Fd(backend) => Some(backend),
            Self::Classic(_) => None,
        }
    }
}

impl<C: CanBackend, F: CanBackend> CanBackend for IxxatBus<C, F> {
    type Error = BusError<C::Error, F::Error>;
    type Cyclic = CyclicHandle<C::Cyclic, F::Cyclic>;

    fn flush_tx_buffer(&mut self) -> Result<(), Self::Error> {
        match self {
            Self::Classic(backend) => backend.flush_tx_buffer().map_err(BusError::Classic),
            Self::Fd(backend) => backend.flush_tx_buffer().map_err(BusError::Fd),
        }
    }

    async fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<CanMessage>, Self::Error> {
        match self {
            Self::Classic(backend) => backend.recv(timeout).await.map_err(BusError::Classic),
            Self::Fd(backend) => backend.recv(timeout).await.map_err(BusError::Fd),
        }
    }

    async fn send<'a>(
        &'a mut self,
        message: &'a CanMessage,
        timeout: Option<Duration>,
    ) -> Result<(), Self::Error> {
        match self {
            Self::Classic(backend) => backend
                .send(message, timeout)
                .await
                .map_err(BusError::Classic),
            Self::Fd(backend) => backend.send(message, timeout).await.map_err(BusError::Fd),
        }
    }

    fn send_periodic(
        &mut self,
        message: &CanMessage,
        period: Duration,
        duration: Option<Duration>,
    ) -> Result<Self::Cyclic, Self::Error> {
        match self {
            Self::Classic(backend) => backend
                .send_periodic(message, period, duration)
                .map(CyclicHandle::Classic)
                .map_err(BusError::Classic),
            Self::Fd(backend) => backend
                .send_periodic(message, period, duration)
                .map(CyclicHandle::Fd)
                .map_err(BusError::Fd),
        }
    }

    fn shutdown(&mut self) -> Result<(), Self::Error> {
        #[cfg(feature = "defmt")]
        defmt::info!("Shutting down {} backend", if self.is_fd() { "CAN-FD" } else { "classic" });

        match self {
            Self::Classic(backend) => backend.shutdown().map_err(BusError::Classic),
            Self::Fd(backend) => backend.shutdown().map_err(BusError::Fd),
        }
    }
}

//==================================================================================CYCLIC_HANDLE
/// Cyclic task returned by the facade, wrapping the active backend's handle.
pub enum CyclicHandle<A, B> {
    /// Task scheduled by the classic backend.
    Classic(A),
    /// Task scheduled by the CAN-FD backend.
    Fd(B),
}

impl<A: CyclicTask, B: CyclicTask> CyclicTask for CyclicHandle<A, B> {
    type Error = BusError<A::Error, B::Error>;

    fn stop(&mut self) -> Result<(), Self::Error> {
        match self {
            Self::Classic(task) => task.stop().map_err(BusError::Classic),
            Self::Fd(task) => task.stop().map_err(BusError::Fd),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Self::Classic(task) => task.is_active(),
            Self::Fd(task) => task.is_active(),
        }
    }
}
