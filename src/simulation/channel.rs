//! Controller handle returned by [`VirtualDriver`](super::VirtualDriver): the
//! backend side of the simulated network.
use core::future::poll_fn;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::error::VirtualBusError;
use crate::simulation::{SlotKey, VirtualNetwork};
use crate::transport::frame::CanMessage;
use crate::transport::timing::{BitTiming, ClassicPreset};
use crate::transport::traits::{
    bus_timer::{with_timeout, BusTimer},
    can_backend::CanBackend,
    cyclic_task::CyclicTask,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Timing the controller was programmed with.
pub enum ChannelTiming {
    Classic(ClassicPreset),
    Fd {
        arbitration: BitTiming,
        data: BitTiming,
    },
}

//==================================================================================VIRTUAL_CHANNEL
/// One controller attached to a [`VirtualNetwork`] segment. Dropping it
/// detaches the controller, like [`CanBackend::shutdown`].
pub struct VirtualChannel<'a, M: RawMutex, T: BusTimer> {
    pub(crate) network: &'a VirtualNetwork<M>,
    pub(crate) slot: SlotKey,
    pub(crate) timer: T,
    pub(crate) timing: ChannelTiming,
}

impl<'a, M: RawMutex, T: BusTimer> VirtualChannel<'a, M, T> {
    pub fn timing(&self) -> ChannelTiming {
        self.timing
    }

    /// Frames waiting in the TX FIFO for an acknowledgement.
    pub fn pending_tx(&self) -> Result<usize, VirtualBusError> {
        self.network.with_state(|state| state.pending_tx(self.slot))
    }

    /// Frames waiting in the RX FIFO.
    pub fn pending_rx(&self) -> Result<usize, VirtualBusError> {
        self.network.with_state(|state| state.pending_rx(self.slot))
    }

    /// Frames dropped because the RX FIFO was full.
    pub fn rx_overruns(&self) -> Result<u32, VirtualBusError> {
        self.network.with_state(|state| state.overruns(self.slot))
    }
}

impl<'a, M: RawMutex, T: BusTimer> CanBackend for VirtualChannel<'a, M, T> {
    type Error = VirtualBusError;
    type Cyclic = VirtualCyclic<'a, M>;

    fn flush_tx_buffer(&mut self) -> Result<(), VirtualBusError> {
        self.network.with_state(|state| state.flush_tx(self.slot))
    }

    async fn recv(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<CanMessage>, VirtualBusError> {
        let network = self.network;
        let slot = self.slot;
        let dequeue =
            poll_fn(move |cx| network.with_state(|state| state.poll_dequeue(slot, cx.waker())));

        match timeout {
            None => dequeue.await.map(Some),
            Some(timeout) => match with_timeout(&mut self.timer, timeout, dequeue).await {
                Some(result) => result.map(Some),
                None => Ok(None),
            },
        }
    }

    async fn send<'b>(
        &'b mut self,
        message: &'b CanMessage,
        timeout: Option<Duration>,
    ) -> Result<(), VirtualBusError> {
        let network = self.network;
        let slot = self.slot;
        network.with_state(|state| state.check_transmittable(slot, message))?;

        let enqueue = poll_fn(move |cx| {
            network.with_state(|state| state.poll_enqueue(slot, message, cx.waker()))
        });

        match timeout {
            None => enqueue.await,
            Some(timeout) => with_timeout(&mut self.timer, timeout, enqueue)
                .await
                .unwrap_or(Err(VirtualBusError::Timeout)),
        }
    }

    fn send_periodic(
        &mut self,
        message: &CanMessage,
        period: Duration,
        duration: Option<Duration>,
    ) -> Result<VirtualCyclic<'a, M>, VirtualBusError> {
        let id = self
            .network
            .with_state(|state| state.add_cyclic(self.slot, message, period, duration))?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Cyclic task {} registered: frame {:#X} every {} us",
            id,
            message.raw_id(),
            period.as_micros() as u64
        );

        Ok(VirtualCyclic {
            network: self.network,
            id,
        })
    }

    fn shutdown(&mut self) -> Result<(), VirtualBusError> {
        self.network.with_state(|state| state.detach(self.slot));
        Ok(())
    }
}

impl<M: RawMutex, T: BusTimer> Drop for VirtualChannel<'_, M, T> {
    fn drop(&mut self) {
        self.network.with_state(|state| state.detach(self.slot));
    }
}

//==================================================================================VIRTUAL_CYCLIC
/// Entry in the simulated adapter's cyclic scheduler.
pub struct VirtualCyclic<'a, M: RawMutex> {
    network: &'a VirtualNetwork<M>,
    id: u32,
}

impl<M: RawMutex> CyclicTask for VirtualCyclic<'_, M> {
    type Error = VirtualBusError;

    fn stop(&mut self) -> Result<(), VirtualBusError> {
        self.network.with_state(|state| state.remove_cyclic(self.id));
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.network.with_state(|state| state.is_cyclic_active(self.id))
    }
}
