//! In-memory CAN network implementing both backends.
//!
//! A [`VirtualNetwork`] models a set of adapters, each with a number of channels.
//! Every controller opened on the same adapter channel shares one segment:
//!
//! * a frame leaves the transmitter's TX FIFO only when another controller is
//!   attached to the segment to acknowledge it, otherwise it stays queued;
//! * delivery honours each receiver's mode (classic controllers ignore CAN-FD
//!   frames, standard-only controllers ignore extended identifiers), its
//!   acceptance filters, and its RX FIFO capacity (a full FIFO counts an overrun);
//! * the transmitter gets its own frame back when self-reception is enabled.
//!
//! The adapters carry a simulated clock used to stamp received frames and to run
//! the cyclic transmit scheduler. It only moves through [`VirtualNetwork::advance`].
//!
//! The mutex flavour is chosen by the firmware or the test
//! (`CriticalSectionRawMutex`, `NoopRawMutex`, ...).
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::task::{Poll, Waker};
use core::time::Duration;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embassy_sync::waitqueue::WakerRegistration;

use crate::error::VirtualBusError;
use crate::transport::filter::{self, CanFilter};
use crate::transport::frame::CanMessage;

mod channel;
mod driver;

pub use channel::{ChannelTiming, VirtualChannel, VirtualCyclic};
pub use driver::VirtualDriver;

//==================================================================================NETWORK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Adapter registered on the network.
pub struct AdapterInfo {
    /// Unique hardware id used to select the adapter.
    pub hardware_id: u32,
    /// Number of CAN channels on the adapter.
    pub channel_count: u8,
    /// Whether the channels can run in CAN-FD mode.
    pub fd_capable: bool,
}

/// Shared state of the simulated network.
pub struct VirtualNetwork<M: RawMutex> {
    state: Mutex<M, RefCell<NetworkState>>,
}

impl<M: RawMutex> VirtualNetwork<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(NetworkState::new())),
        }
    }

    /// Register an adapter. Adapters are searched in registration order.
    pub fn add_adapter(&self, hardware_id: u32, channel_count: u8, fd_capable: bool) {
        self.with_state(|state| {
            state.adapters.push(AdapterInfo {
                hardware_id,
                channel_count,
                fd_capable,
            })
        });
    }

    pub fn adapters(&self) -> Vec<AdapterInfo> {
        self.with_state(|state| state.adapters.clone())
    }

    /// Current simulated hardware time.
    pub fn now(&self) -> Duration {
        self.with_state(|state| state.now)
    }

    /// Move the hardware clock forward, firing every cyclic transmission that
    /// falls due on the way (in chronological order).
    pub fn advance(&self, elapsed: Duration) {
        self.with_state(|state| state.advance(elapsed));
    }

    /// Number of controllers currently attached to the network.
    pub fn attached_controllers(&self) -> usize {
        self.with_state(|state| {
            state
                .slots
                .iter()
                .filter(|slot| slot.controller.is_some())
                .count()
        })
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut NetworkState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<M: RawMutex> Default for VirtualNetwork<M> {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================CONTROLLER
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Adapter channel shared by every controller opened on it.
pub(crate) struct Segment {
    pub hardware_id: u32,
    pub channel: u8,
}

/// Settings a controller is attached with.
pub(crate) struct ControllerSetup {
    pub segment: Segment,
    pub fd: bool,
    pub extended: bool,
    pub receive_own_messages: bool,
    pub filters: Vec<CanFilter>,
    pub rx_fifo_size: usize,
    pub tx_fifo_size: usize,
}

pub(crate) struct Controller {
    setup: ControllerSetup,
    rx: VecDeque<CanMessage>,
    tx: VecDeque<CanMessage>,
    rx_waker: WakerRegistration,
    tx_waker: WakerRegistration,
    overruns: u32,
}

impl Controller {
    fn new(setup: ControllerSetup) -> Self {
        Self {
            rx: VecDeque::with_capacity(setup.rx_fifo_size),
            tx: VecDeque::with_capacity(setup.tx_fifo_size),
            setup,
            rx_waker: WakerRegistration::new(),
            tx_waker: WakerRegistration::new(),
            overruns: 0,
        }
    }

    /// Frame kinds the controller handles, in both directions.
    fn supports(&self, message: &CanMessage) -> bool {
        (self.setup.fd || !message.is_fd()) && (self.setup.extended || !message.is_extended())
    }

    /// Hardware receive path: mode check, acceptance filters, FIFO capacity.
    fn accept(&mut self, message: &CanMessage) {
        if !self.supports(message) || !filter::matches_any(&self.setup.filters, message) {
            return;
        }
        if self.rx.len() >= self.setup.rx_fifo_size {
            self.overruns = self.overruns.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "RX FIFO overrun on channel {}: dropping frame {:#X}",
                self.setup.segment.channel,
                message.raw_id()
            );
            return;
        }
        self.rx.push_back(*message);
        self.rx_waker.wake();
    }
}

//==================================================================================SLOTS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Handle on a controller slot. A freed slot is handed out again with a new
/// generation, so stale handles keep failing with `ChannelClosed`.
pub(crate) struct SlotKey {
    index: usize,
    generation: u32,
}

struct Slot {
    generation: u32,
    controller: Option<Controller>,
}

//==================================================================================CYCLIC
struct CyclicEntry {
    id: u32,
    controller: SlotKey,
    message: CanMessage,
    period: Duration,
    next_due: Duration,
    end: Option<Duration>,
}

//==================================================================================STATE
pub(crate) struct NetworkState {
    adapters: Vec<AdapterInfo>,
    slots: Vec<Slot>,
    cyclic: Vec<CyclicEntry>,
    next_cyclic_id: u32,
    now: Duration,
}

impl NetworkState {
    const fn new() -> Self {
        Self {
            adapters: Vec::new(),
            slots: Vec::new(),
            cyclic: Vec::new(),
            next_cyclic_id: 0,
            now: Duration::ZERO,
        }
    }

    /// Adapter selection: by unique hardware id, or the first registered one.
    pub(crate) fn find_adapter(
        &self,
        hardware_id: Option<u32>,
    ) -> Result<AdapterInfo, VirtualBusError> {
        match hardware_id {
            Some(hardware_id) => self
                .adapters
                .iter()
                .find(|adapter| adapter.hardware_id == hardware_id)
                .copied()
                .ok_or(VirtualBusError::AdapterNotFound { hardware_id }),
            None => self
                .adapters
                .first()
                .copied()
                .ok_or(VirtualBusError::NoAdapter),
        }
    }

    /// Attach a controller in the first free slot. Frames waiting for an
    /// acknowledgement on the segment can now leave.
    pub(crate) fn attach(&mut self, setup: ControllerSetup) -> SlotKey {
        let segment = setup.segment;
        let controller = Some(Controller::new(setup));
        let key = match self.slots.iter().position(|slot| slot.controller.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.controller = controller;
                SlotKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    controller,
                });
                SlotKey {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.dispatch(segment);
        key
    }

    /// Detach a controller and cancel its cyclic transmissions. No-op when the
    /// controller is already gone.
    pub(crate) fn detach(&mut self, key: SlotKey) {
        let Some(slot) = self.slots.get_mut(key.index) else {
            return;
        };
        if slot.generation == key.generation && slot.controller.take().is_some() {
            self.cyclic.retain(|task| task.controller != key);
            #[cfg(feature = "defmt")]
            defmt::debug!("Controller {} detached", key.index);
        }
    }

    pub(crate) fn controller_mut(&mut self, key: SlotKey) -> Result<&mut Controller, VirtualBusError> {
        self.slots
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.controller.as_mut())
            .ok_or(VirtualBusError::ChannelClosed)
    }

    /// Reject frames the controller cannot carry.
    pub(crate) fn check_transmittable(
        &mut self,
        slot: SlotKey,
        message: &CanMessage,
    ) -> Result<(), VirtualBusError> {
        if self.controller_mut(slot)?.supports(message) {
            Ok(())
        } else {
            Err(VirtualBusError::UnsupportedFrame)
        }
    }

    /// Queue a frame when the TX FIFO has room, otherwise register `waker`.
    pub(crate) fn poll_enqueue(
        &mut self,
        slot: SlotKey,
        message: &CanMessage,
        waker: &Waker,
    ) -> Poll<Result<(), VirtualBusError>> {
        let controller = match self.controller_mut(slot) {
            Ok(controller) => controller,
            Err(err) => return Poll::Ready(Err(err)),
        };
        if controller.tx.len() >= controller.setup.tx_fifo_size {
            controller.tx_waker.register(waker);
            return Poll::Pending;
        }
        controller.tx.push_back(*message);
        let segment = controller.setup.segment;
        self.dispatch(segment);
        Poll::Ready(Ok(()))
    }

    /// Pop the oldest received frame, otherwise register `waker`.
    pub(crate) fn poll_dequeue(
        &mut self,
        slot: SlotKey,
        waker: &Waker,
    ) -> Poll<Result<CanMessage, VirtualBusError>> {
        let controller = match self.controller_mut(slot) {
            Ok(controller) => controller,
            Err(err) => return Poll::Ready(Err(err)),
        };
        match controller.rx.pop_front() {
            Some(message) => Poll::Ready(Ok(message)),
            None => {
                controller.rx_waker.register(waker);
                Poll::Pending
            }
        }
    }

    pub(crate) fn flush_tx(&mut self, slot: SlotKey) -> Result<(), VirtualBusError> {
        let controller = self.controller_mut(slot)?;
        controller.tx.clear();
        controller.tx_waker.wake();
        Ok(())
    }

    pub(crate) fn pending_tx(&mut self, slot: SlotKey) -> Result<usize, VirtualBusError> {
        Ok(self.controller_mut(slot)?.tx.len())
    }

    pub(crate) fn pending_rx(&mut self, slot: SlotKey) -> Result<usize, VirtualBusError> {
        Ok(self.controller_mut(slot)?.rx.len())
    }

    pub(crate) fn overruns(&mut self, slot: SlotKey) -> Result<u32, VirtualBusError> {
        Ok(self.controller_mut(slot)?.overruns)
    }

    /// Move every queued frame of `segment` onto the wire, provided at least two
    /// controllers are attached (one to transmit, one to acknowledge).
    fn dispatch(&mut self, segment: Segment) {
        let members: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match &slot.controller {
                Some(controller) if controller.setup.segment == segment => Some(index),
                _ => None,
            })
            .collect();
        if members.len() < 2 {
            return;
        }

        let now = self.now;
        for &sender in &members {
            loop {
                let (message, echo) = match self.slots[sender].controller.as_mut() {
                    Some(controller) => match controller.tx.pop_front() {
                        Some(message) => (message, controller.setup.receive_own_messages),
                        None => {
                            controller.tx_waker.wake();
                            break;
                        }
                    },
                    None => break,
                };
                let stamped = message.with_timestamp(now);
                for &receiver in &members {
                    if receiver == sender && !echo {
                        continue;
                    }
                    if let Some(controller) = self.slots[receiver].controller.as_mut() {
                        controller.accept(&stamped);
                    }
                }
            }
        }
    }

    /// Register a cyclic transmission. The first frame is queued right away.
    pub(crate) fn add_cyclic(
        &mut self,
        slot: SlotKey,
        message: &CanMessage,
        period: Duration,
        duration: Option<Duration>,
    ) -> Result<u32, VirtualBusError> {
        if period.is_zero() {
            return Err(VirtualBusError::InvalidPeriod);
        }
        self.check_transmittable(slot, message)?;

        let id = self.next_cyclic_id;
        self.next_cyclic_id = self.next_cyclic_id.wrapping_add(1);
        self.cyclic.push(CyclicEntry {
            id,
            controller: slot,
            message: *message,
            period,
            next_due: self.now,
            // An end beyond the clock range never comes.
            end: duration.and_then(|duration| self.now.checked_add(duration)),
        });
        self.advance(Duration::ZERO);
        Ok(id)
    }

    pub(crate) fn remove_cyclic(&mut self, id: u32) {
        self.cyclic.retain(|task| task.id != id);
    }

    pub(crate) fn is_cyclic_active(&self, id: u32) -> bool {
        self.cyclic.iter().any(|task| task.id == id)
    }

    fn advance(&mut self, elapsed: Duration) {
        let target = self.now.saturating_add(elapsed);

        loop {
            let next = self
                .cyclic
                .iter()
                .enumerate()
                .filter(|(_, task)| task.next_due <= target)
                .min_by_key(|(_, task)| task.next_due)
                .map(|(index, _)| index);
            let Some(index) = next else {
                break;
            };

            let task = &mut self.cyclic[index];
            let due = task.next_due;
            if task.end.is_some_and(|end| due >= end) {
                self.cyclic.remove(index);
                continue;
            }
            let (slot, message) = (task.controller, task.message);
            match due.checked_add(task.period) {
                Some(next_due) => task.next_due = next_due,
                // No further occurrence fits on the clock.
                None => {
                    self.cyclic.remove(index);
                }
            }

            self.now = self.now.max(due);
            self.emit_cyclic(slot, &message);
        }

        self.now = target;
        self.cyclic
            .retain(|task| task.end.map_or(true, |end| end > target));
    }

    // The hardware scheduler never blocks: a full TX FIFO drops the occurrence.
    fn emit_cyclic(&mut self, slot: SlotKey, message: &CanMessage) {
        let Ok(controller) = self.controller_mut(slot) else {
            return;
        };
        if controller.tx.len() >= controller.setup.tx_fifo_size {
            #[cfg(feature = "defmt")]
            defmt::warn!("Cyclic frame {:#X} dropped: TX FIFO full", message.raw_id());
            return;
        }
        controller.tx.push_back(*message);
        let segment = controller.setup.segment;
        self.dispatch(segment);
    }
}
