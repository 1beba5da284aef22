//! [`CanDriver`] opening controllers on a [`VirtualNetwork`].
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config::{ClassicParams, FdParams};
use crate::error::VirtualBusError;
use crate::simulation::{
    AdapterInfo, ChannelTiming, ControllerSetup, NetworkState, Segment, SlotKey, VirtualChannel,
    VirtualNetwork,
};
use crate::transport::filter::CanFilter;
use crate::transport::timing::{classic_preset, BitTiming, ARBITRATION_PRESETS, DATA_PRESETS};
use crate::transport::traits::{bus_timer::BusTimer, can_driver::CanDriver};
use alloc::vec::Vec;

/// Opens channels of the adapters registered on `network`.
///
/// Every channel gets its own copy of `timer` for send/receive timeouts.
pub struct VirtualDriver<'a, M: RawMutex, T: BusTimer + Clone> {
    network: &'a VirtualNetwork<M>,
    timer: T,
}

impl<'a, M: RawMutex, T: BusTimer + Clone> VirtualDriver<'a, M, T> {
    pub fn new(network: &'a VirtualNetwork<M>, timer: T) -> Self {
        Self { network, timer }
    }

    fn channel(&self, slot: SlotKey, timing: ChannelTiming) -> VirtualChannel<'a, M, T> {
        VirtualChannel {
            network: self.network,
            slot,
            timer: self.timer.clone(),
            timing,
        }
    }
}

/// Settings common to both controller kinds.
struct Common {
    channel: u8,
    hardware_id: Option<u32>,
    rx_fifo_size: u16,
    tx_fifo_size: u16,
}

impl Common {
    /// Locate the adapter and check the channel and FIFO sizes against it.
    fn locate(&self, state: &NetworkState) -> Result<AdapterInfo, VirtualBusError> {
        if self.rx_fifo_size == 0 || self.tx_fifo_size == 0 {
            return Err(VirtualBusError::InvalidFifoSize);
        }
        let adapter = state.find_adapter(self.hardware_id)?;
        if self.channel >= adapter.channel_count {
            return Err(VirtualBusError::InvalidChannel {
                channel: self.channel,
                available: adapter.channel_count,
            });
        }
        Ok(adapter)
    }

    fn setup(
        &self,
        adapter: &AdapterInfo,
        fd: bool,
        extended: bool,
        receive_own_messages: bool,
        filters: Vec<CanFilter>,
    ) -> ControllerSetup {
        ControllerSetup {
            segment: Segment {
                hardware_id: adapter.hardware_id,
                channel: self.channel,
            },
            fd,
            extended,
            receive_own_messages,
            filters,
            rx_fifo_size: self.rx_fifo_size as usize,
            tx_fifo_size: self.tx_fifo_size as usize,
        }
    }
}

impl<'a, M: RawMutex, T: BusTimer + Clone> CanDriver for VirtualDriver<'a, M, T> {
    type Classic = VirtualChannel<'a, M, T>;
    type Fd = VirtualChannel<'a, M, T>;

    fn open_classic(&self, params: ClassicParams) -> Result<Self::Classic, VirtualBusError> {
        let common = Common {
            channel: params.channel,
            hardware_id: params.unique_hardware_id,
            rx_fifo_size: params.rx_fifo_size,
            tx_fifo_size: params.tx_fifo_size,
        };

        let (slot, preset) = self.network.with_state(|state| -> Result<_, VirtualBusError> {
            let adapter = common.locate(state)?;
            let preset = classic_preset(params.bitrate)?;
            let setup = common.setup(
                &adapter,
                false,
                params.extended,
                params.receive_own_messages,
                params.filters,
            );
            Ok((state.attach(setup), preset))
        })?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Classic controller {} attached to channel {} (BTR0={:#X} BTR1={:#X})",
            slot,
            params.channel,
            preset.btr0,
            preset.btr1
        );

        Ok(self.channel(slot, ChannelTiming::Classic(preset)))
    }

    fn open_fd(&self, params: FdParams) -> Result<Self::Fd, VirtualBusError> {
        let common = Common {
            channel: params.channel,
            hardware_id: params.unique_hardware_id,
            rx_fifo_size: params.rx_fifo_size,
            tx_fifo_size: params.tx_fifo_size,
        };

        let (slot, timing) = self.network.with_state(|state| -> Result<_, VirtualBusError> {
            let adapter = common.locate(state)?;
            if !adapter.fd_capable {
                return Err(VirtualBusError::FdNotSupported {
                    hardware_id: adapter.hardware_id,
                });
            }
            let arbitration =
                BitTiming::resolve(&ARBITRATION_PRESETS, params.bitrate, params.arbitration)?;
            let data = BitTiming::resolve(&DATA_PRESETS, params.data_bitrate, params.data)?;
            let setup = common.setup(
                &adapter,
                true,
                params.extended,
                params.receive_own_messages,
                params.filters,
            );
            Ok((state.attach(setup), ChannelTiming::Fd { arbitration, data }))
        })?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "CAN-FD controller {} attached to channel {} ({} / {} bit/s)",
            slot,
            params.channel,
            params.bitrate,
            params.data_bitrate
        );

        Ok(self.channel(slot, timing))
    }
}
