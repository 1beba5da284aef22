//! Configuration bundle accepted by [`IxxatBus::open`](crate::IxxatBus::open)
//! and its resolution into the parameters of exactly one backend.
//!
//! Resolution is pure defaulting: no timing validation happens here, that is the
//! backend's job.
use alloc::vec::Vec;

use crate::transport::filter::CanFilter;
use crate::transport::timing::TimingOverrides;

/// Nominal bitrate used when none is configured (bit/s).
pub const DEFAULT_BITRATE: u32 = 500_000;
/// Data-phase bitrate used when none is configured (bit/s).
pub const DEFAULT_DATA_BITRATE: u32 = 2_000_000;
/// Receive and transmit FIFO size of a classic channel.
pub const CLASSIC_FIFO_SIZE: u16 = 16;
/// Receive FIFO size of a CAN-FD channel.
pub const FD_RX_FIFO_SIZE: u16 = 1024;
/// Transmit FIFO size of a CAN-FD channel.
pub const FD_TX_FIFO_SIZE: u16 = 128;

//==================================================================================BUS_CONFIG
#[derive(Clone, Debug, PartialEq, Eq)]
/// Everything a bus needs besides the channel number.
pub struct BusConfig {
    /// Acceptance filters; empty accepts everything.
    pub filters: Vec<CanFilter>,
    /// Deliver our own transmitted frames back to us.
    pub receive_own_messages: bool,
    /// Adapter to bind to; `None` takes the first one found.
    pub unique_hardware_id: Option<u32>,
    /// Allow 29-bit identifiers.
    pub extended: bool,
    /// Select the CAN-FD backend.
    pub fd: bool,
    /// Receive FIFO size in frames; `None` gives 1024 (CAN-FD) or 16 (classic).
    pub rx_fifo_size: Option<u16>,
    /// Transmit FIFO size in frames; `None` gives 128 (CAN-FD) or 16 (classic).
    pub tx_fifo_size: Option<u16>,
    /// Nominal (arbitration phase) bitrate.
    pub bitrate: u32,
    /// Data phase bitrate, CAN-FD only.
    pub data_bitrate: u32,
    /// Arbitration phase `sjw`/`tseg1`/`tseg2`, CAN-FD only.
    pub arbitration: TimingOverrides,
    /// Data phase `sjw`/`tseg1`/`tseg2`/`ssp`, CAN-FD only.
    pub data: TimingOverrides,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            receive_own_messages: false,
            unique_hardware_id: None,
            extended: true,
            fd: false,
            rx_fifo_size: None,
            tx_fifo_size: None,
            bitrate: DEFAULT_BITRATE,
            data_bitrate: DEFAULT_DATA_BITRATE,
            arbitration: TimingOverrides::default(),
            data: TimingOverrides::default(),
        }
    }
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the acceptance filter list.
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = CanFilter>) -> Self {
        self.filters = filters.into_iter().collect();
        self
    }

    /// Appends one acceptance filter.
    pub fn with_filter(mut self, filter: CanFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn receive_own_messages(mut self, enabled: bool) -> Self {
        self.receive_own_messages = enabled;
        self
    }

    pub fn unique_hardware_id(mut self, hardware_id: u32) -> Self {
        self.unique_hardware_id = Some(hardware_id);
        self
    }

    pub fn extended(mut self, enabled: bool) -> Self {
        self.extended = enabled;
        self
    }

    pub fn fd(mut self, enabled: bool) -> Self {
        self.fd = enabled;
        self
    }

    pub fn rx_fifo_size(mut self, size: u16) -> Self {
        self.rx_fifo_size = Some(size);
        self
    }

    pub fn tx_fifo_size(mut self, size: u16) -> Self {
        self.tx_fifo_size = Some(size);
        self
    }

    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn data_bitrate(mut self, bitrate: u32) -> Self {
        self.data_bitrate = bitrate;
        self
    }

    pub fn sjw_abr(mut self, value: u16) -> Self {
        self.arbitration.sjw = Some(value);
        self
    }

    pub fn tseg1_abr(mut self, value: u16) -> Self {
        self.arbitration.tseg1 = Some(value);
        self
    }

    pub fn tseg2_abr(mut self, value: u16) -> Self {
        self.arbitration.tseg2 = Some(value);
        self
    }

    pub fn sjw_dbr(mut self, value: u16) -> Self {
        self.data.sjw = Some(value);
        self
    }

    pub fn tseg1_dbr(mut self, value: u16) -> Self {
        self.data.tseg1 = Some(value);
        self
    }

    pub fn tseg2_dbr(mut self, value: u16) -> Self {
        self.data.tseg2 = Some(value);
        self
    }

    pub fn ssp_dbr(mut self, value: u16) -> Self {
        self.data.ssp = Some(value);
        self
    }

    /// Applies the FIFO defaults and splits the bundle for the selected backend.
    ///
    /// - `fd = true`: FIFO defaults 1024 (rx) / 128 (tx), every timing value kept.
    /// - `fd = false`: FIFO defaults 16 / 16, only the classic subset kept.
    ///
    /// Explicit FIFO sizes always win.
    pub fn resolve(self, channel: u8) -> BackendParams {
        if self.fd {
            BackendParams::Fd(FdParams {
                channel,
                filters: self.filters,
                receive_own_messages: self.receive_own_messages,
                unique_hardware_id: self.unique_hardware_id,
                extended: self.extended,
                rx_fifo_size: self.rx_fifo_size.unwrap_or(FD_RX_FIFO_SIZE),
                tx_fifo_size: self.tx_fifo_size.unwrap_or(FD_TX_FIFO_SIZE),
                bitrate: self.bitrate,
                data_bitrate: self.data_bitrate,
                arbitration: self.arbitration,
                data: self.data,
            })
        } else {
            BackendParams::Classic(ClassicParams {
                channel,
                filters: self.filters,
                receive_own_messages: self.receive_own_messages,
                unique_hardware_id: self.unique_hardware_id,
                extended: self.extended,
                rx_fifo_size: self.rx_fifo_size.unwrap_or(CLASSIC_FIFO_SIZE),
                tx_fifo_size: self.tx_fifo_size.unwrap_or(CLASSIC_FIFO_SIZE),
                bitrate: self.bitrate,
            })
        }
    }
}

//==================================================================================PARAMS
#[derive(Clone, Debug, PartialEq, Eq)]
/// Parameters handed to a classic backend.
pub struct ClassicParams {
    pub channel: u8,
    pub filters: Vec<CanFilter>,
    pub receive_own_messages: bool,
    pub unique_hardware_id: Option<u32>,
    pub extended: bool,
    pub rx_fifo_size: u16,
    pub tx_fifo_size: u16,
    pub bitrate: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Parameters handed to a CAN-FD backend.
pub struct FdParams {
    pub channel: u8,
    pub filters: Vec<CanFilter>,
    pub receive_own_messages: bool,
    pub unique_hardware_id: Option<u32>,
    pub extended: bool,
    pub rx_fifo_size: u16,
    pub tx_fifo_size: u16,
    pub bitrate: u32,
    pub data_bitrate: u32,
    pub arbitration: TimingOverrides,
    pub data: TimingOverrides,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of [`BusConfig::resolve`]: parameters for exactly one backend.
pub enum BackendParams {
    Classic(ClassicParams),
    Fd(FdParams),
}
//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
