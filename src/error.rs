//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction, timing
//! resolution, backend dispatch, simulated hardware).
use thiserror_no_std::Error;

//==================================================================================FRAME_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while building a [`CanMessage`](crate::CanMessage).
pub enum FrameError {
    /// Payload exceeds the 8 bytes of classic CAN or the 64 bytes of CAN-FD.
    #[error("Payload too long: {len} bytes, max {max}")]
    TooMuchData { len: usize, max: usize },
    /// Data Length Code outside the 0..=15 range.
    #[error("Invalid DLC: {dlc}")]
    InvalidDlc { dlc: u8 },
    /// Remote frames do not exist in CAN-FD.
    #[error("CAN-FD frames cannot be remote frames")]
    RemoteFdFrame,
    /// BRS/ESI flags require a CAN-FD frame.
    #[error("Bitrate switch and ESI flags require a CAN-FD frame")]
    FdFlagsOnClassicFrame,
    /// Raw identifier does not fit in 11 or 29 bits.
    #[error("Identifier out of range: {id:#X}")]
    IdOutOfRange { id: u32 },
}

//==================================================================================TIMING_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while resolving bus timing parameters.
pub enum TimingError {
    /// Classic controllers only accept the register presets.
    #[error("Unsupported classic bitrate: {bitrate}")]
    UnsupportedBitrate { bitrate: u32 },
    /// Bitrate has no preset and the named segment was not provided.
    #[error("Missing {field} for bitrate {bitrate} (no preset available)")]
    MissingValue { field: &'static str, bitrate: u32 },
    /// A segment or jump width of zero cannot be programmed.
    #[error("Timing value {field} must not be zero")]
    ZeroValue { field: &'static str },
}

//==================================================================================BUS_ERROR
#[derive(Error, Debug)]
/// Error returned by the facade: the active backend's error, untouched.
pub enum BusError<C: core::fmt::Debug, F: core::fmt::Debug> {
    /// Raised by the classic CAN backend.
    #[error("Classic backend error: {0:?}")]
    Classic(C),
    /// Raised by the CAN-FD backend.
    #[error("CAN-FD backend error: {0:?}")]
    Fd(F),
}

//==================================================================================VIRTUAL_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures reported by the simulated driver.
pub enum VirtualBusError {
    /// The network has no adapter registered.
    #[error("No adapter available")]
    NoAdapter,
    /// No adapter carries the requested unique hardware id.
    #[error("Adapter {hardware_id:#X} not found")]
    AdapterNotFound { hardware_id: u32 },
    /// The adapter has fewer channels than requested.
    #[error("Invalid channel {channel}: adapter has {available} channel(s)")]
    InvalidChannel { channel: u8, available: u8 },
    /// CAN-FD requested on a classic-only adapter.
    #[error("Adapter {hardware_id:#X} is not CAN-FD capable")]
    FdNotSupported { hardware_id: u32 },
    /// A FIFO cannot hold zero frames.
    #[error("FIFO size must be at least 1")]
    InvalidFifoSize,
    /// Bus timing could not be resolved.
    #[error("Invalid timing: {0}")]
    InvalidTiming(TimingError),
    /// The controller cannot carry this frame (FD on classic, extended when disabled).
    #[error("Frame not supported by this controller")]
    UnsupportedFrame,
    /// The TX FIFO stayed full for the whole timeout.
    #[error("Transmit timeout")]
    Timeout,
    /// Cyclic transmission requires a non-zero period.
    #[error("Cyclic period must be non-zero")]
    InvalidPeriod,
    /// The controller was shut down.
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<TimingError> for VirtualBusError {
    fn from(err: TimingError) -> Self {
        Self::InvalidTiming(err)
    }
}
