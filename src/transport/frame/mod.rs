//! In-memory representation of a classic CAN or CAN-FD frame as it travels
//! through the facade, unchanged, to and from a backend.
use core::time::Duration;

use embedded_can::{ExtendedId, Frame, Id, StandardId};

use crate::error::FrameError;

/// Maximum payload of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;
/// Maximum payload of a CAN-FD frame.
pub const CANFD_MAX_DLEN: usize = 64;

// Payload length for each Data Length Code (CAN-FD table, identical to classic up to 8).
const DLC_LENGTHS: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Converts a Data Length Code into a payload length in bytes.
pub fn dlc_to_len(dlc: u8) -> Result<usize, FrameError> {
    DLC_LENGTHS
        .get(dlc as usize)
        .copied()
        .ok_or(FrameError::InvalidDlc { dlc })
}

/// Smallest Data Length Code able to carry `len` bytes.
pub fn len_to_dlc(len: usize) -> Result<u8, FrameError> {
    DLC_LENGTHS
        .iter()
        .position(|&capacity| capacity >= len)
        .map(|dlc| dlc as u8)
        .ok_or(FrameError::TooMuchData {
            len,
            max: CANFD_MAX_DLEN,
        })
}

//==================================================================================CAN_MESSAGE
#[derive(Clone, Copy, Debug)]
/// A CAN message: standard/extended identifier, up to 64 payload bytes,
/// CAN-FD flags, and the reception timestamp set by the driver.
pub struct CanMessage {
    id: Id,
    data: [u8; CANFD_MAX_DLEN],
    /// Number of valid payload bytes (0 for remote frames).
    len: usize,
    /// Data Length Code as sent on the wire.
    dlc: u8,
    remote: bool,
    fd: bool,
    bitrate_switch: bool,
    error_state_indicator: bool,
    timestamp: Duration,
}

impl CanMessage {
    /// Classic data frame carrying up to 8 bytes.
    pub fn new(id: impl Into<Id>, data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > CAN_MAX_DLEN {
            return Err(FrameError::TooMuchData {
                len: data.len(),
                max: CAN_MAX_DLEN,
            });
        }
        let mut buffer = [0u8; CANFD_MAX_DLEN];
        buffer[..data.len()].copy_from_slice(data);
        Ok(Self {
            id: id.into(),
            data: buffer,
            len: data.len(),
            dlc: data.len() as u8,
            remote: false,
            fd: false,
            bitrate_switch: false,
            error_state_indicator: false,
            timestamp: Duration::ZERO,
        })
    }

    /// CAN-FD data frame. Lengths that have no exact DLC are zero-padded up to
    /// the next valid size (e.g. 9 bytes travel as 12).
    pub fn new_fd(id: impl Into<Id>, data: &[u8], bitrate_switch: bool) -> Result<Self, FrameError> {
        let dlc = len_to_dlc(data.len())?;
        let len = dlc_to_len(dlc)?;
        let mut buffer = [0u8; CANFD_MAX_DLEN];
        buffer[..data.len()].copy_from_slice(data);
        Ok(Self {
            id: id.into(),
            data: buffer,
            len,
            dlc,
            remote: false,
            fd: true,
            bitrate_switch,
            error_state_indicator: false,
            timestamp: Duration::ZERO,
        })
    }

    /// Classic remote frame requesting `dlc` bytes.
    pub fn new_remote(id: impl Into<Id>, dlc: usize) -> Result<Self, FrameError> {
        if dlc > CAN_MAX_DLEN {
            return Err(FrameError::TooMuchData {
                len: dlc,
                max: CAN_MAX_DLEN,
            });
        }
        Ok(Self {
            id: id.into(),
            data: [0u8; CANFD_MAX_DLEN],
            len: 0,
            dlc: dlc as u8,
            remote: true,
            fd: false,
            bitrate_switch: false,
            error_state_indicator: false,
            timestamp: Duration::ZERO,
        })
    }

    /// Builds the identifier from a raw value, then a classic or CAN-FD data frame.
    pub fn from_raw(raw_id: u32, extended: bool, data: &[u8], fd: bool) -> Result<Self, FrameError> {
        let id = raw_to_id(raw_id, extended)?;
        if fd {
            Self::new_fd(id, data, false)
        } else {
            Self::new(id, data)
        }
    }

    /// Sets the Error State Indicator (CAN-FD only).
    pub fn with_error_state_indicator(mut self, esi: bool) -> Result<Self, FrameError> {
        if !self.fd && esi {
            return Err(FrameError::FdFlagsOnClassicFrame);
        }
        self.error_state_indicator = esi;
        Ok(self)
    }

    /// Sets the Bit Rate Switch flag (CAN-FD only).
    pub fn with_bitrate_switch(mut self, brs: bool) -> Result<Self, FrameError> {
        if !self.fd && brs {
            return Err(FrameError::FdFlagsOnClassicFrame);
        }
        self.bitrate_switch = brs;
        Ok(self)
    }

    /// Converts a frame to CAN-FD. Remote frames have no CAN-FD form.
    pub fn into_fd(mut self) -> Result<Self, FrameError> {
        if self.remote {
            return Err(FrameError::RemoteFdFrame);
        }
        self.fd = true;
        Ok(self)
    }

    /// Stamps the frame with a reception time.
    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Identifier as a plain integer (11 or 29 significant bits).
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn is_fd(&self) -> bool {
        self.fd
    }

    pub fn bitrate_switch(&self) -> bool {
        self.bitrate_switch
    }

    pub fn error_state_indicator(&self) -> bool {
        self.error_state_indicator
    }

    /// Data Length Code (0..=15).
    pub fn dlc_code(&self) -> u8 {
        self.dlc
    }

    /// Payload bytes. Empty for remote frames.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Time at which the driver received the frame (zero for outbound frames).
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }
}

// The timestamp is reception metadata and does not take part in equality.
impl PartialEq for CanMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.dlc == other.dlc
            && self.remote == other.remote
            && self.fd == other.fd
            && self.bitrate_switch == other.bitrate_switch
            && self.error_state_indicator == other.error_state_indicator
            && self.data() == other.data()
    }
}

impl Eq for CanMessage {}

impl Frame for CanMessage {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        CanMessage::new(id, data).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        CanMessage::new_remote(id, dlc).ok()
    }

    fn is_extended(&self) -> bool {
        CanMessage::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        CanMessage::data(self)
    }
}

/// Builds an `embedded_can::Id` from a raw identifier.
pub fn raw_to_id(raw_id: u32, extended: bool) -> Result<Id, FrameError> {
    let id = if extended {
        ExtendedId::new(raw_id).map(Id::Extended)
    } else {
        u16::try_from(raw_id)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
    };
    id.ok_or(FrameError::IdOutOfRange { id: raw_id })
}
