//! Identifier/mask acceptance filters.
//!
//! A frame passes a filter when the masked bits of its identifier equal the
//! masked bits of the filter identifier. An empty filter list accepts every frame.
use crate::transport::frame::CanMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFilter {
    /// Identifier bits to compare.
    pub can_id: u32,
    /// Mask: ones are compared, zeros are don't-care.
    pub can_mask: u32,
    /// When set, restricts the filter to standard (`false`) or extended (`true`) identifiers.
    pub extended: Option<bool>,
}

impl CanFilter {
    /// Filter on identifier bits, regardless of identifier kind.
    pub const fn new(can_id: u32, can_mask: u32) -> Self {
        Self {
            can_id,
            can_mask,
            extended: None,
        }
    }

    /// Filter restricted to 11-bit identifiers.
    pub const fn standard(can_id: u32, can_mask: u32) -> Self {
        Self {
            can_id,
            can_mask,
            extended: Some(false),
        }
    }

    /// Filter restricted to 29-bit identifiers.
    pub const fn extended(can_id: u32, can_mask: u32) -> Self {
        Self {
            can_id,
            can_mask,
            extended: Some(true),
        }
    }

    pub fn matches(&self, message: &CanMessage) -> bool {
        if let Some(extended) = self.extended {
            if extended != message.is_extended() {
                return false;
            }
        }
        (message.raw_id() & self.can_mask) == (self.can_id & self.can_mask)
    }
}

/// `true` when `filters` is empty or at least one filter accepts the frame.
pub fn matches_any(filters: &[CanFilter], message: &CanMessage) -> bool {
    filters.is_empty() || filters.iter().any(|filter| filter.matches(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::{ExtendedId, StandardId};

    fn standard(raw: u16) -> CanMessage {
        CanMessage::new(StandardId::new(raw).unwrap(), &[]).unwrap()
    }

    fn extended(raw: u32) -> CanMessage {
        CanMessage::new(ExtendedId::new(raw).unwrap(), &[]).unwrap()
    }

    #[test]
    fn mask_selects_compared_bits() {
        let filter = CanFilter::new(0x120, 0x7F0);
        assert!(filter.matches(&standard(0x123)));
        assert!(filter.matches(&standard(0x12F)));
        assert!(!filter.matches(&standard(0x133)));
    }

    #[test]
    fn identifier_kind_restriction() {
        let filter = CanFilter::standard(0x100, 0x700);
        assert!(filter.matches(&standard(0x1AA)));
        assert!(!filter.matches(&extended(0x1AA)));

        let filter = CanFilter::extended(0x100, 0x700);
        assert!(filter.matches(&extended(0x1AA)));
        assert!(!filter.matches(&standard(0x1AA)));
    }

    #[test]
    fn empty_list_accepts_everything() {
        assert!(matches_any(&[], &extended(0x1FFF_FFFF)));
        let filters = [CanFilter::new(0x1, 0x7FF), CanFilter::new(0x2, 0x7FF)];
        assert!(matches_any(&filters, &standard(0x2)));
        assert!(!matches_any(&filters, &standard(0x3)));
    }
}
