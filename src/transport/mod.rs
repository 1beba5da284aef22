//! Transport layer shared by both backends: CAN / CAN-FD frame representation,
//! acceptance filters, bus timing resolution, and the backend/driver traits.
//!
//! Timeouts are expressed as [`core::time::Duration`]. `None` means "wait
//! indefinitely", `Some(Duration::ZERO)` means "do not wait".

pub mod filter;
pub mod frame;
pub mod timing;
pub mod traits;
