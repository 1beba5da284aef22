//! `korri-ixxat` library: a CAN / CAN-FD bus facade that binds, at construction
//! time, to one of two driver backends (classic or flexible data-rate) and
//! forwards every operation to it. The crate exposes the configuration bundle,
//! the frame and timing primitives shared by both backends, the backend
//! contracts, and an in-memory simulated driver.
#![no_std]

extern crate alloc;
//==================================================================================
/// The facade: one bus type, two backends.
pub mod bus;
/// Configuration bundle and its resolution into backend parameters.
pub mod config;
/// Errors raised by frames, timing resolution, the facade, and the simulated driver.
pub mod error;
/// In-memory driver implementing both backends (testing, replay, desktop simulation).
pub mod simulation;
/// Frames, acceptance filters, bit timing, and backend/driver traits.
pub mod transport;
//==================================================================================
pub use bus::{CyclicHandle, IxxatBus};
pub use config::{BackendParams, BusConfig, ClassicParams, FdParams};
pub use error::BusError;
pub use transport::frame::CanMessage;
