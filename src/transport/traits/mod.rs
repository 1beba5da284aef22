//! Abstraction traits implemented by the backends (bus operations, cyclic tasks),
//! the drivers that construct them, and the timer used for timeouts.
pub mod bus_timer;
pub mod can_backend;
pub mod can_driver;
pub mod cyclic_task;
