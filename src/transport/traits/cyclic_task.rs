//! Handle over a frame registered in a backend's cyclic transmit scheduler.

pub trait CyclicTask {
    type Error: core::fmt::Debug;

    /// Remove the frame from the scheduler. Stopping an expired task is not an error.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// `true` while the scheduler still emits the frame.
    fn is_active(&self) -> bool;
}
