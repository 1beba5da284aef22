//! Asynchronous timer abstraction providing the waits behind send/receive timeouts.
use core::time::Duration;

use futures_util::future::{select, Either};
use futures_util::{pin_mut, Future};

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait BusTimer {
    /// Asynchronously wait for `duration`.
    fn delay<'a>(&'a mut self, duration: Duration) -> impl Future<Output = ()> + 'a;
}

/// Race `operation` against a `timeout` delay.
///
/// Returns `None` when the delay completes first. The operation is polled first,
/// so an operation that is already ready wins even with a zero timeout.
pub async fn with_timeout<T: BusTimer, F: Future>(
    timer: &mut T,
    timeout: Duration,
    operation: F,
) -> Option<F::Output> {
    let delay = timer.delay(timeout);
    pin_mut!(operation);
    pin_mut!(delay);

    match select(operation, delay).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

//==================================================================================EMBASSY
/// [`BusTimer`] backed by `embassy_time::Timer`.
#[cfg(feature = "embassy-time")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyTimer;

#[cfg(feature = "embassy-time")]
impl BusTimer for EmbassyTimer {
    async fn delay(&mut self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        embassy_time::Timer::after(embassy_time::Duration::from_micros(micros)).await;
    }
}
