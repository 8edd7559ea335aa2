//! Timer port used to space out status queries.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspends the calling task for a duration.
pub trait Sleeper: Send + Sync {
    /// Complete after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}
