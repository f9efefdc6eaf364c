//! [MonitorActor] trait.

use async_trait::async_trait;

/// The [MonitorActor] is a long-running, cancellable service of the monitor.
///
/// An actor is built with everything it needs (clients, configuration and the shared
/// cancellation token), then consumed by [`MonitorActor::start`]. `start` only returns once the
/// cancellation token fires, or when the actor hits a failure it cannot recover from.
#[async_trait]
pub trait MonitorActor: Send + 'static {
    /// The error type for the actor.
    type Error: std::fmt::Debug;

    /// Starts the actor.
    async fn start(self) -> Result<(), Self::Error>;
}
