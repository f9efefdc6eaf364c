//! The L1 log subscription and its reconnect loop.

use crate::{
    Correlation, FilterCriteria, FinalityCorrelator, L1Client, L2Client, LogSubscription, Metrics,
    MetricsEmitter, MonitorActor, RawLog, SubscriberError,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Delay between losing the subscription and the next attempt to establish it.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Period of the L1 liveness probe while subscribed.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(30);

/// Number of matched logs that may wait for correlation before the subscriber stops reading.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 256;

/// Timing and buffering of the [`FinalitySubscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Fixed delay before every reconnect attempt.
    pub reconnect_delay: Duration,
    /// Period of the liveness probe.
    pub liveness_interval: Duration,
    /// Capacity of the queue between the subscription and the correlator.
    pub dispatch_capacity: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
        }
    }
}

/// Follows `VerifyBatchesTrustedAggregator` logs on L1 and feeds them to a
/// [`FinalityCorrelator`].
///
/// Matched logs are queued on a bounded channel drained by a dedicated correlation task. When
/// the queue is full the subscriber stops reading from the subscription until there is room.
///
/// The subscription is torn down and re-established after
/// [`SubscriberConfig::reconnect_delay`] whenever it fails, ends, or the liveness probe fails.
/// Every re-established subscription starts from a rebuilt L1 connection. There is no limit on
/// the number of attempts. Logs emitted while disconnected are not replayed.
#[derive(Debug)]
pub struct FinalitySubscriber<L1, L2, E> {
    config: SubscriberConfig,
    l1: Arc<L1>,
    correlator: FinalityCorrelator<L1, L2, E>,
    cancellation: CancellationToken,
}

impl<L1, L2, E> FinalitySubscriber<L1, L2, E>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    E: MetricsEmitter + 'static,
{
    /// Creates a new [`FinalitySubscriber`].
    pub const fn new(
        config: SubscriberConfig,
        l1: Arc<L1>,
        correlator: FinalityCorrelator<L1, L2, E>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { config, l1, correlator, cancellation }
    }
}

#[async_trait]
impl<L1, L2, E> MonitorActor for FinalitySubscriber<L1, L2, E>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    E: MetricsEmitter + 'static,
{
    type Error = SubscriberError;

    async fn start(self) -> Result<(), Self::Error> {
        let Self { config, l1, correlator, cancellation } = self;
        let criteria = *correlator.criteria();
        let (dispatch, queue) = mpsc::channel(config.dispatch_capacity.max(1));

        let worker = tokio::spawn(correlate_queued(correlator, queue, cancellation.clone()));
        let result = Reconnector { config, l1, cancellation }.run(criteria, &dispatch).await;

        drop(dispatch);
        if let Err(err) = worker.await {
            error!(target: "finality::subscriber", %err, "Correlation task panicked");
        }
        result
    }
}

enum State {
    Connecting,
    Subscribed(LogSubscription),
    Backoff,
}

/// The subscription half of the subscriber, once the correlator runs on its own task.
struct Reconnector<L1> {
    config: SubscriberConfig,
    l1: Arc<L1>,
    cancellation: CancellationToken,
}

impl<L1: L1Client> Reconnector<L1> {
    /// Runs the `Connecting -> Subscribed -> Backoff` cycle until cancelled.
    async fn run(
        &self,
        criteria: FilterCriteria,
        dispatch: &mpsc::Sender<RawLog>,
    ) -> Result<(), SubscriberError> {
        let mut state = State::Connecting;
        loop {
            if self.cancellation.is_cancelled() {
                info!(target: "finality::subscriber", "Finality subscriber cancelled, stopping");
                return Ok(());
            }

            state = match state {
                State::Connecting => {
                    match self.l1.subscribe_logs(criteria.contract, criteria.event_topic).await {
                        Ok(subscription) => {
                            info!(
                                target: "finality::subscriber",
                                contract = %criteria.contract,
                                rollup_id = criteria.rollup_id,
                                "Subscribed to batch verifications"
                            );
                            State::Subscribed(subscription)
                        }
                        Err(err) => {
                            let err = SubscriberError::Subscribe(err);
                            warn!(target: "finality::subscriber", %err, delay = ?self.config.reconnect_delay, "Subscription attempt failed");
                            State::Backoff
                        }
                    }
                }
                State::Subscribed(subscription) => match self.watch(subscription, dispatch).await {
                    // Cancelled, the next iteration returns.
                    Ok(()) => State::Connecting,
                    Err(SubscriberError::DispatchClosed) => {
                        error!(target: "finality::subscriber", "Correlation task is gone, stopping");
                        return Err(SubscriberError::DispatchClosed);
                    }
                    Err(err) => {
                        warn!(target: "finality::subscriber", %err, delay = ?self.config.reconnect_delay, "Lost log subscription");
                        State::Backoff
                    }
                },
                State::Backoff => self.backoff().await,
            };
        }
    }

    /// Waits out the reconnect delay, then rebuilds the L1 connection.
    ///
    /// Returns [`State::Connecting`] once the connection is rebuilt, and [`State::Backoff`] when
    /// it could not be or the subscriber was cancelled.
    async fn backoff(&self) -> State {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => return State::Backoff,
            _ = tokio::time::sleep(self.config.reconnect_delay) => {}
        }
        metrics::counter!(Metrics::FINALITY_SUBSCRIPTION_RECONNECTS).increment(1);
        debug!(target: "finality::subscriber", "Reconnecting to L1");

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => State::Backoff,
            reconnected = self.l1.reconnect() => match reconnected {
                Ok(()) => State::Connecting,
                Err(err) => {
                    warn!(target: "finality::subscriber", %err, delay = ?self.config.reconnect_delay, "Failed to reconnect to L1");
                    State::Backoff
                }
            },
        }
    }

    /// Drives one subscription until it fails or the subscriber is cancelled.
    ///
    /// Returns `Ok(())` on cancellation.
    async fn watch(
        &self,
        mut subscription: LogSubscription,
        dispatch: &mpsc::Sender<RawLog>,
    ) -> Result<(), SubscriberError> {
        let period = self.config.liveness_interval;
        let mut liveness = tokio::time::interval_at(Instant::now() + period, period);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return Ok(()),
                item = subscription.next() => match item {
                    Some(Ok(log)) => {
                        tokio::select! {
                            biased;
                            _ = self.cancellation.cancelled() => return Ok(()),
                            sent = dispatch.send(log) => {
                                sent.map_err(|_| SubscriberError::DispatchClosed)?;
                            }
                        }
                        let depth = dispatch.max_capacity() - dispatch.capacity();
                        metrics::gauge!(Metrics::FINALITY_DISPATCH_QUEUE_DEPTH).set(depth as f64);
                    }
                    Some(Err(err)) => return Err(SubscriberError::Stream(err)),
                    None => return Err(SubscriberError::Closed),
                },
                _ = liveness.tick() => {
                    let height = self.l1.block_number().await.map_err(SubscriberError::Liveness)?;
                    debug!(target: "finality::subscriber", height, "L1 liveness probe succeeded");
                }
            }
        }
    }
}

/// Drains the dispatch queue, correlating one log at a time.
async fn correlate_queued<L1, L2, E>(
    correlator: FinalityCorrelator<L1, L2, E>,
    mut queue: mpsc::Receiver<RawLog>,
    cancellation: CancellationToken,
) where
    L1: L1Client,
    L2: L2Client,
    E: MetricsEmitter,
{
    loop {
        let log = tokio::select! {
            biased;
            _ = cancellation.cancelled() => break,
            log = queue.recv() => match log {
                Some(log) => log,
                None => break,
            },
        };
        metrics::gauge!(Metrics::FINALITY_DISPATCH_QUEUE_DEPTH).set(queue.len() as f64);

        match correlator.correlate(&log).await {
            Ok(Correlation::Ignored { .. }) => {}
            Ok(Correlation::Processed { transaction_hash, observations, failures }) => {
                debug!(
                    target: "finality::correlator",
                    %transaction_hash,
                    observed = observations.len(),
                    failed = failures.len(),
                    "Correlated batch verification"
                );
            }
            Err(err) if err.is_protocol_violation() => {
                error!(target: "finality::correlator", %err, "Dropping malformed batch verification log");
            }
            Err(err) => {
                warn!(target: "finality::correlator", %err, transaction_hash = ?log.transaction_hash, "Failed to correlate batch verification");
            }
        }
    }
    debug!(target: "finality::correlator", "Correlation task stopped");
}
