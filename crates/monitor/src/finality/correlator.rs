//! Correlation of verified batches with the output proposals of the same transaction.

use crate::{
    ChainSource, Correlation, FilterCriteria, FinalityError, FinalityObservation, L1Client,
    L2Client, L2TimestampResolver, Metrics, MetricsEmitter, RawLog,
};
use alloy_primitives::U256;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Decodes the rollup id from `topics[1]` of a primary event.
pub fn decode_rollup_id(log: &RawLog) -> Result<U256, FinalityError> {
    match log.topic(1) {
        Some(topic) => Ok(U256::from_be_bytes(topic.0)),
        None => Err(FinalityError::MissingTopics { expected: 2, actual: log.topics.len() }),
    }
}

/// Decodes `(l2_block_number, l1_timestamp)` from an `OutputProposed` log.
///
/// The block number is the indexed `topics[3]` and the L1 timestamp is the first word of the
/// payload.
pub fn decode_output_proposed(log: &RawLog) -> Result<(U256, U256), FinalityError> {
    let Some(block_topic) = log.topic(3) else {
        return Err(FinalityError::MissingTopics { expected: 4, actual: log.topics.len() });
    };
    let Some(word) = log.data.get(..32) else {
        return Err(FinalityError::ShortPayload { expected: 32, actual: log.data.len() });
    };

    Ok((U256::from_be_bytes(block_topic.0), U256::from_be_slice(word)))
}

/// Turns a matched `VerifyBatchesTrustedAggregator` log into finality observations.
///
/// Each `OutputProposed` log found in the transaction of the matched log is processed
/// independently, and its observation is submitted as soon as it is built.
#[derive(Debug)]
pub struct FinalityCorrelator<L1, L2, E> {
    criteria: FilterCriteria,
    l1: Arc<L1>,
    resolver: L2TimestampResolver<L2>,
    emitter: Arc<E>,
}

impl<L1, L2, E> FinalityCorrelator<L1, L2, E>
where
    L1: L1Client,
    L2: L2Client,
    E: MetricsEmitter,
{
    /// Creates a new [`FinalityCorrelator`].
    pub const fn new(
        criteria: FilterCriteria,
        l1: Arc<L1>,
        resolver: L2TimestampResolver<L2>,
        emitter: Arc<E>,
    ) -> Self {
        Self { criteria, l1, resolver, emitter }
    }

    /// Returns the criteria this correlator matches against.
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Correlates one matched L1 log.
    ///
    /// Errors returned here concern the matched log as a whole. Failures of individual
    /// proposals are collected in [`Correlation::Processed`].
    pub async fn correlate(&self, log: &RawLog) -> Result<Correlation, FinalityError> {
        if log.source != ChainSource::L1 {
            return Err(FinalityError::UnexpectedSource(log.source));
        }
        let rollup_id = decode_rollup_id(log)?;
        if rollup_id != U256::from(self.criteria.rollup_id) {
            debug!(target: "finality::correlator", source = %log.source, %rollup_id, "Ignoring batch verification for another rollup");
            return Ok(Correlation::Ignored { rollup_id });
        }

        let transaction_hash = log.transaction_hash.ok_or(FinalityError::MissingTransactionHash)?;
        let logs = self
            .l1
            .transaction_logs(transaction_hash)
            .await?
            .ok_or(FinalityError::ReceiptNotFound(transaction_hash))?;

        let mut observations = Vec::new();
        let mut failures = Vec::new();
        for proposal in logs.iter().filter(|l| l.topic(0) == Some(self.criteria.secondary_topic)) {
            match self.observe(proposal).await {
                Ok(observation) => observations.push(observation),
                Err(err) => {
                    if err.is_protocol_violation() {
                        error!(target: "finality::correlator", %transaction_hash, %err, "Malformed output proposal");
                    } else {
                        warn!(target: "finality::correlator", %transaction_hash, %err, "Failed to observe output proposal");
                    }
                    failures.push(err);
                }
            }
        }

        if observations.is_empty() && failures.is_empty() {
            debug!(target: "finality::correlator", %transaction_hash, "No output proposal in verified batch transaction");
        }

        Ok(Correlation::Processed { transaction_hash, observations, failures })
    }

    async fn observe(&self, proposal: &RawLog) -> Result<FinalityObservation, FinalityError> {
        let (l2_block_number, l1_timestamp) = decode_output_proposed(proposal)?;
        let l2_block_timestamp = self.resolver.resolve(l2_block_number).await?;
        let observation = FinalityObservation::new(
            self.criteria.rollup_id,
            l2_block_number,
            l1_timestamp,
            l2_block_timestamp,
        )?;

        // i128 to f64 is lossy past 2^53 seconds, far beyond any real timestamp.
        self.emitter.gauge(
            Metrics::L1_L2_TIME_DELTA,
            observation.delta_seconds as f64,
            &observation.tags(),
        )?;

        info!(
            target: "finality::correlator",
            rollup_id = observation.rollup_id,
            %l2_block_number,
            delta_seconds = observation.delta_seconds,
            "Observed L2 finality"
        );
        Ok(observation)
    }
}
