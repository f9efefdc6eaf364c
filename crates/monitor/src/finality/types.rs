use crate::{FinalityError, tag};
use alloy_primitives::{Address, B256, U256, b256};

/// Signature of `VerifyBatchesTrustedAggregator(uint32 indexed rollupID, ...)`, emitted by the
/// rollup manager when a batch is verified.
pub const VERIFY_BATCHES_TRUSTED_AGGREGATOR: B256 =
    b256!("d1ec3a1216f08b6eff72e169ceb548b782db18a6614852618d86bb19f3f9b0d3");

/// Signature of `OutputProposed(bytes32 indexed outputRoot, uint256 indexed l2OutputIndex,
/// uint256 indexed l2BlockNumber, uint256 l1Timestamp)`.
pub const OUTPUT_PROPOSED: B256 =
    b256!("a7aaf2512769da4e444e3de247be2564225c2e7a8f74cfe528e46e17d24868e2");

/// Selects the L1 logs the monitor follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCriteria {
    /// The contract emitting the primary event.
    pub contract: Address,
    /// Signature of the primary event.
    pub event_topic: B256,
    /// Signature of the secondary event nested in the same transaction.
    pub secondary_topic: B256,
    /// The rollup to follow. Primary events for other rollups are ignored.
    pub rollup_id: u32,
}

impl FilterCriteria {
    /// Creates criteria for `VerifyBatchesTrustedAggregator` / `OutputProposed` on `contract`.
    pub const fn new(contract: Address, rollup_id: u32) -> Self {
        Self {
            contract,
            event_topic: VERIFY_BATCHES_TRUSTED_AGGREGATOR,
            secondary_topic: OUTPUT_PROPOSED,
            rollup_id,
        }
    }

    /// Overrides the event signatures.
    pub const fn with_topics(mut self, event_topic: B256, secondary_topic: B256) -> Self {
        self.event_topic = event_topic;
        self.secondary_topic = secondary_topic;
        self
    }
}

/// A finality measurement for one proposed L2 block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalityObservation {
    /// The rollup the proposal belongs to.
    pub rollup_id: u32,
    /// The proposed L2 block.
    pub l2_block_number: U256,
    /// The L1 timestamp carried by the proposal.
    pub l1_timestamp: U256,
    /// The timestamp of the proposed L2 block.
    pub l2_block_timestamp: u64,
    /// `l1_timestamp - l2_block_timestamp`. Negative values are kept as is.
    pub delta_seconds: i128,
}

impl FinalityObservation {
    /// Builds an observation, computing the signed delta.
    pub fn new(
        rollup_id: u32,
        l2_block_number: U256,
        l1_timestamp: U256,
        l2_block_timestamp: u64,
    ) -> Result<Self, FinalityError> {
        let l1 = i128::try_from(&l1_timestamp)
            .map_err(|_| FinalityError::TimestampOverflow(l1_timestamp))?;
        // Cannot underflow: l1 is non-negative and the subtrahend is at most u64::MAX.
        let delta_seconds = l1 - i128::from(l2_block_timestamp);

        Ok(Self { rollup_id, l2_block_number, l1_timestamp, l2_block_timestamp, delta_seconds })
    }

    /// Tags attached to the delta gauge.
    pub fn tags(&self) -> Vec<String> {
        vec![tag("l2_block_number", self.l2_block_number), tag("rollup_id", self.rollup_id)]
    }
}

/// Outcome of correlating one matched L1 log.
#[derive(Debug)]
pub enum Correlation {
    /// The log belongs to another rollup sharing the contract.
    Ignored {
        /// The rollup id decoded from the log.
        rollup_id: U256,
    },
    /// The transaction of the log was scanned for secondary events.
    Processed {
        /// The transaction that was scanned.
        transaction_hash: B256,
        /// Observations that were built and submitted.
        observations: Vec<FinalityObservation>,
        /// Secondary events that failed, in transaction order.
        failures: Vec<FinalityError>,
    },
}

impl Correlation {
    /// Returns the submitted observations, empty when the log was ignored.
    pub fn observations(&self) -> &[FinalityObservation] {
        match self {
            Self::Ignored { .. } => &[],
            Self::Processed { observations, .. } => observations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1_700_000_600, 1_700_000_000, 600)]
    #[case(1_700_000_000, 1_700_000_000, 0)]
    #[case(1_700_000_000, 1_700_000_042, -42)]
    #[case(0, u64::MAX, -i128::from(u64::MAX))]
    fn test_delta_is_signed(#[case] l1: u64, #[case] l2: u64, #[case] expected: i128) {
        let observation = FinalityObservation::new(1, U256::from(10), U256::from(l1), l2).unwrap();
        assert_eq!(observation.delta_seconds, expected);
    }

    #[test]
    fn test_delta_past_u64_timestamps() {
        let l1 = U256::from(u64::MAX) + U256::from(1);
        let observation = FinalityObservation::new(1, U256::from(10), l1, 1_700_000_000).unwrap();
        assert_eq!(observation.delta_seconds, (1i128 << 64) - 1_700_000_000);
        assert_eq!(observation.l1_timestamp, l1);
    }

    #[test]
    fn test_timestamp_overflow() {
        let l1 = U256::from(i128::MAX as u128) + U256::from(1);
        let err = FinalityObservation::new(1, U256::from(10), l1, 0).unwrap_err();
        assert!(matches!(err, FinalityError::TimestampOverflow(value) if value == l1));

        let max = U256::from(i128::MAX as u128);
        let observation = FinalityObservation::new(1, U256::from(10), max, 0).unwrap();
        assert_eq!(observation.delta_seconds, i128::MAX);
    }

    #[test]
    fn test_observation_tags() {
        let observation =
            FinalityObservation::new(20, U256::from(1_234_567), U256::from(100), 50).unwrap();
        assert_eq!(observation.tags(), vec!["l2_block_number:1234567", "rollup_id:20"]);
    }

    #[test]
    fn test_default_criteria() {
        let criteria = FilterCriteria::new(Address::repeat_byte(0x11), 3);
        assert_eq!(criteria.event_topic, VERIFY_BATCHES_TRUSTED_AGGREGATOR);
        assert_eq!(criteria.secondary_topic, OUTPUT_PROPOSED);

        let custom = criteria.with_topics(B256::repeat_byte(1), B256::repeat_byte(2));
        assert_eq!(custom.event_topic, B256::repeat_byte(1));
        assert_eq!(custom.secondary_topic, B256::repeat_byte(2));
        assert_eq!(custom.rollup_id, 3);
    }
}
