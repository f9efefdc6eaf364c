//! In-memory clients and emitters for tests.

use crate::{
    BlockHeaderResponse, ChainSource, EmitError, L1Client, L2Client, LogSubscription,
    MetricsEmitter, OUTPUT_PROPOSED, RawLog, VERIFY_BATCHES_TRUSTED_AGGREGATOR,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_transport::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
};
use tokio::time::Instant;

/// Encodes `n` as a big-endian word.
pub(crate) fn word(n: u64) -> B256 {
    B256::from(U256::from(n).to_be_bytes::<32>())
}

/// A `VerifyBatchesTrustedAggregator` log for `rollup_id`, emitted by `tx`.
pub(crate) fn verify_batches_log(rollup_id: U256, tx: B256) -> RawLog {
    RawLog {
        topics: vec![
            VERIFY_BATCHES_TRUSTED_AGGREGATOR,
            B256::from(rollup_id.to_be_bytes::<32>()),
            Address::repeat_byte(0xa9).into_word(),
        ],
        data: Bytes::from(vec![0u8; 96]),
        transaction_hash: Some(tx),
        source: ChainSource::L1,
    }
}

/// An `OutputProposed` log for L2 block `block`, proposed at L1 time `l1_timestamp`.
pub(crate) fn output_proposed_log(block: u64, l1_timestamp: u64) -> RawLog {
    RawLog {
        topics: vec![OUTPUT_PROPOSED, B256::repeat_byte(0x0e), word(block / 10), word(block)],
        data: Bytes::copy_from_slice(word(l1_timestamp).as_slice()),
        transaction_hash: None,
        source: ChainSource::L1,
    }
}

/// A gauge submitted to a [`RecordingEmitter`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GaugeSample {
    pub(crate) name: String,
    pub(crate) value: f64,
    pub(crate) tags: Vec<String>,
}

/// Records every gauge it accepts. Names registered with
/// [`RecordingEmitter::failing_on`] are rejected instead.
#[derive(Debug, Default)]
pub(crate) struct RecordingEmitter {
    samples: Mutex<Vec<GaugeSample>>,
    failing: HashSet<String>,
}

impl RecordingEmitter {
    pub(crate) fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    pub(crate) fn samples(&self) -> Vec<GaugeSample> {
        self.samples.lock().unwrap().clone()
    }
}

impl MetricsEmitter for RecordingEmitter {
    fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<(), EmitError> {
        if self.failing.contains(name) {
            return Err(EmitError::NonFinite(name.to_owned()));
        }
        self.samples.lock().unwrap().push(GaugeSample {
            name: name.to_owned(),
            value,
            tags: tags.to_vec(),
        });
        Ok(())
    }
}

/// How a [`ScriptedL1Client`] answers one subscription attempt.
#[derive(Debug)]
pub(crate) enum ScriptedSubscription {
    /// The attempt fails.
    Refuse,
    /// The subscription yields `logs`, then fails or stays open without further items.
    Deliver { logs: Vec<RawLog>, then_fail: bool },
}

/// An L1 client answering from scripted subscriptions, receipts, probe and reconnect results.
///
/// Once the scripted subscriptions are used up, every attempt opens a subscription that never
/// yields. Unscripted probes and reconnects succeed.
///
/// With [`ScriptedL1Client::losing_backend`], a failing subscription also takes the connection
/// down: every request fails until a reconnect succeeds.
#[derive(Debug, Default)]
pub(crate) struct ScriptedL1Client {
    subscriptions: Mutex<VecDeque<ScriptedSubscription>>,
    receipts: HashMap<B256, Vec<RawLog>>,
    probes: Mutex<VecDeque<bool>>,
    reconnects: Mutex<VecDeque<bool>>,
    loses_backend: bool,
    backend_gone: Mutex<bool>,
    subscribe_times: Mutex<Vec<Instant>>,
    reconnect_times: Mutex<Vec<Instant>>,
    probe_count: Mutex<usize>,
}

impl ScriptedL1Client {
    pub(crate) fn with_subscription(self, subscription: ScriptedSubscription) -> Self {
        self.subscriptions.lock().unwrap().push_back(subscription);
        self
    }

    pub(crate) fn with_receipt(mut self, tx: B256, logs: Vec<RawLog>) -> Self {
        self.receipts.insert(tx, logs);
        self
    }

    pub(crate) fn with_probe_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.probes.lock().unwrap().extend(results);
        self
    }

    pub(crate) fn with_reconnect_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.reconnects.lock().unwrap().extend(results);
        self
    }

    pub(crate) fn losing_backend(mut self) -> Self {
        self.loses_backend = true;
        self
    }

    /// Instants of every subscription attempt.
    pub(crate) fn subscribe_times(&self) -> Vec<Instant> {
        self.subscribe_times.lock().unwrap().clone()
    }

    /// Instants of every reconnect attempt.
    pub(crate) fn reconnect_times(&self) -> Vec<Instant> {
        self.reconnect_times.lock().unwrap().clone()
    }

    fn backend_gone(&self) -> bool {
        *self.backend_gone.lock().unwrap()
    }

    pub(crate) fn probe_count(&self) -> usize {
        *self.probe_count.lock().unwrap()
    }
}

#[async_trait]
impl L1Client for ScriptedL1Client {
    async fn subscribe_logs(
        &self,
        _contract: Address,
        _event_topic: B256,
    ) -> Result<LogSubscription, TransportError> {
        self.subscribe_times.lock().unwrap().push(Instant::now());
        if self.backend_gone() {
            return Err(TransportErrorKind::backend_gone());
        }
        let next = self.subscriptions.lock().unwrap().pop_front();
        match next {
            Some(ScriptedSubscription::Refuse) => {
                Err(TransportErrorKind::custom_str("subscription refused"))
            }
            Some(ScriptedSubscription::Deliver { logs, then_fail }) => {
                let head = stream::iter(logs.into_iter().map(Ok));
                if then_fail {
                    // Marked down at hand-out, the stream fails right after.
                    *self.backend_gone.lock().unwrap() = self.loses_backend;
                    let failure = stream::iter([Err(TransportErrorKind::custom_str("socket closed"))]);
                    Ok(head.chain(failure).boxed())
                } else {
                    Ok(head.chain(stream::pending()).boxed())
                }
            }
            None => Ok(stream::pending().boxed()),
        }
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<RawLog>>, TransportError> {
        Ok(self.receipts.get(&tx_hash).cloned())
    }

    async fn block_number(&self) -> Result<u64, TransportError> {
        *self.probe_count.lock().unwrap() += 1;
        if self.backend_gone() {
            return Err(TransportErrorKind::backend_gone());
        }
        let healthy = self.probes.lock().unwrap().pop_front().unwrap_or(true);
        if healthy { Ok(21_000_000) } else { Err(TransportErrorKind::custom_str("node unreachable")) }
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        self.reconnect_times.lock().unwrap().push(Instant::now());
        let success = self.reconnects.lock().unwrap().pop_front().unwrap_or(true);
        if success {
            *self.backend_gone.lock().unwrap() = false;
            Ok(())
        } else {
            Err(TransportErrorKind::custom_str("connection refused"))
        }
    }
}

/// An L2 client answering balance queries from per-address queues.
///
/// `None` entries fail the query. An exhausted queue repeats its last balance.
#[derive(Debug, Default)]
pub(crate) struct ScriptedL2Client {
    balances: Mutex<HashMap<Address, VecDeque<Option<U256>>>>,
    last: Mutex<HashMap<Address, U256>>,
    queries: Mutex<Vec<Address>>,
}

impl ScriptedL2Client {
    pub(crate) fn with_balances(
        self,
        address: Address,
        balances: impl IntoIterator<Item = Option<u64>>,
    ) -> Self {
        self.balances
            .lock()
            .unwrap()
            .entry(address)
            .or_default()
            .extend(balances.into_iter().map(|balance| balance.map(U256::from)));
        self
    }

    /// Addresses queried, in order.
    pub(crate) fn queries(&self) -> Vec<Address> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl L2Client for ScriptedL2Client {
    async fn block_header(
        &self,
        _number: U256,
    ) -> Result<Option<BlockHeaderResponse>, TransportError> {
        Err(TransportErrorKind::custom_str("block headers are not scripted"))
    }

    async fn balance(&self, address: Address) -> Result<U256, TransportError> {
        self.queries.lock().unwrap().push(address);
        let next = self.balances.lock().unwrap().get_mut(&address).and_then(VecDeque::pop_front);
        match next {
            Some(Some(balance)) => {
                self.last.lock().unwrap().insert(address, balance);
                Ok(balance)
            }
            Some(None) => Err(TransportErrorKind::custom_str("balance unavailable")),
            None => self
                .last
                .lock()
                .unwrap()
                .get(&address)
                .copied()
                .ok_or_else(|| TransportErrorKind::custom_str("unknown account")),
        }
    }
}
