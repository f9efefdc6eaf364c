//! Alloy-backed [`L1Client`] and [`L2Client`] implementations.

use crate::{BlockHeaderResponse, ChainSource, L1Client, L2Client, LogSubscription, RawLog};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::Filter;
use alloy_transport::TransportError;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

/// An [`L1Client`] over a pubsub capable (websocket or ipc) alloy provider.
///
/// A pubsub backend gives up after a bounded number of reconnects of its own. From then on the
/// provider fails every request, so [`L1Client::reconnect`] replaces it with a fresh one.
#[derive(Debug)]
pub struct AlloyL1Client {
    url: Url,
    provider: RwLock<RootProvider>,
}

impl AlloyL1Client {
    /// Creates a client around an established `provider`. `url` is used to rebuild it.
    pub fn new(url: Url, provider: RootProvider) -> Self {
        Self { url, provider: RwLock::new(provider) }
    }

    /// Connects to the L1 node at `url`.
    ///
    /// Log subscriptions need a pubsub transport, so `url` is expected to use a `ws`, `wss` or
    /// ipc scheme.
    pub async fn connect(url: &Url) -> Result<Self, TransportError> {
        let provider = RootProvider::connect(url.as_str()).await?;
        info!(target: "client::l1", %url, "Connected to L1 node");
        Ok(Self::new(url.clone(), provider))
    }

    async fn provider(&self) -> RootProvider {
        self.provider.read().await.clone()
    }
}

#[async_trait]
impl L1Client for AlloyL1Client {
    async fn subscribe_logs(
        &self,
        contract: Address,
        event_topic: B256,
    ) -> Result<LogSubscription, TransportError> {
        let filter = Filter::new().address(contract).event_signature(event_topic);
        let subscription = self.provider().await.subscribe_logs(&filter).await?;

        Ok(subscription
            .into_stream()
            .map(|log| Ok(RawLog::from_rpc(log, ChainSource::L1)))
            .boxed())
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<RawLog>>, TransportError> {
        let receipt = self.provider().await.get_transaction_receipt(tx_hash).await?;

        Ok(receipt.map(|receipt| {
            receipt
                .inner
                .logs()
                .iter()
                .cloned()
                .map(|log| RawLog::from_rpc(log, ChainSource::L1))
                .collect()
        }))
    }

    async fn block_number(&self) -> Result<u64, TransportError> {
        self.provider().await.get_block_number().await
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        // The previous provider stays in place until the new one is connected.
        let provider = RootProvider::connect(self.url.as_str()).await?;
        *self.provider.write().await = provider;
        info!(target: "client::l1", url = %self.url, "Reconnected to L1 node");
        Ok(())
    }
}

/// An [`L2Client`] over an http alloy provider.
#[derive(Debug, Clone, derive_more::Constructor)]
pub struct AlloyL2Client {
    provider: RootProvider,
}

impl AlloyL2Client {
    /// Creates a client for the L2 node at `url`.
    pub fn new_http(url: Url) -> Self {
        Self::new(RootProvider::new_http(url))
    }
}

/// Parameters of `eth_getBlockByNumber` for `number`, without transaction bodies.
fn block_query(number: U256) -> (String, bool) {
    (format!("0x{number:x}"), false)
}

#[async_trait]
impl L2Client for AlloyL2Client {
    async fn block_header(
        &self,
        number: U256,
    ) -> Result<Option<BlockHeaderResponse>, TransportError> {
        // Raw request: the block number is arbitrary precision and the timestamp is parsed by
        // the resolver.
        self.provider.raw_request("eth_getBlockByNumber".into(), block_query(number)).await
    }

    async fn balance(&self, address: Address) -> Result<U256, TransportError> {
        self.provider.get_balance(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OUTPUT_PROPOSED, VERIFY_BATCHES_TRUSTED_AGGREGATOR};
    use alloy_rpc_client::RpcClient;
    use alloy_transport::mock::*;
    use rstest::rstest;
    use serde_json::json;

    const TX: B256 = B256::repeat_byte(0xab);

    fn mocked_provider() -> (Asserter, RootProvider) {
        let asserter = Asserter::new();
        let provider = RootProvider::new(RpcClient::mocked(asserter.clone()));
        (asserter, provider)
    }

    fn mocked_l1() -> (Asserter, AlloyL1Client) {
        let (asserter, provider) = mocked_provider();
        let url = Url::parse("ws://127.0.0.1:8546").unwrap();
        (asserter, AlloyL1Client::new(url, provider))
    }

    fn mocked_l2() -> (Asserter, AlloyL2Client) {
        let (asserter, provider) = mocked_provider();
        (asserter, AlloyL2Client::new(provider))
    }

    fn rpc_log(topics: &[B256], data: &str, log_index: u64) -> serde_json::Value {
        json!({
            "address": Address::repeat_byte(0x55),
            "topics": topics,
            "data": data,
            "blockHash": B256::repeat_byte(0x01),
            "blockNumber": "0x10",
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "logIndex": format!("0x{log_index:x}"),
            "removed": false,
        })
    }

    fn rpc_receipt(logs: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "type": "0x2",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logs": logs,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x01),
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "from": Address::repeat_byte(0xa9),
            "to": Address::repeat_byte(0x55),
            "contractAddress": null,
        })
    }

    #[rstest]
    #[case(U256::ZERO, "0x0")]
    #[case(U256::from(1_234_567), "0x12d687")]
    #[case(U256::from(u64::MAX) + U256::from(1), "0x10000000000000000")]
    fn test_block_query(#[case] number: U256, #[case] expected: &str) {
        assert_eq!(block_query(number), (expected.to_owned(), false));
    }

    #[tokio::test]
    async fn test_block_header() {
        let (asserter, l2) = mocked_l2();
        asserter.push_success(&json!({ "number": "0x2a", "timestamp": "0x6553f100" }));
        asserter.push_success(&json!({ "number": "0x2b" }));
        asserter.push_success(&serde_json::Value::Null);

        let header = l2.block_header(U256::from(42)).await.unwrap();
        assert_eq!(header, Some(BlockHeaderResponse { timestamp: Some("0x6553f100".to_owned()) }));

        let header = l2.block_header(U256::from(43)).await.unwrap();
        assert_eq!(header, Some(BlockHeaderResponse { timestamp: None }));

        assert_eq!(l2.block_header(U256::from(44)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_balance() {
        let (asserter, l2) = mocked_l2();
        asserter.push_success(&U256::from(1_000_000_000_000_000_000u128));
        asserter.push_failure_msg("header not found");

        let balance = l2.balance(Address::repeat_byte(0x42)).await.unwrap();
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
        assert!(l2.balance(Address::repeat_byte(0x42)).await.is_err());
    }

    #[tokio::test]
    async fn test_transaction_logs() {
        let (asserter, l1) = mocked_l1();
        let rollup = B256::with_last_byte(20);
        let l1_timestamp = format!("0x{}", hex_word(1_700_000_600));
        asserter.push_success(&rpc_receipt(vec![
            rpc_log(&[VERIFY_BATCHES_TRUSTED_AGGREGATOR, rollup], "0x", 0),
            rpc_log(
                &[OUTPUT_PROPOSED, B256::repeat_byte(0x0e), B256::with_last_byte(1), rollup],
                &l1_timestamp,
                1,
            ),
        ]));

        let logs = l1.transaction_logs(TX).await.unwrap().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].topics, vec![VERIFY_BATCHES_TRUSTED_AGGREGATOR, rollup]);
        assert!(logs[0].data.is_empty());
        assert_eq!(logs[1].topic(0), Some(OUTPUT_PROPOSED));
        assert_eq!(logs[1].topic(3), Some(rollup));
        assert_eq!(U256::from_be_slice(&logs[1].data), U256::from(1_700_000_600));
        assert!(logs.iter().all(|log| log.transaction_hash == Some(TX)));
        assert!(logs.iter().all(|log| log.source == ChainSource::L1));
    }

    #[tokio::test]
    async fn test_missing_receipt() {
        let (asserter, l1) = mocked_l1();
        asserter.push_success(&serde_json::Value::Null);
        assert_eq!(l1.transaction_logs(TX).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_reconnect_keeps_provider() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&"0x1406f40");

        // Nothing listens on a port that was just released.
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let l1 = AlloyL1Client::new(Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap(), provider);

        assert!(l1.reconnect().await.is_err());
        assert_eq!(l1.block_number().await.unwrap(), 21_000_000);
    }

    fn hex_word(n: u64) -> String {
        alloy_primitives::hex::encode(U256::from(n).to_be_bytes::<32>())
    }
}
