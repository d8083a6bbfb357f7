//! EOS-flavored implementation of the [`ChainAdapter`] capability.
//!
//! Composes the bounded-operation wrapper, the event decoder, the finality
//! tracker and the nonce registry over a [`ChainClient`]. Every remote leg
//! carries a per-operation timeout label so a stuck node is attributable
//! from the error message alone.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use storeman_bridge_chainio::{
    bounded::{bounded, bounded_detached, TimeoutSpec},
    constants::{CONFIRM_POLL_INTERVAL, DEFAULT_OP_TIMEOUT},
    error::{ClientError, ClientResult},
    traits::ChainClient,
    types::{
        Block, RawActionRecord, SignedTransaction, TableRowsParams, TransactionResult, TxReceipt,
    },
};
use storeman_bridge_primitives::{
    events::CanonicalEvent,
    helpers::encode_token,
    params::ChainParams,
    types::{ChainKind, Role},
};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::{
    decoder::decode_actions,
    finality::{Confirmation, FinalityTracker},
    nonce::NonceRegistry,
    traits::ChainAdapter,
};

/// One configured chain instance: its kind, endpoint and the lazily
/// discovered chain identifier. Owned exclusively by one adapter.
#[derive(Debug)]
pub struct ChainHandle {
    pub kind: ChainKind,
    pub node_url: String,
    /// Fetched at most once; never overwritten after the first write.
    chain_id: RwLock<Option<String>>,
}

impl ChainHandle {
    pub fn new(kind: ChainKind, node_url: impl Into<String>) -> Self {
        Self {
            kind,
            node_url: node_url.into(),
            chain_id: RwLock::new(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Deadline applied to each exposed operation.
    pub op_timeout: Duration,
    /// Backoff between confirmation polls.
    pub confirm_poll_interval: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            op_timeout: DEFAULT_OP_TIMEOUT,
            confirm_poll_interval: CONFIRM_POLL_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct EosAdapter<C> {
    handle: ChainHandle,
    client: Arc<C>,
    params: ChainParams,
    role: Role,
    config: AdapterConfig,
    finality: FinalityTracker<C>,
    nonces: Arc<NonceRegistry>,
}

impl<C> EosAdapter<C>
where
    C: ChainClient + 'static,
{
    pub fn new(
        node_url: &str,
        client: Arc<C>,
        params: ChainParams,
        role: Role,
        nonces: Arc<NonceRegistry>,
    ) -> Self {
        Self::with_config(node_url, client, params, role, nonces, AdapterConfig::default())
    }

    pub fn with_config(
        node_url: &str,
        client: Arc<C>,
        params: ChainParams,
        role: Role,
        nonces: Arc<NonceRegistry>,
        config: AdapterConfig,
    ) -> Self {
        let finality = FinalityTracker::new(client.clone(), ChainKind::Eos)
            .with_poll_interval(config.confirm_poll_interval);

        Self {
            handle: ChainHandle::new(ChainKind::Eos, node_url),
            client,
            params,
            role,
            config,
            finality,
            nonces,
        }
    }

    pub fn handle(&self) -> &ChainHandle {
        &self.handle
    }

    fn spec(&self, op: &str) -> TimeoutSpec {
        TimeoutSpec::new(
            self.config.op_timeout,
            format!("ChainType: {} {op} timeout", self.handle.kind),
        )
    }
}

#[async_trait]
impl<C> ChainAdapter for EosAdapter<C>
where
    C: ChainClient + 'static,
{
    fn chain_kind(&self) -> ChainKind {
        self.handle.kind
    }

    async fn chain_id(&self) -> ClientResult<String> {
        bounded(self.spec("chain_id"), async {
            {
                let cached = self.handle.chain_id.read().await;
                if let Some(id) = cached.as_ref() {
                    return Ok(id.clone());
                }
            }

            // fetch under the write lock so concurrent callers cannot
            // trigger a second discovery
            let mut cached = self.handle.chain_id.write().await;
            if let Some(id) = cached.as_ref() {
                return Ok(id.clone());
            }

            let info = self.client.get_info().await?;
            debug!(chain = %self.handle.kind, chain_id = %info.chain_id, "discovered chain id");
            *cached = Some(info.chain_id.clone());

            Ok(info.chain_id)
        })
        .await
    }

    async fn head_height(&self) -> ClientResult<u64> {
        bounded(self.spec("head_height"), async {
            let info = self.client.get_info().await?;
            debug!(chain = %self.handle.kind, head = %info.head_block_num, "fetched head height");
            Ok(info.head_block_num)
        })
        .await
    }

    async fn irreversible_height(&self) -> ClientResult<u64> {
        bounded(self.spec("irreversible_height"), async {
            let info = self.client.get_info().await?;
            debug!(
                chain = %self.handle.kind,
                irreversible = %info.last_irreversible_block_num,
                "fetched irreversible height"
            );
            Ok(info.last_irreversible_block_num)
        })
        .await
    }

    async fn block_by_number(&self, block_num: u64) -> ClientResult<Block> {
        bounded(self.spec("get_block"), async {
            let block = self.client.get_block(block_num).await?;
            block.normalize()
        })
        .await
    }

    async fn receipt(
        &self,
        txid: &str,
        block_hint: Option<u64>,
    ) -> ClientResult<Option<TxReceipt>> {
        bounded(
            self.spec("get_transaction"),
            self.client.get_transaction(txid, block_hint),
        )
        .await
    }

    async fn wait_for_confirmation(
        &self,
        txid: &str,
        wait_blocks: u64,
        block_hint: Option<u64>,
    ) -> ClientResult<Confirmation> {
        bounded(
            self.spec("wait_for_confirmation"),
            self.finality.wait_for_confirmation(txid, wait_blocks, block_hint),
        )
        .await
    }

    async fn is_irreversible(&self, txid: &str) -> ClientResult<bool> {
        bounded(self.spec("is_irreversible"), self.finality.is_irreversible(txid)).await
    }

    async fn scan_events(
        &self,
        account: &str,
        from_block: u64,
        to_block: u64,
        filter: &[String],
        retry_times: u8,
    ) -> ClientResult<Vec<CanonicalEvent>> {
        bounded(self.spec("scan_events"), async {
            let mut attempt: u8 = 0;
            let actions = loop {
                match self.client.get_actions(account).await {
                    Ok(actions) => break actions,
                    Err(err) if attempt < retry_times => {
                        debug!(chain = %self.handle.kind, %attempt, %err, "retrying action history fetch");
                        attempt += 1;
                    }
                    Err(err) => {
                        error!(chain = %self.handle.kind, %err, "action history fetch failed");
                        return Err(err);
                    }
                }
            };

            let matched: Vec<RawActionRecord> = actions
                .into_iter()
                .filter(|record| {
                    record.block_num >= from_block
                        && record.block_num <= to_block
                        && filter.iter().any(|name| name == &record.act().name)
                })
                .collect();

            Ok(decode_actions(&self.params, self.handle.kind, self.role, &matched))
        })
        .await
    }

    async fn submit(&self, tx: SignedTransaction) -> ClientResult<TransactionResult> {
        let client = self.client.clone();

        // detached: dropping a submission mid-flight would leave even less
        // certainty than letting it finish in the background
        bounded_detached(self.spec("push_transaction"), async move {
            let result = client.push_signed_transaction(&tx).await?;
            debug!(transaction_id = %result.transaction_id, "pushed signed transaction");
            Ok(result)
        })
        .await
    }

    async fn submit_and_confirm(
        &self,
        tx: SignedTransaction,
        wait_blocks: u64,
    ) -> ClientResult<Confirmation> {
        let result = self.submit(tx).await?;

        self.wait_for_confirmation(&result.transaction_id, wait_blocks, None)
            .await
    }

    async fn required_keys(
        &self,
        transaction: &Value,
        available_keys: &[String],
    ) -> ClientResult<Vec<String>> {
        bounded(
            self.spec("required_keys"),
            self.client.get_required_keys(transaction, available_keys),
        )
        .await
    }

    async fn serialize_actions(&self, actions: &[Value]) -> ClientResult<Vec<Value>> {
        bounded(self.spec("serialize_actions"), self.client.serialize_actions(actions)).await
    }

    async fn table_rows(
        &self,
        code: &str,
        scope: &str,
        table: &str,
    ) -> ClientResult<Vec<Value>> {
        let params = TableRowsParams::new(code, scope, table);

        bounded(self.spec("table_rows"), async {
            let result = self.client.get_table_rows(&params).await?;
            Ok(result.rows)
        })
        .await
    }

    async fn storeman_fee(
        &self,
        storeman_pk: &str,
        token_orig_account: &str,
    ) -> ClientResult<Option<String>> {
        let htlc = self.params.htlc_account.clone();

        bounded(self.spec("storeman_fee"), async {
            let pks = self.table_rows(&htlc, &htlc, "pks").await?;
            let pk_id = pks.iter().find_map(|row| {
                (row.get("pk").and_then(Value::as_str) == Some(storeman_pk))
                    .then(|| row.get("id").and_then(Value::as_u64))
                    .flatten()
            });

            let Some(pk_id) = pk_id else {
                return Err(ClientError::Other(format!(
                    "storeman pk not found: {storeman_pk}"
                )));
            };

            let fees = self.table_rows(&htlc, &pk_id.to_string(), "fees").await?;
            for row in &fees {
                let (Some(account), Some(fee)) = (
                    row.get("account").and_then(Value::as_str),
                    row.get("fee").and_then(Value::as_str),
                ) else {
                    continue;
                };

                if encode_token(account, fee).as_deref() == Some(token_orig_account) {
                    return Ok(Some(fee.to_string()));
                }
            }

            Ok(None)
        })
        .await
    }

    async fn allocate_nonce(&self, address: &str) -> ClientResult<u64> {
        let chain_id = self.chain_id().await?;
        let sequencer = self.nonces.sequencer(&chain_id, address).await;

        bounded(
            self.spec("allocate_nonce"),
            sequencer.allocate(self.client.as_ref(), address),
        )
        .await
    }

    async fn renew_nonce(&self, address: &str) -> ClientResult<u64> {
        let chain_id = self.chain_id().await?;
        let sequencer = self.nonces.sequencer(&chain_id, address).await;

        bounded(
            self.spec("renew_nonce"),
            sequencer.renew(self.client.as_ref(), address),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use storeman_bridge_chainio::types::{ActionBody, ActionEntry, ActionTrace, BlockInfo};
    use storeman_bridge_primitives::events::{EventArgs, EventKind};
    use storeman_bridge_test_utils::MockChainClient;
    use tokio::time::Duration;

    use super::*;

    fn eos_params() -> ChainParams {
        ChainParams {
            deposit_actions: vec!["transfer".to_string()],
            withdraw_actions: vec!["outlock".to_string()],
            debt_actions: vec!["lockdebt".to_string()],
            withdraw_fee_action: "withdrawfee".to_string(),
            htlc_account: "htlceos".to_string(),
        }
    }

    fn adapter(client: Arc<MockChainClient>) -> EosAdapter<MockChainClient> {
        EosAdapter::new(
            "https://nodes.example:8888",
            client,
            eos_params(),
            Role::Follower,
            Arc::new(NonceRegistry::new()),
        )
    }

    fn lock_record(block_num: u64, memo: &str) -> RawActionRecord {
        RawActionRecord {
            global_action_seq: None,
            block_num,
            block_time: "2019-07-01T12:00:00.500".to_string(),
            body: ActionBody::Trace {
                action_trace: ActionTrace {
                    act: ActionEntry {
                        account: "eosio.token".to_string(),
                        name: "transfer".to_string(),
                        authorization: vec![],
                        data: json!({
                            "from": "alice",
                            "to": "htlceos",
                            "quantity": "5.0000 EOS",
                            "memo": memo,
                        }),
                    },
                    trx_id: format!("trx-{block_num}"),
                },
            },
        }
    }

    #[tokio::test]
    async fn chain_id_is_fetched_once_and_cached() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("aca376f2", 100, 90).await;
        let adapter = adapter(client.clone());

        assert_eq!(adapter.chain_id().await.unwrap(), "aca376f2");
        assert_eq!(adapter.chain_id().await.unwrap(), "aca376f2");

        assert_eq!(client.info_calls(), 1);
    }

    #[tokio::test]
    async fn head_and_irreversible_heights_come_from_chain_info() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("cid", 120, 105).await;
        let adapter = adapter(client);

        assert_eq!(adapter.head_height().await.unwrap(), 120);
        assert_eq!(adapter.irreversible_height().await.unwrap(), 105);
    }

    #[tokio::test]
    async fn block_timestamp_is_normalized_to_unix_seconds() {
        let client = Arc::new(MockChainClient::default());
        client
            .insert_block(BlockInfo {
                id: "blockid".to_string(),
                block_num: 100,
                timestamp: "2019-07-01T12:00:00.500".to_string(),
            })
            .await;
        let adapter = adapter(client);

        let block = adapter.block_by_number(100).await.unwrap();
        assert_eq!(block.timestamp, 1561982400);
    }

    #[tokio::test]
    async fn scan_decodes_matching_actions_in_range() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("cid", 200, 180).await;
        client
            .set_actions(vec![
                lock_record(90, "inlock:aa11:0xdead:smg1:reserved"), // below range
                lock_record(100, "inlock:bb22:0xbeef:smg1:reserved"),
                lock_record(110, "not a cross-chain memo"), // dropped by decoder
                lock_record(201, "inlock:cc33:0xf00d:smg1:reserved"), // above range
            ])
            .await;
        let adapter = adapter(client);

        let filter = eos_params().scan_action_names();
        let events = adapter.scan_events("htlceos", 95, 150, &filter, 0).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Deposit);
        assert_eq!(events[0].block_number, 100);
        let EventArgs::Inlock(args) = &events[0].args else {
            panic!("expected inlock args");
        };
        assert_eq!(args.x_hash, "0xbb22");
    }

    #[tokio::test]
    async fn scan_retries_the_history_fetch_within_its_budget() {
        let client = Arc::new(MockChainClient::default());
        client
            .set_actions(vec![lock_record(100, "inlock:aa11:0xdead:smg1:reserved")])
            .await;
        client.fail_next_get_actions(2);
        let adapter = adapter(client.clone());

        let filter = eos_params().scan_action_names();
        let events = adapter.scan_events("htlceos", 1, 200, &filter, 2).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(client.actions_calls(), 3);
    }

    #[tokio::test]
    async fn scan_surfaces_the_underlying_error_when_retries_run_out() {
        let client = Arc::new(MockChainClient::default());
        client.set_actions(vec![]).await;
        client.fail_next_get_actions(3);
        let adapter = adapter(client.clone());

        let filter = eos_params().scan_action_names();
        let err = adapter.scan_events("htlceos", 1, 200, &filter, 2).await.unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(client.actions_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn operations_time_out_with_a_labeled_error() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("cid", 100, 90).await;
        client.set_call_delay(Duration::from_secs(600)).await;
        let adapter = adapter(client);

        let err = adapter.head_height().await.unwrap_err();

        assert_eq!(
            err,
            ClientError::Timeout("ChainType: EOS head_height timeout".to_string())
        );
    }

    #[tokio::test]
    async fn submit_returns_the_node_result() {
        let client = Arc::new(MockChainClient::default());
        let adapter = adapter(client.clone());

        let tx = SignedTransaction {
            signatures: vec!["SIG_K1_example".to_string()],
            packed_trx: "deadbeef".to_string(),
        };
        let result = adapter.submit(tx.clone()).await.unwrap();

        assert_eq!(result.transaction_id, "mock-trx-0");
        assert_eq!(client.submitted().await, vec![tx]);
    }

    #[tokio::test]
    async fn submit_and_confirm_chains_the_two_operations() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("cid", 200, 150).await;
        // the mock numbers submissions from zero
        client.insert_receipt("mock-trx-0", Some(100), "executed").await;
        let adapter = adapter(client);

        let tx = SignedTransaction {
            signatures: vec!["SIG_K1_example".to_string()],
            packed_trx: "deadbeef".to_string(),
        };
        let confirmation = adapter.submit_and_confirm(tx, 10).await.unwrap();

        assert!(confirmation.is_final());
    }

    #[tokio::test]
    async fn storeman_fee_walks_the_pk_index_then_the_fee_table() {
        let client = Arc::new(MockChainClient::default());
        client
            .insert_table_rows(
                "htlceos",
                "htlceos",
                "pks",
                vec![
                    json!({"id": 0, "pk": "other-pk"}),
                    json!({"id": 3, "pk": "smg-pk"}),
                ],
            )
            .await;
        client
            .insert_table_rows(
                "htlceos",
                "3",
                "fees",
                vec![
                    json!({"account": "tethertether", "fee": "1.0000 USDT"}),
                    json!({"account": "eosio.token", "fee": "0.5000 EOS"}),
                ],
            )
            .await;
        let adapter = adapter(client);

        let fee = adapter.storeman_fee("smg-pk", "eosio.token:EOS").await.unwrap();
        assert_eq!(fee.as_deref(), Some("0.5000 EOS"));

        let none = adapter.storeman_fee("smg-pk", "eosio.token:WAX").await.unwrap();
        assert_eq!(none, None);

        let err = adapter.storeman_fee("ghost-pk", "eosio.token:EOS").await.unwrap_err();
        assert!(matches!(err, ClientError::Other(_)));
    }

    #[tokio::test]
    async fn nonces_are_sequenced_per_chain_and_address() {
        let client = Arc::new(MockChainClient::default());
        client.set_info("cid", 100, 90).await;
        client.set_pending_nonce("storeman", 11).await;
        let adapter = adapter(client.clone());

        assert_eq!(adapter.allocate_nonce("storeman").await.unwrap(), 11);
        assert_eq!(adapter.allocate_nonce("storeman").await.unwrap(), 12);

        client.set_pending_nonce("storeman", 40).await;
        assert_eq!(adapter.renew_nonce("storeman").await.unwrap(), 40);
        assert_eq!(adapter.allocate_nonce("storeman").await.unwrap(), 41);
    }
}
