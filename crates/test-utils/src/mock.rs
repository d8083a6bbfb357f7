//! A scripted [`ChainClient`] for tests.
//!
//! State is seeded through the `set_*`/`insert_*` methods; failure
//! injection counters make the next N calls of an operation fail with a
//! network error so retry paths can be exercised deterministically.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use storeman_bridge_chainio::{
    error::{ClientError, ClientResult},
    traits::ChainClient,
    types::{
        BlockInfo, ChainInfo, RawActionRecord, SignedTransaction, TableRows, TableRowsParams,
        ExecutionReceipt, TransactionResult, TrxEnvelope, TxReceipt,
    },
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MockChainClient {
    info: RwLock<Option<ChainInfo>>,
    head_step: AtomicU64,
    irreversible_step: AtomicU64,
    info_failures: AtomicU32,
    info_calls: AtomicUsize,

    blocks: RwLock<HashMap<u64, BlockInfo>>,
    receipts: RwLock<HashMap<String, TxReceipt>>,

    actions: RwLock<Vec<RawActionRecord>>,
    actions_failures: AtomicU32,
    actions_calls: AtomicUsize,

    tables: RwLock<HashMap<(String, String, String), Vec<Value>>>,

    pending_nonces: RwLock<HashMap<String, u64>>,
    pending_nonce_failures: AtomicU32,
    pending_nonce_calls: AtomicUsize,

    submitted: RwLock<Vec<SignedTransaction>>,

    call_delay: RwLock<Option<Duration>>,
}

impl MockChainClient {
    pub async fn set_info(&self, chain_id: &str, head: u64, irreversible: u64) {
        *self.info.write().await = Some(ChainInfo {
            chain_id: chain_id.to_string(),
            head_block_num: head,
            last_irreversible_block_num: irreversible,
        });
    }

    /// Moves the chain forward after every `get_info` call, so a polling
    /// loop observes progress without the test having to interleave.
    pub fn advance_head_on_info(&self, head_step: u64, irreversible_step: u64) {
        self.head_step.store(head_step, Ordering::SeqCst);
        self.irreversible_step.store(irreversible_step, Ordering::SeqCst);
    }

    pub fn fail_next_get_info(&self, times: u32) {
        self.info_failures.store(times, Ordering::SeqCst);
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub async fn insert_block(&self, block: BlockInfo) {
        self.blocks.write().await.insert(block.block_num, block);
    }

    pub async fn insert_receipt(&self, txid: &str, block_num: Option<u64>, status: &str) {
        let receipt = TxReceipt {
            id: txid.to_string(),
            block_num,
            trx: TrxEnvelope {
                receipt: ExecutionReceipt {
                    status: status.to_string(),
                },
            },
        };
        self.receipts.write().await.insert(txid.to_string(), receipt);
    }

    pub async fn set_actions(&self, actions: Vec<RawActionRecord>) {
        *self.actions.write().await = actions;
    }

    pub fn fail_next_get_actions(&self, times: u32) {
        self.actions_failures.store(times, Ordering::SeqCst);
    }

    pub fn actions_calls(&self) -> usize {
        self.actions_calls.load(Ordering::SeqCst)
    }

    pub async fn insert_table_rows(&self, code: &str, scope: &str, table: &str, rows: Vec<Value>) {
        let key = (code.to_string(), scope.to_string(), table.to_string());
        self.tables.write().await.insert(key, rows);
    }

    pub async fn set_pending_nonce(&self, address: &str, nonce: u64) {
        self.pending_nonces.write().await.insert(address.to_string(), nonce);
    }

    pub fn fail_next_get_pending_nonce(&self, times: u32) {
        self.pending_nonce_failures.store(times, Ordering::SeqCst);
    }

    pub fn pending_nonce_calls(&self) -> usize {
        self.pending_nonce_calls.load(Ordering::SeqCst)
    }

    pub async fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.read().await.clone()
    }

    /// Delays every client call, for exercising operation deadlines.
    pub async fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.write().await = Some(delay);
    }

    async fn delay(&self) {
        let delay = *self.call_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_info(&self) -> ClientResult<ChainInfo> {
        self.delay().await;
        self.info_calls.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.info_failures) {
            return Err(ClientError::Network("injected get_info failure".to_string()));
        }

        let mut guard = self.info.write().await;
        let current = guard
            .clone()
            .ok_or_else(|| ClientError::Other("no chain info scripted".to_string()))?;

        if let Some(stored) = guard.as_mut() {
            stored.head_block_num += self.head_step.load(Ordering::SeqCst);
            stored.last_irreversible_block_num += self.irreversible_step.load(Ordering::SeqCst);
        }

        Ok(current)
    }

    async fn get_block(&self, block_num: u64) -> ClientResult<BlockInfo> {
        self.delay().await;
        self.blocks
            .read()
            .await
            .get(&block_num)
            .cloned()
            .ok_or_else(|| ClientError::Other(format!("no block scripted: {block_num}")))
    }

    async fn get_transaction(
        &self,
        id: &str,
        _block_hint: Option<u64>,
    ) -> ClientResult<Option<TxReceipt>> {
        self.delay().await;
        Ok(self.receipts.read().await.get(id).cloned())
    }

    async fn get_actions(&self, _account: &str) -> ClientResult<Vec<RawActionRecord>> {
        self.delay().await;
        self.actions_calls.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.actions_failures) {
            return Err(ClientError::Network("injected get_actions failure".to_string()));
        }

        Ok(self.actions.read().await.clone())
    }

    async fn get_table_rows(&self, params: &TableRowsParams) -> ClientResult<TableRows> {
        self.delay().await;
        let key = (params.code.clone(), params.scope.clone(), params.table.clone());
        let rows = self.tables.read().await.get(&key).cloned().unwrap_or_default();

        Ok(TableRows { rows, more: false })
    }

    async fn push_signed_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> ClientResult<TransactionResult> {
        self.delay().await;
        let mut submitted = self.submitted.write().await;
        let transaction_id = format!("mock-trx-{}", submitted.len());
        submitted.push(tx.clone());

        Ok(TransactionResult {
            transaction_id,
            processed: Value::Null,
        })
    }

    async fn get_required_keys(
        &self,
        _transaction: &Value,
        available_keys: &[String],
    ) -> ClientResult<Vec<String>> {
        self.delay().await;
        Ok(available_keys.to_vec())
    }

    async fn serialize_actions(&self, actions: &[Value]) -> ClientResult<Vec<Value>> {
        self.delay().await;
        Ok(actions.to_vec())
    }

    async fn get_pending_nonce(&self, address: &str) -> ClientResult<u64> {
        self.delay().await;
        self.pending_nonce_calls.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.pending_nonce_failures) {
            return Err(ClientError::Network(
                "injected get_pending_nonce failure".to_string(),
            ));
        }

        self.pending_nonces
            .read()
            .await
            .get(address)
            .copied()
            .ok_or_else(|| ClientError::Other(format!("no nonce scripted for {address}")))
    }
}
