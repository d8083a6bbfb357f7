//! The chain-client capability consumed by the adapter layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::ClientResult,
    types::{
        BlockInfo, ChainInfo, RawActionRecord, SignedTransaction, TableRows, TableRowsParams,
        TransactionResult, TxReceipt,
    },
};

/// Raw state queries and signed-transaction submission against one node.
///
/// Implementations are opaque remote calls: no deadline, no retry, no
/// caching. The adapter layer owns all of that.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_info(&self) -> ClientResult<ChainInfo>;

    async fn get_block(&self, block_num: u64) -> ClientResult<BlockInfo>;

    /// Fetches a transaction receipt. `Ok(None)` means the chain does not
    /// know the transaction, which is a state of its own rather than an
    /// error.
    async fn get_transaction(
        &self,
        id: &str,
        block_hint: Option<u64>,
    ) -> ClientResult<Option<TxReceipt>>;

    /// Account action history, newest last.
    async fn get_actions(&self, account: &str) -> ClientResult<Vec<RawActionRecord>>;

    async fn get_table_rows(&self, params: &TableRowsParams) -> ClientResult<TableRows>;

    async fn push_signed_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> ClientResult<TransactionResult>;

    async fn get_required_keys(
        &self,
        transaction: &Value,
        available_keys: &[String],
    ) -> ClientResult<Vec<String>>;

    async fn serialize_actions(&self, actions: &[Value]) -> ClientResult<Vec<Value>>;

    /// Current nonce for `address`, counting transactions still pending in
    /// the mempool.
    async fn get_pending_nonce(&self, address: &str) -> ClientResult<u64>;
}
