//! The uniform operation set a chain exposes to the relayer.

use async_trait::async_trait;
use serde_json::Value;
use storeman_bridge_chainio::{
    error::ClientResult,
    types::{Block, SignedTransaction, TransactionResult, TxReceipt},
};
use storeman_bridge_primitives::{events::CanonicalEvent, types::ChainKind};

use crate::finality::Confirmation;

/// Uniform query/submit/confirm surface over one configured chain.
///
/// Chains with materially different finality models implement this same
/// capability; the relayer never sees past it. Every operation is bounded:
/// it resolves or fails with a labeled timeout, never hangs.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain_kind(&self) -> ChainKind;

    /// Chain identifier, fetched once and cached for the adapter's
    /// lifetime.
    async fn chain_id(&self) -> ClientResult<String>;

    async fn head_height(&self) -> ClientResult<u64>;

    /// Highest block the chain guarantees will never be reorganized away.
    async fn irreversible_height(&self) -> ClientResult<u64>;

    /// Block by number with its timestamp normalized to unix seconds.
    async fn block_by_number(&self, block_num: u64) -> ClientResult<Block>;

    async fn receipt(&self, txid: &str, block_hint: Option<u64>)
        -> ClientResult<Option<TxReceipt>>;

    /// Blocks until the transaction is buried `wait_blocks` deep and below
    /// the irreversibility watermark, the chain reports it unknown, or the
    /// operation deadline fires.
    async fn wait_for_confirmation(
        &self,
        txid: &str,
        wait_blocks: u64,
        block_hint: Option<u64>,
    ) -> ClientResult<Confirmation>;

    async fn is_irreversible(&self, txid: &str) -> ClientResult<bool>;

    /// Scans `[from_block, to_block]` for actions of `account` whose names
    /// are in `filter` and decodes them. The underlying history fetch is
    /// retried up to `retry_times` before the last error propagates;
    /// that budget is distinct from the operation deadline.
    async fn scan_events(
        &self,
        account: &str,
        from_block: u64,
        to_block: u64,
        filter: &[String],
        retry_times: u8,
    ) -> ClientResult<Vec<CanonicalEvent>>;

    /// Pushes a signed transaction. On timeout the submission keeps
    /// running remotely; the outcome is unknown, not aborted.
    async fn submit(&self, tx: SignedTransaction) -> ClientResult<TransactionResult>;

    /// [`submit`](Self::submit) followed by
    /// [`wait_for_confirmation`](Self::wait_for_confirmation) on the
    /// returned transaction id.
    async fn submit_and_confirm(
        &self,
        tx: SignedTransaction,
        wait_blocks: u64,
    ) -> ClientResult<Confirmation>;

    async fn required_keys(
        &self,
        transaction: &Value,
        available_keys: &[String],
    ) -> ClientResult<Vec<String>>;

    async fn serialize_actions(&self, actions: &[Value]) -> ClientResult<Vec<Value>>;

    /// Generic contract-state read with the chain's default query
    /// parameters.
    async fn table_rows(&self, code: &str, scope: &str, table: &str)
        -> ClientResult<Vec<Value>>;

    /// Accrued fee balance of a storeman group for one token, or `None`
    /// when no fee row matches.
    async fn storeman_fee(
        &self,
        storeman_pk: &str,
        token_orig_account: &str,
    ) -> ClientResult<Option<String>>;

    async fn allocate_nonce(&self, address: &str) -> ClientResult<u64>;

    /// Re-initializes the address's sequencer from chain state.
    async fn renew_nonce(&self, address: &str) -> ClientResult<u64>;
}
