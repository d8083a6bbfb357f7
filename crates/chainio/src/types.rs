//! Wire types exchanged with a chain client.
//!
//! These mirror the node's native response shapes; normalization into the
//! canonical event model happens in the adapter layer.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{constants::DEFAULT_TABLE_ROW_LIMIT, error::ClientError};

/// Chain tip summary as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u64,
    pub last_irreversible_block_num: u64,
}

/// Block as returned by the node, timestamp still in the chain's zone-less
/// native form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub id: String,
    pub block_num: u64,
    pub timestamp: String,
}

impl BlockInfo {
    /// Normalizes into a [`Block`] with a unix-seconds timestamp.
    pub fn normalize(self) -> Result<Block, ClientError> {
        let timestamp = parse_chain_timestamp(&self.timestamp)?;
        Ok(Block {
            id: self.id,
            block_num: self.block_num,
            timestamp,
        })
    }
}

/// Block with the timestamp normalized to unix seconds (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub block_num: u64,
    pub timestamp: i64,
}

/// Interprets a chain's zone-less block time as UTC and converts it to
/// unix seconds.
pub fn parse_chain_timestamp(raw: &str) -> Result<i64, ClientError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|err| ClientError::MalformedResponse(format!("bad block time {raw:?}: {err}")))
}

/// Receipt for a submitted transaction, replaced wholesale on each poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub id: String,
    /// Inclusion block; absent until the transaction is mined.
    pub block_num: Option<u64>,
    pub trx: TrxEnvelope,
}

impl TxReceipt {
    pub fn native_status(&self) -> &str {
        &self.trx.receipt.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrxEnvelope {
    pub receipt: ExecutionReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub status: String,
}

/// Canonical view of a chain-native execution status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The chain's success marker (`executed`).
    Success,
    /// Any other native status, passed through for the caller to interpret.
    Native(String),
}

impl TxStatus {
    pub fn from_native(status: &str) -> Self {
        if status == "executed" {
            Self::Success
        } else {
            Self::Native(status.to_string())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Success => write!(f, "0x1"),
            TxStatus::Native(status) => write!(f, "{status}"),
        }
    }
}

/// One raw unit of on-chain activity as returned by a history query.
///
/// History APIs return the action either nested inside an `action_trace`
/// wrapper or flat; both shapes deserialize transparently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawActionRecord {
    #[serde(default)]
    pub global_action_seq: Option<u64>,
    pub block_num: u64,
    /// Zone-less chain timestamp of the containing block.
    pub block_time: String,
    #[serde(flatten)]
    pub body: ActionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionBody {
    Trace { action_trace: ActionTrace },
    Flat { act: ActionEntry, trx_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrace {
    pub act: ActionEntry,
    pub trx_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// Contract/account the action executed on.
    pub account: String,
    pub name: String,
    #[serde(default)]
    pub authorization: Vec<Authorization>,
    /// Chain-specific payload fields.
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub actor: String,
    pub permission: String,
}

impl RawActionRecord {
    pub fn act(&self) -> &ActionEntry {
        match &self.body {
            ActionBody::Trace { action_trace } => &action_trace.act,
            ActionBody::Flat { act, .. } => act,
        }
    }

    pub fn trx_id(&self) -> &str {
        match &self.body {
            ActionBody::Trace { action_trace } => &action_trace.trx_id,
            ActionBody::Flat { trx_id, .. } => trx_id,
        }
    }
}

/// Contract table query, mirroring the node's `get_table_rows` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRowsParams {
    pub json: bool,
    pub code: String,
    pub scope: String,
    pub table: String,
    pub table_key: String,
    pub lower_bound: String,
    pub upper_bound: String,
    pub index_position: u32,
    pub key_type: String,
    pub limit: u32,
    pub reverse: bool,
    pub show_payer: bool,
}

impl TableRowsParams {
    pub fn new(code: &str, scope: &str, table: &str) -> Self {
        Self {
            json: true,
            code: code.to_string(),
            scope: scope.to_string(),
            table: table.to_string(),
            table_key: String::new(),
            lower_bound: String::new(),
            upper_bound: String::new(),
            index_position: 1,
            key_type: String::new(),
            limit: DEFAULT_TABLE_ROW_LIMIT,
            reverse: false,
            show_payer: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRows {
    pub rows: Vec<Value>,
    #[serde(default)]
    pub more: bool,
}

/// A fully signed transaction, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signatures: Vec<String>,
    /// Hex-encoded packed transaction payload.
    pub packed_trx: String,
}

/// Result of pushing a signed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: Value,
}
