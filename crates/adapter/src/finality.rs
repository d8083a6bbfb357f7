//! Confirmation state machine for submitted transactions.
//!
//! A transaction is final only when it is buried under the required
//! confirmation depth AND its inclusion block is at or below the chain's
//! irreversibility watermark. Depth alone is insufficient on chains whose
//! watermark lags raw block height.

use std::{sync::Arc, time::Duration};

use storeman_bridge_chainio::{
    constants::CONFIRM_POLL_INTERVAL,
    error::{ClientError, ClientResult},
    traits::ChainClient,
    types::{TxReceipt, TxStatus},
};
use storeman_bridge_primitives::types::ChainKind;
use tracing::debug;

/// Where a transaction stands relative to finality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The chain does not know the transaction. Terminal, and not an
    /// error: callers must check for it explicitly.
    NotFound,
    /// Receipt found but depth or irreversibility not yet satisfied.
    Included {
        receipt: TxReceipt,
        head: u64,
        irreversible: u64,
    },
    /// Terminal success.
    Final {
        receipt: TxReceipt,
        status: TxStatus,
    },
}

impl Confirmation {
    pub fn is_final(&self) -> bool {
        matches!(self, Confirmation::Final { .. })
    }
}

/// Depth-and-watermark predicate, step 3 of the confirmation algorithm.
///
/// Monotone in `head` and `irreversible`: once true for a chain state
/// snapshot, it stays true for any later snapshot with equal or greater
/// heights.
pub fn is_confirmed(receipt_block: u64, head: u64, irreversible: u64, wait_blocks: u64) -> bool {
    receipt_block + wait_blocks <= head && receipt_block <= irreversible
}

/// Polls chain state until a transaction is final.
#[derive(Debug, Clone)]
pub struct FinalityTracker<C> {
    client: Arc<C>,
    chain: ChainKind,
    poll_interval: Duration,
}

impl<C: ChainClient> FinalityTracker<C> {
    pub fn new(client: Arc<C>, chain: ChainKind) -> Self {
        Self {
            client,
            chain,
            poll_interval: CONFIRM_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Re-polls until the transaction is final or unknown.
    ///
    /// The loop itself has no retry bound; blockchain finality delay is
    /// unbounded in general, so termination belongs to the enclosing
    /// bounded operation. Fetch errors propagate immediately.
    pub async fn wait_for_confirmation(
        &self,
        txid: &str,
        wait_blocks: u64,
        block_hint: Option<u64>,
    ) -> ClientResult<Confirmation> {
        loop {
            match self.poll_once(txid, wait_blocks, block_hint).await? {
                Confirmation::Included {
                    receipt,
                    head,
                    irreversible,
                } => {
                    debug!(
                        chain = %self.chain,
                        %txid,
                        block = ?receipt.block_num,
                        %head,
                        %irreversible,
                        %wait_blocks,
                        "transaction not yet confirmed, waiting to re-check"
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
                terminal => return Ok(terminal),
            }
        }
    }

    /// One evaluation of the confirmation predicate against fresh chain
    /// state: receipt, head height and irreversibility watermark.
    pub async fn poll_once(
        &self,
        txid: &str,
        wait_blocks: u64,
        block_hint: Option<u64>,
    ) -> ClientResult<Confirmation> {
        let Some(receipt) = self.client.get_transaction(txid, block_hint).await? else {
            return Ok(Confirmation::NotFound);
        };

        let info = self.client.get_info().await?;

        match receipt.block_num {
            Some(block)
                if is_confirmed(
                    block,
                    info.head_block_num,
                    info.last_irreversible_block_num,
                    wait_blocks,
                ) =>
            {
                let status = TxStatus::from_native(receipt.native_status());
                Ok(Confirmation::Final { receipt, status })
            }
            _ => Ok(Confirmation::Included {
                receipt,
                head: info.head_block_num,
                irreversible: info.last_irreversible_block_num,
            }),
        }
    }

    /// One-shot irreversibility check for callers that poll on their own
    /// schedule. Unlike the confirmation wait, an unknown transaction is
    /// an error here.
    pub async fn is_irreversible(&self, txid: &str) -> ClientResult<bool> {
        let receipt = self
            .client
            .get_transaction(txid, None)
            .await?
            .ok_or_else(|| ClientError::TxNotFound(txid.to_string()))?;

        let info = self.client.get_info().await?;

        match receipt.block_num {
            Some(block) => {
                let irreversible = block <= info.last_irreversible_block_num;
                if !irreversible {
                    debug!(
                        chain = %self.chain,
                        %txid,
                        %block,
                        watermark = %info.last_irreversible_block_num,
                        "transaction not yet irreversible"
                    );
                }
                Ok(irreversible)
            }
            None => Ok(false),
        }
    }
}
