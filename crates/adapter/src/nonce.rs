//! Per-address transaction sequence numbers.
//!
//! Chains with strict sequential numbering reject any gap or duplicate, so
//! concurrent issuance against one account has to be serialized. One lock
//! per address gates both allocation and renewal; an allocation that
//! arrives while a renewal is in flight queues behind it instead of racing
//! ahead with a stale base value.

use std::{collections::HashMap, sync::Arc};

use storeman_bridge_chainio::{
    error::{ClientError, ClientResult},
    traits::ChainClient,
};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct NonceState {
    last_allocated: u64,
    initialized: bool,
}

/// Sequence-number source for one `(chain, address)` pair.
///
/// First use fetches the address's current nonce from the chain, counting
/// transactions still pending in the mempool; that happens exactly once
/// per process lifetime unless a renewal is requested. Allocations are
/// strictly increasing with no gaps.
#[derive(Debug, Default)]
pub struct NonceSequencer {
    state: Mutex<NonceState>,
}

impl NonceSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next safe sequence number for `address`.
    pub async fn allocate<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        address: &str,
    ) -> ClientResult<u64> {
        let mut state = self.state.lock().await;

        if !state.initialized {
            let base = client.get_pending_nonce(address).await?;
            state.last_allocated = base;
            state.initialized = true;
            debug!(%address, %base, "initialized nonce from chain, pending included");
            return Ok(base);
        }

        let next = state.last_allocated.checked_add(1).ok_or_else(|| {
            ClientError::SequencingConflict(format!("nonce overflow for {address}"))
        })?;
        state.last_allocated = next;

        Ok(next)
    }

    /// Re-runs initialization, e.g. after the chain reported a divergent
    /// nonce caused by an external transaction. Holds the same lock as
    /// [`allocate`](Self::allocate), so queued allocations observe the
    /// fresh base.
    pub async fn renew<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        address: &str,
    ) -> ClientResult<u64> {
        let mut state = self.state.lock().await;

        let base = client.get_pending_nonce(address).await?;
        state.last_allocated = base;
        state.initialized = true;
        debug!(%address, %base, "renewed nonce from chain");

        Ok(base)
    }
}

/// Process-wide registry of sequencers keyed by `(chain id, address)`.
///
/// Sequencers are created on first use and live for the process lifetime;
/// only an explicit renewal resets their state.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    sequencers: RwLock<HashMap<(String, String), Arc<NonceSequencer>>>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sequencer(&self, chain_id: &str, address: &str) -> Arc<NonceSequencer> {
        let key = (chain_id.to_string(), address.to_string());

        if let Some(sequencer) = self.sequencers.read().await.get(&key) {
            return sequencer.clone();
        }

        let mut sequencers = self.sequencers.write().await;
        sequencers.entry(key).or_default().clone()
    }
}
