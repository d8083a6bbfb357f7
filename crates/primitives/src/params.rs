//! Static cross-chain parameters: which chain-native action names map to
//! which cross-chain event kinds, plus per-chain contract accounts.
//!
//! Loaded externally (the bootstrap owns the config file); this crate only
//! defines the shape and the lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{events::EventKind, types::ChainKind};

/// Recognized action names and contract accounts for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    /// Deposit action names. The first entry is the lock action whose memo
    /// is parsed for inlock / fee-withdrawal tags.
    pub deposit_actions: Vec<String>,
    pub withdraw_actions: Vec<String>,
    pub debt_actions: Vec<String>,
    /// Memo tag marking an inline fee-withdrawal action.
    pub withdraw_fee_action: String,
    /// HTLC contract account on the original chain.
    pub htlc_account: String,
}

impl ChainParams {
    /// The lock action whose memo carries cross-chain routing data.
    pub fn deposit_action(&self) -> Option<&str> {
        self.deposit_actions.first().map(String::as_str)
    }

    /// Action names a block-range scan should match: deposits, withdraws
    /// and debt rebalances. Fee withdrawals arrive as inline actions of the
    /// lock action and are deliberately absent here.
    pub fn scan_action_names(&self) -> Vec<String> {
        let mut names =
            Vec::with_capacity(self.deposit_actions.len() + self.withdraw_actions.len() + self.debt_actions.len());
        names.extend(self.deposit_actions.iter().cloned());
        names.extend(self.withdraw_actions.iter().cloned());
        names.extend(self.debt_actions.iter().cloned());
        names
    }

    /// Classifies an action name into an event kind.
    pub fn classify(&self, action_name: &str) -> EventKind {
        if self.deposit_actions.iter().any(|name| name == action_name) {
            EventKind::Deposit
        } else if self.withdraw_actions.iter().any(|name| name == action_name) {
            EventKind::Withdraw
        } else if self.debt_actions.iter().any(|name| name == action_name) {
            EventKind::Debt
        } else {
            EventKind::Passthrough
        }
    }
}

/// Parameters table keyed by chain kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainParams(pub HashMap<ChainKind, ChainParams>);

impl CrossChainParams {
    pub fn chain(&self, kind: ChainKind) -> Option<&ChainParams> {
        self.0.get(&kind)
    }
}
