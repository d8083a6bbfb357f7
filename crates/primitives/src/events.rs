//! The canonical cross-chain event envelope.
//!
//! A [`CanonicalEvent`] is the unit exchanged with the relayer: whatever a
//! chain's native action/log format looks like, the decoder flattens it
//! into this shape. Events never carry another chain's encoding; address
//! mapping between chains is the account codec's job, not ours.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::helpers::{encode_token, encode_token_with_symbol};

/// Classification of a decoded on-chain action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Deposit,
    Withdraw,
    WithdrawFee,
    Debt,
    /// Recognized by the scan filter but not one of the cross-chain kinds;
    /// forwarded with lightly normalized args.
    Passthrough,
}

/// Value locked by a deposit, kept in whichever of the two source
/// representations the record carried. No coercion between them: a
/// quantity is a symbol-suffixed decimal string, an amount is raw integer
/// units with an explicit symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LockValue {
    Quantity(String),
    Amount { amount: u64, symbol: String },
}

impl LockValue {
    /// Token identity `contract:SYMBOL` for the locking contract account.
    pub fn token_orig_account(&self, account: &str) -> Option<String> {
        match self {
            LockValue::Quantity(quantity) => encode_token(account, quantity),
            LockValue::Amount { symbol, .. } => Some(encode_token_with_symbol(account, symbol)),
        }
    }
}

impl fmt::Display for LockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockValue::Quantity(quantity) => write!(f, "{quantity}"),
            LockValue::Amount { amount, .. } => write!(f, "{amount}"),
        }
    }
}

/// Arguments of a decoded inbound lock (deposit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlockArgs {
    /// Sender of the lock on the original chain.
    pub user: String,
    /// Destination HTLC contract account.
    pub to_htlc_addr: String,
    /// Storeman group identifier, `0x`-prefixed.
    pub storeman: String,
    /// Hash commitment, `0x`-prefixed.
    pub x_hash: String,
    /// Destination-chain address, `0x`-prefixed.
    pub wan_addr: String,
    pub value: LockValue,
    /// `contract:SYMBOL` identity of the locked token.
    pub token_orig_account: String,
}

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventArgs {
    Inlock(InlockArgs),
    /// The action's payload verbatim (fee withdrawals) or lightly
    /// normalized (passthrough events).
    Raw(serde_json::Value),
}

/// A normalized on-chain event, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    /// Contract/account the action originated from.
    pub address: String,
    pub block_number: u64,
    pub transaction_hash: String,
    /// Block time as unix seconds, UTC.
    pub timestamp: i64,
    pub kind: EventKind,
    /// Chain-native action name; for fee withdrawals, the memo tag.
    pub name: String,
    pub args: EventArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_value_display_matches_source_forms() {
        let quantity = LockValue::Quantity("5.0000 EOS".to_string());
        assert_eq!(quantity.to_string(), "5.0000 EOS");

        let amount = LockValue::Amount {
            amount: 50000,
            symbol: "EOS".to_string(),
        };
        assert_eq!(amount.to_string(), "50000");
    }

    #[test]
    fn token_identity_from_either_representation() {
        let quantity = LockValue::Quantity("5.0000 EOS".to_string());
        assert_eq!(
            quantity.token_orig_account("eosio.token").as_deref(),
            Some("eosio.token:EOS")
        );

        let amount = LockValue::Amount {
            amount: 50000,
            symbol: "EOS".to_string(),
        };
        assert_eq!(
            amount.token_orig_account("eosio.token").as_deref(),
            Some("eosio.token:EOS")
        );
    }

    #[test]
    fn inlock_args_serialize_camel_case() {
        let args = InlockArgs {
            user: "alice".to_string(),
            to_htlc_addr: "htlceos".to_string(),
            storeman: "0xsmg1".to_string(),
            x_hash: "0xaa11".to_string(),
            wan_addr: "0xdead".to_string(),
            value: LockValue::Quantity("5.0000 EOS".to_string()),
            token_orig_account: "eosio.token:EOS".to_string(),
        };

        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["toHtlcAddr"], "htlceos");
        assert_eq!(json["xHash"], "0xaa11");
        assert_eq!(json["wanAddr"], "0xdead");
        assert_eq!(json["tokenOrigAccount"], "eosio.token:EOS");
        assert_eq!(json["value"], "5.0000 EOS");
    }
}
