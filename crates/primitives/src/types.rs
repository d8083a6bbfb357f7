use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The kind of chain an adapter instance talks to.
///
/// Used to key the cross-chain parameters table and to label timeout
/// diagnostics; the uppercase form is the one that appears on the wire and
/// in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainKind {
    Eos,
    Eth,
    Wan,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKind::Eos => write!(f, "EOS"),
            ChainKind::Eth => write!(f, "ETH"),
            ChainKind::Wan => write!(f, "WAN"),
        }
    }
}

impl FromStr for ChainKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EOS" => Ok(Self::Eos),
            "ETH" => Ok(Self::Eth),
            "WAN" => Ok(Self::Wan),
            other => Err(format!("unknown chain type: {other}")),
        }
    }
}

/// Role of this process within its storeman group.
///
/// Consulted only by the fee-withdrawal decode branch: followers must not
/// emit fee-withdrawal events. Injected at construction and immutable for
/// the adapter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader)
    }
}
