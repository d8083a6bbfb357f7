//! Error types for chain clients and the operations built on them.

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// This is an alias for the result type returned by any chain client.
pub type ClientResult<T> = Result<T, ClientError>;

/// The error type for errors produced in this library.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientError {
    /// Deadline elapsed before the operation resolved. The outcome of the
    /// underlying work is UNKNOWN: it may still complete remotely. The
    /// payload is the operation label, e.g. `ChainType: EOS get_info
    /// timeout`.
    #[error("{0}")]
    Timeout(String),

    /// The chain does not know the transaction. A valid terminal state for
    /// confirmation waits, an error everywhere else.
    #[error("transaction not found: {0}")]
    TxNotFound(String),

    /// Network error, retry might help
    #[error("Network: {0}")]
    Network(String),

    /// Connection error, retry might help
    #[error("Could not connect: {0}")]
    Connection(String),

    /// RPC server returned an error
    #[error("RPC server returned error '{1}' (code {0})")]
    Server(i32, String),

    #[error("Error parsing rpc response: {0}")]
    Parse(String),

    /// Error decoding the response, retry might not help
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A nonce-sequencer invariant was violated. Must never occur while the
    /// per-address lock discipline holds; treated as a programming error.
    #[error("nonce sequencing conflict: {0}")]
    SequencingConflict(String),

    /// Unknown error, unlikely to be recoverable
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_tx_not_found(&self) -> bool {
        matches!(self, Self::TxNotFound(_))
    }
}

impl From<SerdeJsonError> for ClientError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Parse(format!("Could not parse {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_the_label() {
        let err = ClientError::Timeout("ChainType: EOS get_info timeout".to_string());
        assert_eq!(err.to_string(), "ChainType: EOS get_info timeout");
        assert!(err.is_timeout());
        assert!(!err.is_tx_not_found());
    }

    #[test]
    fn serde_json_errors_map_to_parse() {
        let bad: Result<u64, SerdeJsonError> = serde_json::from_str("not-json");
        let err: ClientError = bad.unwrap_err().into();
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
