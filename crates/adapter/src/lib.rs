//! Chain adapters for the storeman bridge.
//!
//! An adapter turns one chain's client into the uniform operation set the
//! relayer drives: scan a block range for cross-chain events, submit a
//! signed transaction, wait for finality, sequence nonces. Shared logic
//! (event decoding, the confirmation state machine, nonce sequencing)
//! lives in composable helpers each adapter calls.

pub mod decoder;
pub mod eos;
pub mod finality;
pub mod nonce;
pub mod traits;

pub use eos::*;
pub use traits::*;
