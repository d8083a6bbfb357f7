//! I/O layer for talking to a chain node: the client capability trait,
//! wire types, the error taxonomy and the bounded-operation wrapper every
//! remote call goes through.

pub mod bounded;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use bounded::*;
pub use constants::*;
