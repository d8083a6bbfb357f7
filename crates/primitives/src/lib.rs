//! Chain-agnostic primitives for the storeman bridge: the canonical
//! cross-chain event model, chain/role identifiers, the static cross-chain
//! parameters table and small codec helpers.

pub mod events;
pub mod helpers;
pub mod params;
pub mod types;
