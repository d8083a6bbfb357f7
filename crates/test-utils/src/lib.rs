//! Test doubles for exercising the adapter stack without a live node.

pub mod mock;

pub use mock::MockChainClient;
