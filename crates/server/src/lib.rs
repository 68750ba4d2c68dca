//! HTTP node for rmcoin.
//!
//! - [`api`]: axum router exposing the node operations
//! - [`fetcher`]: reqwest-based [`rmcoin_consensus::ChainFetcher`]
//! - [`config`]: clap arguments for the `rmcoin-node` binary

pub mod api;
pub mod config;
pub mod fetcher;

pub use api::{router, ApiError, AppState};
pub use config::Args;
pub use fetcher::{HttpChainFetcher, DEFAULT_PEER_TIMEOUT};
