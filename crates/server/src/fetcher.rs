//! HTTP implementation of [`ChainFetcher`].

use crate::api::ChainResponse;
use rmcoin_consensus::{ChainFetcher, FetchError};
use reqwest::Url;
use rmcoin_core::Block;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout for peer fetches.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches peer chains from their `/get_chain` endpoint.
#[derive(Debug, Clone)]
pub struct HttpChainFetcher {
    client: reqwest::Client,
}

impl HttpChainFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// `/get_chain` on the peer's origin, keeping its scheme.
    fn chain_url(origin: &str) -> Result<Url, FetchError> {
        Url::parse(origin)
            .and_then(|base| base.join("/get_chain"))
            .map_err(|e| FetchError::Transport(format!("bad peer address {origin:?}: {e}")))
    }
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, address: &str) -> Result<Vec<Block>, FetchError> {
        let url = Self::chain_url(address)?;
        debug!(%url, "fetching peer chain");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::InvalidResponse(format!("status {status}")));
        }

        let body: ChainResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        if body.length != body.chain.len() {
            return Err(FetchError::InvalidResponse(format!(
                "reported length {} but sent {} blocks",
                body.length,
                body.chain.len()
            )));
        }
        Ok(body.chain)
    }
}
