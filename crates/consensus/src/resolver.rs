//! Longest-valid-chain resolution against peer chains.
//!
//! The local chain is replaced only by a strictly longer chain that passes
//! full validation. Ties keep the local chain, and invalid chains are never
//! merged.

use crate::pow::ProofOfWork;
use crate::validator::{ChainValidator, ValidationError};
use rmcoin_core::Block;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Errors a [`ChainFetcher`] can report for a single peer.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("peer not known")]
    UnknownPeer,
}

/// Per-peer reasons a chain was not adopted.
#[derive(Debug, Clone, Error)]
pub enum ConsensusError {
    #[error("peer {peer} unreachable: {source}")]
    PeerUnreachable { peer: String, source: FetchError },

    #[error("chain from {peer} is invalid: {source}")]
    InvalidChain {
        peer: String,
        source: ValidationError,
    },
}

impl ConsensusError {
    /// Address of the peer this error is about.
    pub fn peer(&self) -> &str {
        match self {
            Self::PeerUnreachable { peer, .. } | Self::InvalidChain { peer, .. } => peer,
        }
    }
}

/// Capability to fetch a peer's full chain.
pub trait ChainFetcher: Send + Sync {
    /// Fetch the chain currently held by the peer at `address`.
    fn fetch_chain(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<Block>, FetchError>> + Send;
}

/// In-memory fetcher serving fixed chains. Unknown peers are unreachable.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    chains: HashMap<String, Vec<Block>>,
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `chain` for `address`.
    pub fn insert(&mut self, address: impl Into<String>, chain: Vec<Block>) {
        self.chains.insert(address.into(), chain);
    }

    /// Builder form of [`MemoryFetcher::insert`].
    pub fn with_chain(mut self, address: impl Into<String>, chain: Vec<Block>) -> Self {
        self.insert(address, chain);
        self
    }
}

impl ChainFetcher for MemoryFetcher {
    async fn fetch_chain(&self, address: &str) -> Result<Vec<Block>, FetchError> {
        self.chains.get(address).cloned().ok_or(FetchError::UnknownPeer)
    }
}

/// Outcome of a resolution round.
#[derive(Debug, Default)]
pub struct Resolution {
    /// The adopted chain, if a strictly longer valid one was found.
    pub chain: Option<Vec<Block>>,
    /// Peer that supplied the adopted chain.
    pub source: Option<String>,
    /// Peers whose chains were skipped, with the reason.
    pub rejected: Vec<ConsensusError>,
}

impl Resolution {
    /// Check whether a peer chain was adopted.
    pub fn adopted(&self) -> bool {
        self.chain.is_some()
    }

    /// Record a peer that could not be reached.
    pub fn unreachable(&mut self, peer: impl Into<String>, source: FetchError) {
        self.rejected.push(ConsensusError::PeerUnreachable {
            peer: peer.into(),
            source,
        });
    }
}

/// Pick the longest valid chain among `local` and the peer chains.
///
/// Peer chains are considered in iteration order; the first chain to reach
/// a given length wins over later chains of the same length.
pub fn resolve<I>(local: &[Block], peer_chains: I, pow: &ProofOfWork) -> Resolution
where
    I: IntoIterator<Item = (String, Vec<Block>)>,
{
    let mut resolution = Resolution::default();
    let mut best_length = local.len();

    for (peer, chain) in peer_chains {
        if chain.len() <= best_length {
            debug!(%peer, length = chain.len(), best_length, "peer chain not longer");
            continue;
        }

        match ChainValidator::validate(&chain, pow) {
            Ok(()) => {
                debug!(%peer, length = chain.len(), "found longer valid chain");
                best_length = chain.len();
                resolution.chain = Some(chain);
                resolution.source = Some(peer);
            }
            Err(source) => {
                debug!(%peer, %source, "rejecting invalid peer chain");
                resolution
                    .rejected
                    .push(ConsensusError::InvalidChain { peer, source });
            }
        }
    }

    resolution
}
