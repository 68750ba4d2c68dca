//! Registered peer addresses.

use url::Url;

/// Set of peer addresses in registration order.
///
/// Addresses are kept as origins (`scheme://host:port`); registering the
/// same peer twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSet {
    peers: Vec<String>,
}

impl PeerSet {
    /// Create an empty peer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise an address such as `https://node.example/` or
    /// `localhost:5001` to its origin, e.g. `https://node.example:443`.
    ///
    /// A missing scheme means `http`, a missing port is the scheme's
    /// default. Returns `None` for anything that is not an http(s) URL with
    /// a host and a non-zero port.
    pub fn normalize(address: &str) -> Option<String> {
        let address = address.trim();
        let url = if address.contains("://") {
            Url::parse(address)
        } else {
            Url::parse(&format!("http://{address}"))
        }
        .ok()?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return None;
        }
        let host = url.host_str().filter(|host| !host.is_empty())?;
        let port = url.port_or_known_default().filter(|&port| port != 0)?;

        Some(format!("{scheme}://{host}:{port}"))
    }

    /// Register a normalised address. Returns `false` if already known.
    pub fn insert(&mut self, address: String) -> bool {
        if self.peers.contains(&address) {
            return false;
        }
        self.peers.push(address);
        true
    }

    /// Get all peers in registration order.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
