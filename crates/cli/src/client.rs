//! Blocking HTTP client for a node's REST API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use rmcoin_chain::PeerSet;
use rmcoin_server::api::{
    AddTransactionResponse, ChainResponse, ConnectRequest, ConnectResponse, ErrorResponse,
    MineResponse, PendingResponse, ReplaceResponse, ValidResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Generous enough for a proof search at the default difficulty.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client bound to one node.
pub struct NodeClient {
    base: String,
    http: Client,
}

impl NodeClient {
    /// Create a client for the node at `url` (`http://` is assumed if absent).
    pub fn new(url: &str) -> Result<Self> {
        let base = PeerSet::normalize(url).with_context(|| format!("Invalid node URL {url:?}"))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base, http })
    }

    pub fn url(&self) -> &str {
        &self.base
    }

    /// Check whether the node answers `/get_chain`.
    pub fn is_alive(&self) -> bool {
        self.http
            .get(self.endpoint("/get_chain"))
            .timeout(Duration::from_secs(5))
            .send()
            .is_ok_and(|r| r.status().is_success())
    }

    pub fn get_chain(&self) -> Result<ChainResponse> {
        self.get("/get_chain")
    }

    pub fn get_pending(&self) -> Result<PendingResponse> {
        self.get("/get_pending")
    }

    pub fn add_transaction(
        &self,
        sender: &str,
        receiver: &str,
        amount: u64,
    ) -> Result<AddTransactionResponse> {
        self.post(
            "/add_transaction",
            &json!({"sender": sender, "receiver": receiver, "amount": amount}),
        )
    }

    pub fn mine_block(&self) -> Result<MineResponse> {
        self.get("/mine_block")
    }

    pub fn connect_nodes(&self, nodes: &[String]) -> Result<ConnectResponse> {
        self.post(
            "/connect_node",
            &ConnectRequest {
                nodes: nodes.to_vec(),
            },
        )
    }

    pub fn is_valid(&self) -> Result<ValidResponse> {
        self.get("/is_valid")
    }

    pub fn replace_chain(&self) -> Result<ReplaceResponse> {
        self.get("/replace_chain")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;
        decode(&url, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;
        decode(&url, response)
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        bail!("{url} returned {status}: {message}");
    }
    response
        .json()
        .with_context(|| format!("Unexpected response from {url}"))
}
