//! REST API for an rmcoin node.
//!
//! Every endpoint maps onto one operation of [`Blockchain`]. Mining runs on
//! the blocking pool so reads stay responsive while a proof is searched.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcoin_chain::{Blockchain, NodeError};
use rmcoin_consensus::{ChainFetcher, ValidationError};
use rmcoin_core::{Block, Hash, Transaction, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared handler state.
pub struct AppState<F> {
    pub blockchain: Arc<Blockchain>,
    pub fetcher: Arc<F>,
}

impl<F> AppState<F> {
    pub fn new(blockchain: Arc<Blockchain>, fetcher: F) -> Self {
        Self {
            blockchain,
            fetcher: Arc::new(fetcher),
        }
    }
}

// Derived Clone would require `F: Clone`.
impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            blockchain: Arc::clone(&self.blockchain),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned to API clients as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Node(
                NodeError::MalformedTransaction(_)
                | NodeError::NoPeers
                | NodeError::InvalidPeerAddress(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Node(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTransactionResponse {
    pub message: String,
    /// Block expected to include the transaction.
    pub index: u64,
    /// Position in the pool at submission time.
    pub position: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub timestamp: u64,
    pub proof: u64,
    pub previous_hash: Hash,
    pub hash: Hash,
    pub transactions: Vec<Transaction>,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        Self {
            message: "Congratulations, you just mined a block!".to_string(),
            index: block.index,
            timestamp: block.timestamp,
            proof: block.proof,
            previous_hash: block.previous_hash,
            hash: block.hash,
            transactions: block.transactions,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidResponse {
    pub message: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), ValidationError>> for ValidResponse {
    fn from(verdict: Result<(), ValidationError>) -> Self {
        match verdict {
            Ok(()) => Self {
                message: "All good. The blockchain is valid.".to_string(),
                valid: true,
                reason: None,
            },
            Err(e) => Self {
                message: "We have a problem. The blockchain is not valid.".to_string(),
                valid: false,
                reason: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub length: usize,
}

// ============================================================================
// Router
// ============================================================================

/// Build the node's router.
pub fn router<F>(state: AppState<F>) -> Router
where
    F: ChainFetcher + 'static,
{
    Router::new()
        .route("/get_chain", get(get_chain::<F>))
        .route("/get_pending", get(get_pending::<F>))
        .route("/add_transaction", post(add_transaction::<F>))
        .route("/mine_block", get(mine_block::<F>))
        .route("/connect_node", post(connect_node::<F>))
        .route("/is_valid", get(is_valid::<F>))
        .route("/replace_chain", get(replace_chain::<F>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_chain<F>(State(state): State<AppState<F>>) -> Json<ChainResponse> {
    let chain = state.blockchain.get_chain();
    Json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

async fn get_pending<F>(State(state): State<AppState<F>>) -> Json<PendingResponse> {
    let transactions = state.blockchain.pending();
    Json(PendingResponse {
        count: transactions.len(),
        transactions,
    })
}

async fn add_transaction<F>(
    State(state): State<AppState<F>>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddTransactionResponse>), ApiError> {
    let Json(request) = body?;
    let receipt = state
        .blockchain
        .add_transaction(request)
        .inspect_err(|e| warn!(error = %e, "rejected transaction"))?;

    info!(
        index = receipt.block_index,
        position = receipt.position,
        "transaction accepted"
    );
    Ok((
        StatusCode::CREATED,
        Json(AddTransactionResponse {
            message: format!("This transaction will be added to Block {}", receipt.block_index),
            index: receipt.block_index,
            position: receipt.position,
        }),
    ))
}

async fn mine_block<F>(State(state): State<AppState<F>>) -> Result<Json<MineResponse>, ApiError> {
    let blockchain = Arc::clone(&state.blockchain);
    let block = tokio::task::spawn_blocking(move || blockchain.mine_block())
        .await
        .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))?;

    Ok(Json(block.into()))
}

async fn connect_node<F>(
    State(state): State<AppState<F>>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConnectResponse>), ApiError> {
    let Json(request) = body?;
    let total_nodes = state.blockchain.connect_nodes(&request.nodes)?;

    Ok((
        StatusCode::CREATED,
        Json(ConnectResponse {
            message: "All the nodes are now connected. The node now contains the following peers:"
                .to_string(),
            total_nodes,
        }),
    ))
}

async fn is_valid<F>(State(state): State<AppState<F>>) -> Json<ValidResponse> {
    Json(state.blockchain.validate().into())
}

async fn replace_chain<F>(State(state): State<AppState<F>>) -> Json<ReplaceResponse>
where
    F: ChainFetcher,
{
    let resolution = state
        .blockchain
        .resolve_conflicts(state.fetcher.as_ref())
        .await;
    let replaced = resolution.adopted();

    let message = if replaced {
        "The nodes had different chains so the chain was replaced by the longest one."
    } else {
        "All good. The chain is the largest one."
    };
    let chain = state.blockchain.get_chain();

    Json(ReplaceResponse {
        message: message.to_string(),
        replaced,
        length: chain.len(),
        chain,
    })
}
