//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rmcoin_chain::{Blockchain, BlockchainConfig};
use rmcoin_consensus::MemoryFetcher;
use rmcoin_server::api::{
    AddTransactionResponse, ChainResponse, ConnectResponse, ErrorResponse, MineResponse,
    PendingResponse, ReplaceResponse, ValidResponse,
};
use rmcoin_server::{router, AppState};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn node(node_id: &str) -> Arc<Blockchain> {
    Arc::new(Blockchain::new(BlockchainConfig {
        difficulty: 1,
        mining_reward: 1,
        node_id: node_id.to_string(),
    }))
}

fn app(blockchain: Arc<Blockchain>, fetcher: MemoryFetcher) -> Router {
    router(AppState::new(blockchain, fetcher))
}

async fn get<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post<T: DeserializeOwned>(app: &Router, uri: &str, body: Value) -> (StatusCode, T) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send<T: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, T) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_get_chain_starts_at_genesis() {
    let app = app(node("a"), MemoryFetcher::new());

    let (status, body): (_, ChainResponse) = get(&app, "/get_chain").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.length, 1);
    assert!(body.chain[0].is_genesis());
}

#[tokio::test]
async fn test_chain_json_shape() {
    let app = app(node("a"), MemoryFetcher::new());

    let (_, body): (_, Value) = get(&app, "/get_chain").await;
    let genesis = &body["chain"][0];

    assert_eq!(genesis["index"], 0);
    assert_eq!(genesis["proof"], 1);
    assert_eq!(genesis["previous_hash"], "0".repeat(64));
    assert_eq!(genesis["hash"].as_str().map(str::len), Some(64));
}

#[tokio::test]
async fn test_add_transaction_then_mine() {
    let blockchain = node("miner-a");
    let app = app(Arc::clone(&blockchain), MemoryFetcher::new());

    let (status, added): (_, AddTransactionResponse) = post(
        &app,
        "/add_transaction",
        json!({"sender": "Alice", "receiver": "Bob", "amount": 25}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added.index, 1);
    assert_eq!(added.position, 0);

    let (_, pending): (_, PendingResponse) = get(&app, "/get_pending").await;
    assert_eq!(pending.count, 1);

    let (status, mined): (_, MineResponse) = get(&app, "/mine_block").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mined.index, 1);
    assert_eq!(mined.transactions.len(), 2);
    assert_eq!(mined.transactions[0].receiver, "Bob");
    assert!(mined.transactions[1].is_reward());
    assert_eq!(mined.previous_hash, blockchain.get_chain()[0].hash);

    let (_, pending): (_, PendingResponse) = get(&app, "/get_pending").await;
    assert_eq!(pending.count, 0);
}

#[tokio::test]
async fn test_add_transaction_rejects_malformed() {
    let blockchain = node("a");
    let app = app(Arc::clone(&blockchain), MemoryFetcher::new());

    for body in [
        json!({"sender": "Alice", "receiver": "Bob"}),
        json!({"sender": "Alice", "receiver": "Bob", "amount": -1}),
        json!({"sender": "network", "receiver": "Bob", "amount": 1}),
        json!([1, 2, 3]),
    ] {
        let (status, error): (_, ErrorResponse) = post(&app, "/add_transaction", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!error.error.is_empty());
    }
    assert_eq!(blockchain.peek_count(), 0);
}

#[tokio::test]
async fn test_add_transaction_rejects_invalid_json() {
    let app = app(node("a"), MemoryFetcher::new());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/add_transaction")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _): (_, ErrorResponse) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_connect_node() {
    let app = app(node("a"), MemoryFetcher::new());

    let (status, body): (_, ConnectResponse) = post(
        &app,
        "/connect_node",
        json!({"nodes": ["http://127.0.0.1:5001", "http://127.0.0.1:5002"]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body.total_nodes,
        vec!["http://127.0.0.1:5001", "http://127.0.0.1:5002"]
    );

    let (status, _): (_, ErrorResponse) = post(&app, "/connect_node", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _): (_, ErrorResponse) =
        post(&app, "/connect_node", json!({"nodes": ["nope"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_is_valid() {
    let blockchain = node("a");
    blockchain.mine_block();
    let app = app(blockchain, MemoryFetcher::new());

    let (status, body): (_, ValidResponse) = get(&app, "/is_valid").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.valid);
    assert!(body.reason.is_none());
}

#[tokio::test]
async fn test_replace_chain_adopts_longer_peer_chain() {
    let remote = node("b");
    remote.mine_block();
    remote.mine_block();

    let local = node("a");
    local.connect_nodes(["127.0.0.1:5001"]).unwrap();
    let fetcher = MemoryFetcher::new().with_chain("http://127.0.0.1:5001", remote.get_chain());
    let app = app(Arc::clone(&local), fetcher);

    let (status, body): (_, ReplaceResponse) = get(&app, "/replace_chain").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.replaced);
    assert_eq!(body.length, 3);
    assert_eq!(body.chain, remote.get_chain());

    let (_, body): (_, ReplaceResponse) = get(&app, "/replace_chain").await;
    assert!(!body.replaced);
    assert_eq!(body.length, 3);
}

#[tokio::test]
async fn test_replace_chain_with_unreachable_peer() {
    let local = node("a");
    local.connect_nodes(["127.0.0.1:5009"]).unwrap();
    let app = app(Arc::clone(&local), MemoryFetcher::new());

    let (status, body): (_, ReplaceResponse) = get(&app, "/replace_chain").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.replaced);
    assert_eq!(body.length, 1);
}
