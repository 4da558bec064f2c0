//! HTTP control surface. Handlers only translate between JSON and [`Node`] calls.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, ChainStore, LedgerError, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gossip;
use crate::node::Node;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    peers: usize,
}

#[derive(Serialize)]
struct Head {
    height: u64,
    hash: String,
    difficulty: u32,
}

#[derive(Deserialize)]
struct TxIn {
    from: String,
    to: String,
    amount: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MineIn {
    miner_address: String,
}

#[derive(Deserialize)]
struct PeerIn {
    address: String,
}

pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::InvalidTransaction(_)
            | LedgerError::InvalidMiner(_)
            | LedgerError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            LedgerError::MiningSuperseded | LedgerError::Rejected(_) => StatusCode::CONFLICT,
            LedgerError::Persistence(_)
            | LedgerError::CorruptStore(_)
            | LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router<S: ChainStore + 'static>(node: Arc<Node<S>>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/chain", get(chain::<S>))
        .route("/chain/head", get(head::<S>))
        .route("/pending", get(pending::<S>))
        .route("/tx", post(submit_tx::<S>))
        .route("/mine", post(mine::<S>))
        .route("/blocks", post(submit_block::<S>))
        .route("/peers", post(connect_peer::<S>))
        .with_state(node)
}

async fn health<S: ChainStore + 'static>(State(node): State<Arc<Node<S>>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        peers: node.peers().len().await,
    })
}

async fn chain<S: ChainStore + 'static>(State(node): State<Arc<Node<S>>>) -> Json<Vec<Block>> {
    Json(node.chain().await)
}

async fn head<S: ChainStore + 'static>(State(node): State<Arc<Node<S>>>) -> Json<Head> {
    let tip = node.tip().await;
    Json(Head {
        height: tip.index,
        hash: tip.hash,
        difficulty: tip.difficulty,
    })
}

async fn pending<S: ChainStore + 'static>(
    State(node): State<Arc<Node<S>>>,
) -> Json<Vec<Transaction>> {
    Json(node.pending().await)
}

async fn submit_tx<S: ChainStore + 'static>(
    State(node): State<Arc<Node<S>>>,
    Json(tx): Json<TxIn>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let tx = node.submit_transaction(&tx.from, &tx.to, tx.amount).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

async fn mine<S: ChainStore + 'static>(
    State(node): State<Arc<Node<S>>>,
    Json(req): Json<MineIn>,
) -> Result<Json<Block>, ApiError> {
    Ok(Json(node.mine(&req.miner_address).await?))
}

async fn submit_block<S: ChainStore + 'static>(
    State(node): State<Arc<Node<S>>>,
    Json(block): Json<Block>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let index = block.index;
    node.receive_block(block).await?;
    Ok(Json(json!({ "accepted": true, "index": index })))
}

async fn connect_peer<S: ChainStore + 'static>(
    State(node): State<Arc<Node<S>>>,
    Json(req): Json<PeerIn>,
) -> (StatusCode, Json<serde_json::Value>) {
    gossip::connect(req.address.clone(), node);
    (
        StatusCode::ACCEPTED,
        Json(json!({ "connecting": req.address })),
    )
}
