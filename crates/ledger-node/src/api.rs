use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ledger_core::signature::TransactionRequest;
use ledger_core::{Block, Blockchain, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::constants::TRANSACTIONS_PATH;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Blockchain>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct ChainResponse {
    pub chains: Vec<Block>,
}

#[derive(Serialize, Deserialize)]
pub struct PoolResponse {
    pub transactions: Vec<Transaction>,
    pub length: usize,
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    fn success() -> Json<Self> {
        Json(Self {
            message: "success".into(),
            error: None,
        })
    }

    fn fail(error: Option<String>) -> Json<Self> {
        Json(Self {
            message: "fail".into(),
            error,
        })
    }
}

#[derive(Deserialize)]
struct AmountQuery {
    blockchain_address: String,
}

#[derive(Serialize, Deserialize)]
pub struct AmountResponse {
    pub amount: i64,
}

type Reply = (StatusCode, Json<Message>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_chain))
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route(
            TRANSACTIONS_PATH,
            get(get_transactions)
                .post(create_transaction)
                .put(add_transaction)
                .delete(clear_transactions),
        )
        .route("/mine", get(mine))
        .route("/amount", get(amount))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_chain(State(state): State<AppState>) -> Json<ChainResponse> {
    Json(ChainResponse {
        chains: state.ledger.snapshot_chain().await,
    })
}

async fn get_transactions(State(state): State<AppState>) -> Json<PoolResponse> {
    let transactions = state.ledger.transaction_pool().await;
    Json(PoolResponse {
        length: transactions.len(),
        transactions,
    })
}

/// Wallet submission: admit and relay to peers.
async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Reply {
    admission_reply(
        state.ledger.create_transaction(&request).await,
        StatusCode::CREATED,
    )
}

/// Peer relay: admit only.
async fn add_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Reply {
    admission_reply(
        state.ledger.add_transaction_request(&request).await,
        StatusCode::OK,
    )
}

fn admission_reply(outcome: ledger_core::Result<bool>, accepted: StatusCode) -> Reply {
    match outcome {
        Ok(true) => (accepted, Message::success()),
        Ok(false) => (StatusCode::BAD_REQUEST, Message::fail(None)),
        Err(e) => {
            warn!("rejected transaction request: {e}");
            (StatusCode::BAD_REQUEST, Message::fail(Some(e.to_string())))
        }
    }
}

async fn clear_transactions(State(state): State<AppState>) -> Reply {
    state.ledger.clear_transaction_pool().await;
    (StatusCode::OK, Message::success())
}

async fn mine(State(state): State<AppState>) -> Reply {
    if state.ledger.mining().await {
        (StatusCode::OK, Message::success())
    } else {
        (StatusCode::BAD_REQUEST, Message::fail(None))
    }
}

async fn amount(
    State(state): State<AppState>,
    Query(query): Query<AmountQuery>,
) -> Json<AmountResponse> {
    Json(AmountResponse {
        amount: state.ledger.balance_of(&query.blockchain_address).await,
    })
}
