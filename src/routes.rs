//! HTTP routes: read the chain, append payloads, submit mined blocks.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::catalog::Movie;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::model::Block;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_blocks).post(append_block))
        .route("/blocks", post(submit_block))
        .route("/blocks/:position", get(get_block))
        .route("/validate", get(validate_chain))
        .route("/movies", post(register_movie))
        .route("/new", post(register_movie))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(err: LedgerError) -> ApiError {
    let status = match err {
        LedgerError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        LedgerError::InvalidExtension { .. } => StatusCode::CONFLICT,
        LedgerError::MiningExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::DigestMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorBody {
            error: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }),
    )
}

fn malformed(rejection: JsonRejection) -> ApiError {
    reject(LedgerError::MalformedInput(rejection.body_text()))
}

fn internal(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal",
            message: message.to_string(),
            retryable: false,
        }),
    )
}

/// GET /
pub async fn list_blocks(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.ledger.snapshot())
}

/// POST /: body is the payload itself.
pub async fn append_block(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let Json(payload) = payload.map_err(malformed)?;

    // Mining is CPU-bound; keep it off the async workers.
    let ledger = Arc::clone(&state.ledger);
    let block = tokio::task::spawn_blocking(move || ledger.append(payload))
        .await
        .map_err(|e| {
            error!("append task failed: {e}");
            internal("append task failed")
        })?
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(block)))
}

/// POST /blocks: commit a block the client mined itself.
pub async fn submit_block(
    State(state): State<AppState>,
    candidate: Result<Json<Block>, JsonRejection>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let Json(candidate) = candidate.map_err(malformed)?;

    // `submit` waits on the append lock, which a running mine holds.
    let ledger = Arc::clone(&state.ledger);
    let block = tokio::task::spawn_blocking(move || ledger.submit(candidate))
        .await
        .map_err(|e| {
            error!("submit task failed: {e}");
            internal("submit task failed")
        })?
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(block)))
}

/// GET /blocks/:position
pub async fn get_block(
    State(state): State<AppState>,
    Path(position): Path<u64>,
) -> Result<Json<Block>, ApiError> {
    state.ledger.get(position).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "not_found",
                message: format!("no block at position {position}"),
                retryable: false,
            }),
        )
    })
}

/// GET /validate: re-verify every digest and linkage; returns { ok, errors[] }
#[derive(Serialize)]
pub struct ValidateResp {
    pub ok: bool,
    pub length: usize,
    pub difficulty: u32,
    pub errors: Vec<String>,
}
pub async fn validate_chain(State(state): State<AppState>) -> Json<ValidateResp> {
    let report = state.ledger.audit();
    Json(ValidateResp {
        ok: report.is_ok(),
        length: report.length,
        difficulty: state.ledger.difficulty(),
        errors: report.errors,
    })
}

/// POST /movies (also mounted at POST /new)
pub async fn register_movie(
    movie: Result<Json<Movie>, JsonRejection>,
) -> Result<Json<Movie>, ApiError> {
    let Json(movie) = movie.map_err(malformed)?;
    Ok(Json(movie.registered()))
}

/// GET /health
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET /version
#[derive(Serialize)]
pub struct Version {
    pub version: &'static str,
    pub git_sha: Option<&'static str>,
}
pub async fn version() -> Json<Version> {
    Json(Version {
        version: env!("CARGO_PKG_VERSION"),
        git_sha: option_env!("GIT_SHA"),
    })
}
