//! API Handlers
//!
//! HTTP request handlers for each transient endpoint. Every handler takes an
//! optional `?network=true` query to address the network scope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};

use crate::config::Config;
use crate::error::{Result, TransientError};
use crate::models::{
    validate_key, DeleteAllResponse, HealthResponse, ListResponse, ListingResponse, ScopeQuery,
    SweepResponse, TransientResponse, WriteRequest, WriteResponse,
};
use crate::options::OptionStore;
use crate::transient::Transients;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Both transient scopes
    pub transients: Arc<Transients>,
}

impl AppState {
    /// Creates a new AppState around existing stores.
    pub fn new(transients: Transients) -> Self {
        Self {
            transients: Arc::new(transients),
        }
    }

    /// Creates a new AppState from configuration and a backing option store.
    pub fn from_config(config: &Config, options: Arc<dyn OptionStore>) -> Self {
        Self::new(Transients::from_config(config, options))
    }
}

/// Runs a store call on the blocking pool. Durable substrates write to disk
/// while holding their table lock, which must not stall the async workers.
async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T>
where
    F: FnOnce(&Transients) -> T + Send + 'static,
    T: Send + 'static,
{
    let transients = state.transients.clone();
    tokio::task::spawn_blocking(move || work(&transients))
        .await
        .map_err(|e| TransientError::Storage(format!("store task failed: {e}")))
}

fn checked_key(key: &str, query: ScopeQuery) -> Result<()> {
    match validate_key(key, query.scope()) {
        Some(error_msg) => Err(TransientError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for GET /transients/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<TransientResponse>> {
    checked_key(&key, query)?;
    let scope = query.scope();

    let lookup = key.clone();
    let value = run_blocking(&state, move |t| t.scope(scope).get(&lookup))
        .await?
        .ok_or_else(|| TransientError::NotFound(key.clone()))?;

    Ok(Json(TransientResponse::new(key, scope, value)))
}

/// Handler for PUT /transients/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ScopeQuery>,
    payload: std::result::Result<Json<WriteRequest>, JsonRejection>,
) -> Result<Json<WriteResponse>> {
    checked_key(&key, query)?;
    let Json(req) = payload?;
    let scope = query.scope();

    let target = key.clone();
    let written = run_blocking(&state, move |t| {
        t.scope(scope).set(&target, req.value, req.expiration)
    })
    .await?;
    if !written {
        return Err(TransientError::NotWritten(key));
    }

    Ok(Json(WriteResponse::added(key, scope)))
}

/// Handler for PATCH /transients/:key
pub async fn update_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ScopeQuery>,
    payload: std::result::Result<Json<WriteRequest>, JsonRejection>,
) -> Result<Json<WriteResponse>> {
    checked_key(&key, query)?;
    let Json(req) = payload?;
    let scope = query.scope();

    let target = key.clone();
    let written = run_blocking(&state, move |t| {
        t.scope(scope).update(&target, req.value, req.expiration)
    })
    .await?;
    if !written {
        return Err(TransientError::NotWritten(key));
    }

    Ok(Json(WriteResponse::updated(key, scope)))
}

/// Handler for DELETE /transients/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<WriteResponse>> {
    checked_key(&key, query)?;
    let scope = query.scope();

    let target = key.clone();
    if !run_blocking(&state, move |t| t.scope(scope).delete(&target)).await? {
        return Err(TransientError::NotFound(key));
    }

    Ok(Json(WriteResponse::deleted(key, scope)))
}

/// Handler for GET /transients
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ListResponse>> {
    let scope = query.scope();

    let (listing, now) = run_blocking(&state, move |t| (t.scope(scope).list(), t.now())).await?;
    let transients = listing
        .into_iter()
        .map(|listing| ListingResponse::new(listing, now))
        .collect();

    Ok(Json(ListResponse { scope, transients }))
}

/// Handler for DELETE /transients
pub async fn delete_all_handler(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<DeleteAllResponse>> {
    let scope = query.scope();
    let deleted = run_blocking(&state, move |t| t.scope(scope).delete_all()).await?;

    Ok(Json(DeleteAllResponse { scope, deleted }))
}

/// Handler for POST /sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    let report = run_blocking(&state, |t| t.sweep()).await?;
    Ok(Json(SweepResponse::from(report)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
