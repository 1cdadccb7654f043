//! Read-only metrics API.
//!
//! - `GET /api/health` → `{"status":"ok"}`
//! - `GET /api/summary[?refresh=true]` → [`Summary`]
//! - `GET /api/metrics[?refresh=true]` → the aggregate snapshot
//!
//! `refresh` drops the cached snapshot before answering.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{error, info};

use super::ServerError;
use super::cache::{MetricsCache, Summary};
use crate::normalize::parse_bool;

type ApiError = (StatusCode, Json<Value>);

#[derive(Clone)]
struct ApiState {
    cache: Arc<MetricsCache>,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshParams {
    refresh: Option<String>,
}

impl RefreshParams {
    fn requested(&self) -> bool {
        self.refresh
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false)
    }
}

/// Builds the API router with CORS for `cors_origins` (`*` allows any).
///
/// # Errors
///
/// [`ServerError::InvalidOrigin`] when an origin is not a valid header value.
pub fn router(cache: Arc<MetricsCache>, cors_origins: &[String]) -> Result<Router, ServerError> {
    Ok(Router::new()
        .route("/api/health", get(health))
        .route("/api/summary", get(summary))
        .route("/api/metrics", get(metrics))
        .layer(cors_layer(cors_origins)?)
        .with_state(ApiState { cache }))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ServerError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request());

    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let values = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ServerError::InvalidOrigin {
                origin: origin.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer
        .allow_origin(AllowOrigin::list(values))
        .allow_credentials(true))
}

/// Serves the API on `addr` until the process exits.
///
/// # Errors
///
/// [`ServerError::Bind`] or [`ServerError::Serve`].
pub async fn run_api_server(
    addr: SocketAddr,
    cache: Arc<MetricsCache>,
    cors_origins: &[String],
) -> Result<(), ServerError> {
    let app = router(cache, cors_origins)?;
    let listener = super::bind(addr).await?;
    info!(%addr, "metrics API listening");
    super::serve(listener, app).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn summary(
    State(state): State<ApiState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<Summary>, ApiError> {
    if params.requested() {
        state.cache.invalidate().await;
    }
    let cached = state.cache.get().await.map_err(internal_error)?;
    Ok(Json(cached.summary.clone()))
}

async fn metrics(
    State(state): State<ApiState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<Value>, ApiError> {
    if params.requested() {
        state.cache.invalidate().await;
    }
    let cached = state.cache.get().await.map_err(internal_error)?;
    Ok(Json(cached.metrics.clone()))
}

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    error!(error = %err, "failed to load snapshot");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": err.to_string()})),
    )
}
