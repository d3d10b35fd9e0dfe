//! HTTP service for readable-content extraction.
//!
//! `POST /api/parse` takes `{"url": "..."}` and answers with the extracted
//! `{"title", "content", "url"}`, or `{"error"}` with a status derived from
//! the failure. `GET /health` reports liveness.

pub mod config;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_core::{ExtractConfig, ExtractionResult, Extractor};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{AppError, ErrorBody};

/// Headroom on top of the fetch timeout before the whole request is abandoned.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Requests are abandoned a little after `fetch_timeout`.
    pub fn new(extractor: Extractor, fetch_timeout: Duration) -> Self {
        Self { extractor: Arc::new(extractor), request_timeout: fetch_timeout + REQUEST_TIMEOUT_SLACK }
    }

    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let extractor = Extractor::with_fetch_config(ExtractConfig::default(), config.fetch.clone())?;
        Ok(Self::new(extractor, Duration::from_secs(config.fetch.timeout)))
    }
}

/// Builds the router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::POST]).allow_headers([CONTENT_TYPE]);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TimeoutLayer::new(state.request_timeout));

    Router::new()
        .route("/api/parse", post(parse_handler))
        .route("/health", get(health_handler))
        .layer(middleware)
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Reads the `url` member of a request body.
///
/// Malformed JSON, a missing or null `url` and non-string values are all
/// client errors.
fn request_url(body: &[u8]) -> Result<String, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))?;

    match value.get("url") {
        None | Some(Value::Null) => Err(AppError::bad_request("URL is required")),
        Some(Value::String(url)) => Ok(url.clone()),
        Some(_) => Err(AppError::bad_request("Invalid URL format: url must be a string")),
    }
}

async fn parse_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<ExtractionResult>, AppError> {
    let url = request_url(&body)?;
    let result = state.extractor.extract(&url).await?;
    Ok(Json(result))
}
