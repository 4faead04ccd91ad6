use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;
use url::form_urlencoded;

use crate::engine::Monitor;
use crate::error::ApiError;
use crate::models::ProbeResult;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self { ok: true, data })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UrlRequest {
    url: Option<String>,
}

pub async fn get_data(State(monitor): State<Arc<Monitor>>) -> Json<Envelope<Vec<ProbeResult>>> {
    Envelope::ok(monitor.store.snapshot().await)
}

pub async fn get_list(State(monitor): State<Arc<Monitor>>) -> Json<Envelope<Vec<String>>> {
    Envelope::ok(monitor.store.list_targets().await)
}

pub async fn add_target(
    State(monitor): State<Arc<Monitor>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Envelope<Vec<String>>>, ApiError> {
    let raw = requested_url(&body, query)?;
    monitor.add_target(&raw).await?;
    Ok(Envelope::ok(monitor.store.list_targets().await))
}

pub async fn remove_target(
    State(monitor): State<Arc<Monitor>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<Envelope<Vec<String>>>, ApiError> {
    let raw = requested_url(&body, query)?;
    monitor.remove_target(&raw).await?;
    Ok(Envelope::ok(monitor.store.list_targets().await))
}

/// The `url` field of a JSON body, falling back to the first `?url=` query
/// parameter when the body is empty or has no such field.
fn requested_url(body: &[u8], query: Option<String>) -> Result<String, ApiError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        UrlRequest::default()
    } else {
        serde_json::from_slice::<UrlRequest>(body)?
    };

    from_body
        .url
        .or_else(|| query.as_deref().and_then(query_url))
        .filter(|url| !url.trim().is_empty())
        .ok_or(ApiError::MissingUrl)
}

fn query_url(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

pub fn create_router(monitor: Arc<Monitor>, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/data", get(get_data))
        .route("/list", get(get_list))
        .route("/add", post(add_target))
        .route("/remove", post(remove_target))
        .fallback_service(spa)
        .layer(CorsLayer::permissive())
        .with_state(monitor)
}

pub async fn start_server(port: u16, router: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API port {}", port))?;
    info!("Dashboard: http://localhost:{}", addr.port());
    axum::serve(listener, router).await.context("API server failed")?;
    Ok(())
}
