//! HTTP routes: the JSON telemetry endpoint and the static dashboard files.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, info};

use crate::clock::Clock;
use crate::responder::{render, Report};
use crate::snapshot::SharedSnapshot;

pub struct AppState<C> {
    pub snapshot: SharedSnapshot,
    pub clock: C,
    pub static_dir: PathBuf,
}

/// Build the router for `/data`, `/` and `/style.css`.
pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/data", get(data::<C>))
        .route("/", get(index::<C>))
        .route("/style.css", get(style::<C>))
        .with_state(state)
}

pub async fn data<C: Clock>(State(state): State<Arc<AppState<C>>>) -> Json<Report> {
    let report = render(&state.snapshot.read(), state.clock.now());
    info!("Sending JSON data: {:?}", report);
    Json(report)
}

pub async fn index<C>(State(state): State<Arc<AppState<C>>>) -> Response {
    static_file(&state.static_dir, "index.html", "text/html").await
}

pub async fn style<C>(State(state): State<Arc<AppState<C>>>) -> Response {
    static_file(&state.static_dir, "style.css", "text/css").await
}

async fn static_file(dir: &std::path::Path, name: &str, content_type: &'static str) -> Response {
    match tokio::fs::read(dir.join(name)).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            debug!("{}/{}: {}", dir.display(), name, e);
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/plain")],
                "File not found",
            )
                .into_response()
        }
    }
}
