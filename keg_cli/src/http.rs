//! HTTP surface: firmware ingestion plus the status API.
//!
//! The engine is synchronous and may block on the store, so every engine
//! call runs on the blocking pool.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use keg_backends::{GaugeSnapshot, Gauges};
use keg_core::{KegError, OpeningOutput, ScaleEngine, ScaleMessage, ScaleOutput};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug)]
pub struct AppState {
    pub engine: Arc<ScaleEngine>,
    pub gauges: Arc<Gauges>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<eyre::Report> for ApiError {
    fn from(err: eyre::Report) -> Self {
        let status = match err.downcast_ref::<KegError>() {
            Some(KegError::InvalidMessage(_) | KegError::UnknownKeg(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<KegError> for ApiError {
    fn from(err: KegError) -> Self {
        eyre::Report::new(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

async fn run<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ScaleEngine) -> keg_core::Result<T> + Send + 'static,
{
    let engine = state.engine.clone();
    match tokio::task::spawn_blocking(move || f(&engine)).await {
        Ok(res) => res.map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "engine task failed");
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("engine task failed: {e}"),
            })
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/scale/push", post(push))
        .route("/api/scale/status", get(status))
        .route("/api/scale/opening", get(opening))
        .route("/api/scale/events", get(events))
        .route("/api/scale/active-keg", post(active_keg))
        .route("/api/scale/warehouse", post(warehouse))
        .route("/api/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Firmware endpoint; answers with the display text.
async fn push(State(state): State<Arc<AppState>>, body: String) -> Result<String, ApiError> {
    let msg = ScaleMessage::parse(&body)?;
    tracing::debug!(id = msg.id, kind = ?msg.kind, rssi = msg.rssi, "scale message");
    run(&state, move |engine| {
        engine.ping();
        engine.set_rssi(msg.rssi);
        if let Some(weight) = msg.value {
            engine.add_measurement(weight)?;
        }
        Ok(engine.get_push_response())
    })
    .await
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<ScaleOutput>, ApiError> {
    run(&state, |engine| Ok(engine.get_scale())).await.map(Json)
}

async fn opening(State(state): State<Arc<AppState>>) -> Result<Json<OpeningOutput>, ApiError> {
    run(&state, |engine| Ok(engine.get_opening())).await.map(Json)
}

async fn events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    run(&state, ScaleEngine::events).await.map(Json)
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<GaugeSnapshot> {
    Json(state.gauges.snapshot())
}

#[derive(Debug, Deserialize)]
struct KegBody {
    keg: i32,
}

async fn active_keg(
    State(state): State<Arc<AppState>>,
    Json(body): Json<KegBody>,
) -> Result<StatusCode, ApiError> {
    run(&state, move |engine| engine.set_active_keg(body.keg)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Way {
    Up,
    Down,
}

#[derive(Debug, Deserialize)]
struct WarehouseBody {
    keg: i32,
    way: Way,
}

async fn warehouse(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WarehouseBody>,
) -> Result<StatusCode, ApiError> {
    run(&state, move |engine| match body.way {
        Way::Up => engine.increase_warehouse(body.keg),
        Way::Down => engine.decrease_warehouse(body.keg),
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
