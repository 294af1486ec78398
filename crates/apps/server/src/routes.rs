use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusStatus {
    pub status: &'static str,
    pub message: &'static str,
}

pub fn bus_status() -> BusStatus {
    BusStatus {
        status: "online",
        message: "Bus tracking API coming soon",
    }
}

pub async fn home() -> &'static str {
    "SmartBusFlow Backend Running!"
}

pub async fn bus_info() -> Json<BusStatus> {
    Json(bus_status())
}

pub async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub fn router(config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/", get(home))
        .route("/api/bus", get(bus_info))
        .route("/healthz", get(healthz));

    match &config.static_root {
        Some(root) => app.nest_service("/static", ServeDir::new(root)),
        None => app,
    }
}
