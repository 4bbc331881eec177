use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::aggregator::{Aggregator, NewsItem};
use crate::alerts::AlertsClient;

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub alerts: AlertsClient,
}

#[derive(Serialize)]
pub struct NewsResponse {
    pub items: Vec<NewsItem>,
    pub updated: String,
    pub total: usize,
}

// Route handlers
pub async fn news(State(state): State<Arc<AppState>>) -> Json<NewsResponse> {
    let (items, updated) = state.aggregator.news().await;
    let total = items.len();

    Json(NewsResponse {
        items,
        updated: updated.to_rfc3339(),
        total,
    })
}

pub async fn alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    json_passthrough(state.alerts.current().await)
}

pub async fn alerts_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    json_passthrough(state.alerts.history().await)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "items": state.aggregator.item_count().await }))
}

// Upstream alert bodies are relayed as-is, only the content type is ours
fn json_passthrough(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}
