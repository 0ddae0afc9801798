use axum::Json;
use serde_json::{json, Value};

pub mod news;
pub mod notifications;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Khabar News Aggregation API",
        "version": env!("CARGO_PKG_VERSION"),
        "features": ["Hindi Support", "AI Summaries", "Voice Reading", "Push Notifications"],
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
