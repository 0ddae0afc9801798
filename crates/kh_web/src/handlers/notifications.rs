use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use kh_core::{ArticleStorage, DeviceTokenStorage, Error};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub token: String,
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Json<Value>> {
    let newly_added = state.storage.register_token(&request.token).await?;
    let message = if newly_added {
        "Subscribed successfully"
    } else {
        "Token updated"
    };
    Ok(Json(json!({ "message": message, "subscribed": true })))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Json<Value>> {
    let removed = state.storage.remove_token(&request.token).await?;
    let message = if removed {
        "Unsubscribed successfully"
    } else {
        "Token not found"
    };
    Ok(Json(json!({ "message": message })))
}

pub async fn subscriber_count(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let count = state.storage.count_tokens().await?;
    Ok(Json(json!({ "subscribers": count })))
}

/// Admin sends are open in development and key-gated in production
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if !state.settings.is_production() {
        return Ok(());
    }
    let provided = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    match (&state.settings.admin_api_key, provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        _ => Err(ApiError::forbidden(
            "Forbidden: valid API key required in production",
        )),
    }
}

pub async fn send_test(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;

    let report = state
        .notifier
        .broadcast(
            "Test Notification 🔔",
            "This is a test from Khabar! Your notifications are working perfectly.",
        )
        .await?;
    Ok(Json(json!({
        "success": report.success,
        "failure": report.failure,
        "total_subscribers": report.subscribers,
        "environment": state.settings.environment,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub article_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub topic: Option<String>,
}

pub async fn send_for_article(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SendRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers)?;

    let article = state
        .storage
        .get_article(&request.article_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", request.article_id)))?;

    match (request.kind.as_str(), request.topic.as_deref()) {
        ("breaking", _) => state.notifier.send_breaking(&article).await?,
        ("topic", Some(topic)) => state.notifier.send_topic(&article, topic).await?,
        _ => return Err(ApiError::bad_request("Invalid notification type")),
    }

    Ok(Json(json!({ "success": true, "message": "Notification sent" })))
}

pub async fn topics() -> Json<Value> {
    Json(json!({
        "topics": [
            { "id": "breaking_news", "name": "Breaking News", "icon": "🚨" },
            { "id": "technology", "name": "Technology", "icon": "💻" },
            { "id": "business", "name": "Business", "icon": "💼" },
            { "id": "sports", "name": "Sports", "icon": "⚽" },
            { "id": "entertainment", "name": "Entertainment", "icon": "🎬" },
            { "id": "health", "name": "Health", "icon": "🏥" },
            { "id": "science", "name": "Science", "icon": "🔬" },
        ]
    }))
}
