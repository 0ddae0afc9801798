use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();
    let audio_dir = state.settings.audio_dir.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/news", get(handlers::news::list_news))
        .route("/api/news/trending", get(handlers::news::trending))
        .route("/api/news/:id", get(handlers::news::get_article))
        .route(
            "/api/news/:id/summarize",
            post(handlers::news::summarize_article),
        )
        .route(
            "/api/notifications/subscribe",
            post(handlers::notifications::subscribe),
        )
        .route(
            "/api/notifications/unsubscribe",
            post(handlers::notifications::unsubscribe),
        )
        .route(
            "/api/notifications/subscribers",
            get(handlers::notifications::subscriber_count),
        )
        .route(
            "/api/notifications/test",
            post(handlers::notifications::send_test),
        )
        .route(
            "/api/notifications/send",
            post(handlers::notifications::send_for_article),
        )
        .route(
            "/api/notifications/topics",
            get(handlers::notifications::topics),
        )
        .nest_service("/static/audio", ServeDir::new(audio_dir))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind and run the API server. Blocks until the server stops.
pub async fn serve(addr: &str, state: AppState) -> kh_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 listening on {}", addr);
    axum::serve(listener, app).await.map_err(kh_core::Error::Io)?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use kh_core::{Article, Error, Result};
}
