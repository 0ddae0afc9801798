use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;
use kh_core::{Article, ArticlePage, ArticleQuery, ArticleStorage, Error, Language};
use kh_summary::{Provenance, SummaryRequest};

/// A stored summary shorter than this is treated as missing and
/// regenerated on the next request
const CACHE_MIN_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub language: Option<Language>,
    pub search: Option<String>,
}

pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ArticlePage>> {
    let query = ArticleQuery {
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(20).clamp(1, 100),
        category: params.category.filter(|c| !c.is_empty()),
        language: params.language,
        search: params.search.filter(|s| !s.is_empty()),
    };
    Ok(Json(state.storage.list_articles(&query).await?))
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub limit: Option<usize>,
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> ApiResult<Json<Vec<Article>>> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    Ok(Json(state.storage.trending(limit).await?))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    let article = state
        .storage
        .get_article(&id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
    Ok(Json(article))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResponse {
    pub summary: String,
    pub audio_url: Option<String>,
    pub cached: bool,
    pub provenance: Option<Provenance>,
}

pub async fn summarize_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SummarizeResponse>> {
    let article = state
        .storage
        .get_article(&id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;

    // idempotency short-circuit: a good stored summary skips the
    // pipeline entirely
    if let Some(existing) = &article.ai_summary {
        if existing.chars().count() > CACHE_MIN_CHARS {
            return Ok(Json(SummarizeResponse {
                summary: existing.clone(),
                audio_url: article.audio_summary_url.clone(),
                cached: true,
                provenance: None,
            }));
        }
    }

    info!("generating summary for article {}", article.id);
    let request = SummaryRequest::from_article(&article);
    let artifact = state.pipeline.generate(&request).await;
    state
        .storage
        .update_summary(&article.id, &artifact.text, artifact.audio_url.as_deref())
        .await?;

    Ok(Json(SummarizeResponse {
        summary: artifact.text,
        audio_url: artifact.audio_url,
        cached: false,
        provenance: Some(artifact.provenance),
    }))
}
