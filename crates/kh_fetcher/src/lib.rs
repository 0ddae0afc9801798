use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use kh_core::{Article, ArticleStatus, ArticleStorage, Language, Result, Source, Storage};
use kh_notify::Notifier;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Free-tier rate limiting between category calls
const CALL_PAUSE: Duration = Duration::from_secs(2);
pub const RETENTION_DAYS: i64 = 7;

pub const CATEGORIES: [&str; 7] = [
    "general",
    "technology",
    "business",
    "sports",
    "entertainment",
    "health",
    "science",
];

#[derive(Debug, Deserialize)]
pub struct RawSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One article as NewsAPI sends it; everything beyond the title is
/// optional in practice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// NewsAPI's `top-headlines` serves English categories directly; Hindi
/// coverage only works through `everything` with a bilingual keyword
/// query.
fn hindi_query(category: &str) -> &'static str {
    match category {
        "technology" => "technology OR प्रौद्योगिकी",
        "business" => "business OR व्यापार",
        "sports" => "sports OR खेल",
        "entertainment" => "entertainment OR मनोरंजन",
        "health" => "health OR स्वास्थ्य",
        "science" => "science OR विज्ञान",
        _ => "भारत OR india",
    }
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint_for(&self, category: &str, language: Language) -> (String, Vec<(String, String)>) {
        match language {
            Language::Hi => {
                let yesterday = (Utc::now() - ChronoDuration::days(1))
                    .format("%Y-%m-%d")
                    .to_string();
                (
                    format!("{}/everything", self.base_url),
                    vec![
                        ("q".to_string(), hindi_query(category).to_string()),
                        ("language".to_string(), "hi".to_string()),
                        ("from".to_string(), yesterday),
                        ("sortBy".to_string(), "publishedAt".to_string()),
                    ],
                )
            }
            Language::En => (
                format!("{}/top-headlines", self.base_url),
                vec![
                    ("category".to_string(), category.to_string()),
                    ("language".to_string(), "en".to_string()),
                ],
            ),
        }
    }

    pub async fn fetch_category(
        &self,
        category: &str,
        language: Language,
    ) -> Result<Vec<RawArticle>> {
        let (endpoint, params) = self.endpoint_for(category, language);
        let response = self
            .client
            .get(&endpoint)
            .query(&params)
            .query(&[("apiKey", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(
                "NewsAPI returned {} for {}/{}",
                response.status(),
                category,
                language
            );
            return Ok(Vec::new());
        }
        let parsed: NewsApiResponse = response.json().await?;
        let articles: Vec<RawArticle> = parsed
            .articles
            .into_iter()
            .filter(|a| {
                a.title.as_deref().is_some_and(|t| !t.is_empty())
                    && a.description.as_deref().is_some_and(|d| !d.is_empty())
            })
            .collect();
        info!(
            "✅ fetched {} articles for {}/{}",
            articles.len(),
            category,
            language
        );
        Ok(articles)
    }
}

/// Convert a raw payload into a stored article. Incomplete payloads
/// (no title, description, or url) are dropped rather than stored as
/// empty cards.
pub fn to_article(raw: RawArticle, category: &str, language: Language) -> Option<Article> {
    let title = raw.title.filter(|t| !t.is_empty())?;
    let description = raw.description.filter(|d| !d.is_empty())?;
    let url = raw.url.filter(|u| !u.is_empty())?;
    let now = Utc::now();
    Some(Article {
        id: Uuid::new_v4().to_string(),
        content: raw
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| description.clone()),
        title,
        description,
        url,
        url_to_image: raw.url_to_image,
        published_at: raw.published_at.unwrap_or(now),
        source: Source {
            id: raw.source.as_ref().and_then(|s| s.id.clone()),
            name: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
        },
        language,
        category: category.to_string(),
        ai_summary: None,
        audio_summary_url: None,
        created_at: now,
        updated_at: now,
    })
}

/// Periodic ingestion: all categories in both languages, URL-deduped
/// into storage, with a broadcast when anything new landed.
pub struct IngestManager {
    api: NewsApiClient,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
}

impl IngestManager {
    pub fn new(api: NewsApiClient, storage: Arc<dyn Storage>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            storage,
            notifier,
        }
    }

    pub async fn run_cycle(&self) -> Result<usize> {
        let mut total = 0;
        for language in [Language::En, Language::Hi] {
            info!("📰 fetching {} news", language);
            for category in CATEGORIES {
                match self.api.fetch_category(category, language).await {
                    Ok(raw) => total += self.store_batch(raw, category, language).await,
                    Err(e) => warn!("fetch failed for {}/{}: {}", category, language, e),
                }
                tokio::time::sleep(CALL_PAUSE).await;
            }
        }
        info!("💾 stored {} new articles this cycle", total);

        if total > 0 {
            let title = format!("📰 {} New Articles!", total);
            let body = "Fresh news just arrived. Check out the latest updates!";
            if let Err(e) = self.notifier.broadcast(&title, body).await {
                warn!("new-content notification failed: {}", e);
            }
        }
        Ok(total)
    }

    async fn store_batch(
        &self,
        raw: Vec<RawArticle>,
        category: &str,
        language: Language,
    ) -> usize {
        let mut saved = 0;
        for entry in raw {
            let Some(article) = to_article(entry, category, language) else {
                continue;
            };
            match self.storage.store_article(&article).await {
                Ok(ArticleStatus::New) => saved += 1,
                Ok(ArticleStatus::Duplicate) => {}
                Err(e) => warn!("failed to store article {}: {}", article.url, e),
            }
        }
        saved
    }

    /// Retention pass, articles older than a week go away
    pub async fn cleanup(&self) -> Result<u64> {
        let cutoff = Utc::now() - ChronoDuration::days(RETENTION_DAYS);
        let removed = self.storage.delete_older_than(cutoff).await?;
        info!("🗑️ deleted {} old articles", removed);
        Ok(removed)
    }
}
