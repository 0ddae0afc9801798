use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Article, ArticlePage, ArticleQuery};
use crate::Result;

#[derive(Debug, PartialEq, Eq)]
pub enum ArticleStatus {
    New,
    Duplicate,
}

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store an article. Articles are deduplicated by URL; storing an
    /// already-known URL is a no-op reported as `Duplicate`.
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus>;

    /// Get a single article by id
    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    /// Look an article up by its canonical URL
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Paginated listing, newest first, filtered by language/category and
    /// a case-insensitive title/description search
    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage>;

    /// Most recently published articles
    async fn trending(&self, limit: usize) -> Result<Vec<Article>>;

    /// Attach a generated summary (and optional audio reference) to an
    /// article, bumping its updated timestamp
    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        audio_url: Option<&str>,
    ) -> Result<()>;

    /// Retention pass: delete articles created before the cutoff,
    /// returning how many were removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Everything a backend must provide. Blanket-implemented so concrete
/// backends only write the two component traits.
pub trait Storage: ArticleStorage + DeviceTokenStorage {}

impl<T: ArticleStorage + DeviceTokenStorage> Storage for T {}

#[async_trait]
pub trait DeviceTokenStorage: Send + Sync {
    /// Register a push token. Re-registering refreshes its timestamp and
    /// reports `false` (already known).
    async fn register_token(&self, token: &str) -> Result<bool>;

    /// Remove a token, reporting whether it was registered
    async fn remove_token(&self, token: &str) -> Result<bool>;

    /// All registered tokens
    async fn list_tokens(&self) -> Result<Vec<String>>;

    /// Bulk removal used to prune tokens the push service rejected
    async fn remove_tokens(&self, tokens: &[String]) -> Result<u64>;

    async fn count_tokens(&self) -> Result<usize>;
}
