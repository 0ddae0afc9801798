use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use kh_core::{
    Article, ArticlePage, ArticleQuery, ArticleStatus, ArticleStorage,
    DeviceTokenStorage, Error, Result,
};

#[derive(Debug, Clone)]
struct TokenRecord {
    token: String,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryStore {
    articles: Vec<Article>,
    tokens: Vec<TokenRecord>,
}

impl MemoryStore {
    fn matches(article: &Article, query: &ArticleQuery) -> bool {
        if article.title.is_empty() || article.description.is_empty() {
            return false;
        }
        if let Some(language) = query.language {
            if article.language != language {
                return false;
            }
        }
        if let Some(category) = &query.category {
            if !category.is_empty() && &article.category != category {
                return false;
            }
        }
        if let Some(search) = &query.search {
            let needle = search.to_lowercase();
            if !article.title.to_lowercase().contains(&needle)
                && !article.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Backing store for tests and credential-free local runs. Everything is
/// a Vec behind one RwLock; fine at the volumes a dev instance sees.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        }
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus> {
        let mut store = self.store.write().await;
        if store.articles.iter().any(|a| a.url == article.url) {
            return Ok(ArticleStatus::Duplicate);
        }
        store.articles.push(article.clone());
        Ok(ArticleStatus::New)
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.url == url).cloned())
    }

    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let store = self.store.read().await;
        let mut matched: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| MemoryStore::matches(a, query))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });

        let total = matched.len();
        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let pages = if total > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        let articles = matched
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(ArticlePage {
            articles,
            total,
            page,
            limit,
            pages,
        })
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| !a.title.is_empty() && !a.description.is_empty())
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(limit);
        Ok(articles)
    }

    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        audio_url: Option<&str>,
    ) -> Result<()> {
        let mut store = self.store.write().await;
        let article = store
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        article.ai_summary = Some(summary.to_string());
        article.audio_summary_url = audio_url.map(|u| u.to_string());
        article.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut store = self.store.write().await;
        let before = store.articles.len();
        store.articles.retain(|a| a.created_at >= cutoff);
        Ok((before - store.articles.len()) as u64)
    }
}

#[async_trait]
impl DeviceTokenStorage for MemoryStorage {
    async fn register_token(&self, token: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.tokens.iter_mut().find(|t| t.token == token) {
            existing.updated_at = Utc::now();
            return Ok(false);
        }
        store.tokens.push(TokenRecord {
            token: token.to_string(),
            updated_at: Utc::now(),
        });
        Ok(true)
    }

    async fn remove_token(&self, token: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        let before = store.tokens.len();
        store.tokens.retain(|t| t.token != token);
        Ok(store.tokens.len() < before)
    }

    async fn list_tokens(&self) -> Result<Vec<String>> {
        let store = self.store.read().await;
        Ok(store.tokens.iter().map(|t| t.token.clone()).collect())
    }

    async fn remove_tokens(&self, tokens: &[String]) -> Result<u64> {
        let mut store = self.store.write().await;
        let before = store.tokens.len();
        store.tokens.retain(|t| !tokens.contains(&t.token));
        Ok((before - store.tokens.len()) as u64)
    }

    async fn count_tokens(&self) -> Result<usize> {
        let store = self.store.read().await;
        Ok(store.tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kh_core::{Language, Source};

    fn article(id: &str, url: &str, language: Language, category: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            description: format!("Description {}", id),
            content: String::new(),
            url: url.to_string(),
            url_to_image: None,
            published_at: Utc::now(),
            source: Source {
                id: None,
                name: "test".to_string(),
            },
            language,
            category: category.to_string(),
            ai_summary: None,
            audio_summary_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_deduplicates_by_url() {
        let storage = MemoryStorage::new();
        let a = article("1", "http://example.com/a", Language::En, "general");
        assert_eq!(
            storage.store_article(&a).await.unwrap(),
            ArticleStatus::New
        );
        let b = article("2", "http://example.com/a", Language::En, "general");
        assert_eq!(
            storage.store_article(&b).await.unwrap(),
            ArticleStatus::Duplicate
        );
        assert_eq!(
            storage.list_articles(&ArticleQuery::default()).await.unwrap().total,
            1
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_language_and_category() {
        let storage = MemoryStorage::new();
        storage
            .store_article(&article("1", "u1", Language::En, "sports"))
            .await
            .unwrap();
        storage
            .store_article(&article("2", "u2", Language::Hi, "sports"))
            .await
            .unwrap();
        storage
            .store_article(&article("3", "u3", Language::En, "business"))
            .await
            .unwrap();

        let query = ArticleQuery {
            language: Some(Language::En),
            category: Some("sports".to_string()),
            ..Default::default()
        };
        let page = storage.list_articles(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.articles[0].id, "1");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let storage = MemoryStorage::new();
        let mut a = article("1", "u1", Language::En, "general");
        a.title = "Monsoon Update".to_string();
        storage.store_article(&a).await.unwrap();

        let query = ArticleQuery {
            search: Some("monsoon".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.list_articles(&query).await.unwrap().total, 1);

        let query = ArticleQuery {
            search: Some("cricket".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.list_articles(&query).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_pagination_math() {
        let storage = MemoryStorage::new();
        for i in 0..45 {
            storage
                .store_article(&article(
                    &i.to_string(),
                    &format!("u{}", i),
                    Language::En,
                    "general",
                ))
                .await
                .unwrap();
        }
        let query = ArticleQuery {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        let page = storage.list_articles(&query).await.unwrap();
        assert_eq!(page.total, 45);
        assert_eq!(page.pages, 3);
        assert_eq!(page.articles.len(), 5);
    }

    #[tokio::test]
    async fn test_update_summary() {
        let storage = MemoryStorage::new();
        storage
            .store_article(&article("1", "u1", Language::En, "general"))
            .await
            .unwrap();
        storage
            .update_summary("1", "the summary", Some("/static/audio/x.mp3"))
            .await
            .unwrap();
        let stored = storage.get_article("1").await.unwrap().unwrap();
        assert_eq!(stored.ai_summary.as_deref(), Some("the summary"));
        assert_eq!(
            stored.audio_summary_url.as_deref(),
            Some("/static/audio/x.mp3")
        );

        let missing = storage.update_summary("no-such", "s", None).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let storage = MemoryStorage::new();
        let mut old = article("1", "u1", Language::En, "general");
        old.created_at = Utc::now() - Duration::days(10);
        storage.store_article(&old).await.unwrap();
        storage
            .store_article(&article("2", "u2", Language::En, "general"))
            .await
            .unwrap();

        let removed = storage
            .delete_older_than(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(storage.get_article("1").await.unwrap().is_none());
        assert!(storage.get_article("2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_token_registry_is_idempotent() {
        let storage = MemoryStorage::new();
        assert!(storage.register_token("tok-1").await.unwrap());
        assert!(!storage.register_token("tok-1").await.unwrap());
        assert_eq!(storage.count_tokens().await.unwrap(), 1);

        assert!(storage.remove_token("tok-1").await.unwrap());
        assert!(!storage.remove_token("tok-1").await.unwrap());
        assert_eq!(storage.count_tokens().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_token_pruning() {
        let storage = MemoryStorage::new();
        for token in ["a", "b", "c"] {
            storage.register_token(token).await.unwrap();
        }
        let removed = storage
            .remove_tokens(&["a".to_string(), "c".to_string(), "x".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(storage.list_tokens().await.unwrap(), vec!["b".to_string()]);
    }
}
