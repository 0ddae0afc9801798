use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::Path;
use std::sync::Arc;

use kh_core::{
    Article, ArticlePage, ArticleQuery, ArticleStatus, ArticleStorage,
    DeviceTokenStorage, Error, Language, Result, Source,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        content TEXT NOT NULL,
        image_url TEXT,
        published_at TEXT NOT NULL,
        source_id TEXT,
        source_name TEXT NOT NULL,
        language TEXT NOT NULL,
        category TEXT NOT NULL,
        summary TEXT,
        audio_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS device_tokens (
        token TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to open database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("migration {} failed: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn row_to_article(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let parse_ts = |column: &str| -> Result<DateTime<Utc>> {
        let raw: String = row.get(column);
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Storage(format!("bad timestamp in {}: {}", column, e)))
    };

    Ok(Article {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        url_to_image: row.get("image_url"),
        published_at: parse_ts("published_at")?,
        source: Source {
            id: row.get("source_id"),
            name: row.get("source_name"),
        },
        language: Language::from_code(&row.get::<String, _>("language")),
        category: row.get("category"),
        ai_summary: row.get("summary"),
        audio_summary_url: row.get("audio_url"),
        created_at: parse_ts("created_at")?,
        updated_at: parse_ts("updated_at")?,
    })
}

/// Shared WHERE clause for listing and counting. Optional filters are
/// bound as NULLs so the SQL stays static.
const LIST_FILTER: &str = r#"
    title != '' AND description != ''
    AND (?1 IS NULL OR language = ?1)
    AND (?2 IS NULL OR category = ?2)
    AND (?3 IS NULL OR title LIKE '%' || ?3 || '%' OR description LIKE '%' || ?3 || '%')
"#;

#[async_trait]
impl ArticleStorage for SqliteStorage {
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (id, url, title, description, content, image_url, published_at,
             source_id, source_name, language, category, summary, audio_url,
             created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&article.id)
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(article.url_to_image.as_deref())
        .bind(article.published_at.to_rfc3339())
        .bind(article.source.id.as_deref())
        .bind(&article.source.name)
        .bind(article.language.code())
        .bind(&article.category)
        .bind(article.ai_summary.as_deref())
        .bind(article.audio_summary_url.as_deref())
        .bind(article.created_at.to_rfc3339())
        .bind(article.updated_at.to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to store article: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(ArticleStatus::Duplicate)
        } else {
            Ok(ArticleStatus::New)
        }
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to get article: {}", e)))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to look up article: {}", e)))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let language = query.language.map(|l| l.code().to_string());
        let category = query.category.clone().filter(|c| !c.is_empty());
        let search = query.search.clone().filter(|s| !s.is_empty());
        let limit = query.limit.max(1);
        let page = query.page.max(1);

        let count_sql = format!("SELECT COUNT(*) AS n FROM articles WHERE {}", LIST_FILTER);
        let total: i64 = sqlx::query(&count_sql)
            .bind(&language)
            .bind(&category)
            .bind(&search)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to count articles: {}", e)))?
            .get("n");

        let list_sql = format!(
            "SELECT * FROM articles WHERE {} ORDER BY published_at DESC, created_at DESC LIMIT ?4 OFFSET ?5",
            LIST_FILTER
        );
        let rows = sqlx::query(&list_sql)
            .bind(&language)
            .bind(&category)
            .bind(&search)
            .bind(limit as i64)
            .bind(((page - 1) * limit) as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to list articles: {}", e)))?;

        let articles = rows
            .iter()
            .map(row_to_article)
            .collect::<Result<Vec<_>>>()?;
        let total = total as usize;
        let pages = if total > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };

        Ok(ArticlePage {
            articles,
            total,
            page,
            limit,
            pages,
        })
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE title != '' AND description != ''
            ORDER BY published_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to load trending: {}", e)))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        audio_url: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE articles SET summary = ?, audio_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(summary)
        .bind(audio_url)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to update summary: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("article {}", id)));
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM articles WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to delete old articles: {}", e)))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DeviceTokenStorage for SqliteStorage {
    async fn register_token(&self, token: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let existing = sqlx::query("SELECT token FROM device_tokens WHERE token = ?")
            .bind(token)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to check token: {}", e)))?;

        if existing.is_some() {
            sqlx::query("UPDATE device_tokens SET updated_at = ? WHERE token = ?")
                .bind(&now)
                .bind(token)
                .execute(&*self.pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to refresh token: {}", e)))?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO device_tokens (token, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(&now)
            .bind(&now)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to register token: {}", e)))?;
        Ok(true)
    }

    async fn remove_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM device_tokens WHERE token = ?")
            .bind(token)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to remove token: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tokens(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT token FROM device_tokens")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to list tokens: {}", e)))?;
        Ok(rows.iter().map(|row| row.get("token")).collect())
    }

    async fn remove_tokens(&self, tokens: &[String]) -> Result<u64> {
        let mut removed = 0;
        for token in tokens {
            if self.remove_token(token).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count_tokens(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM device_tokens")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to count tokens: {}", e)))?;
        Ok(row.get::<i64, _>("n") as usize)
    }
}
