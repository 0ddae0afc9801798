use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the platform serves. NewsAPI and the summary pipeline both
/// key off the two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// Lenient parse used where upstream data may carry anything;
    /// unknown codes fall back to English, matching how articles with
    /// no language tag are served.
    pub fn from_code(code: &str) -> Self {
        match code {
            "hi" => Language::Hi,
            _ => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: Source,
    #[serde(default)]
    pub language: Language,
    pub category: String,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub audio_summary_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the paginated article listing. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct ArticleQuery {
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub language: Option<Language>,
    pub search: Option<String>,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            category: None,
            language: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_article() -> Article {
        Article {
            id: "a1".to_string(),
            title: "Test Article".to_string(),
            description: "A description".to_string(),
            content: "Some content".to_string(),
            url: "http://example.com/a1".to_string(),
            url_to_image: None,
            published_at: Utc::now(),
            source: Source {
                id: None,
                name: "test".to_string(),
            },
            language: Language::En,
            category: "general".to_string(),
            ai_summary: None,
            audio_summary_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::En.code(), "en");
        assert_eq!(Language::Hi.code(), "hi");
        assert_eq!(Language::from_code("hi"), Language::Hi);
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code("fr"), Language::En);
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Hi).unwrap(), "\"hi\"");
        let parsed: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Language::En);
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let json = serde_json::to_value(sample_article()).unwrap();
        assert!(json.get("publishedAt").is_some());
        assert!(json.get("urlToImage").is_some());
        assert!(json.get("aiSummary").is_some());
        assert!(json.get("audioSummaryUrl").is_some());
        assert!(json.get("published_at").is_none());
    }

    #[test]
    fn test_query_defaults() {
        let query = ArticleQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert!(query.category.is_none());
    }
}
