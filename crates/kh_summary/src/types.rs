use kh_core::{Article, Language};
use serde::Serialize;
use std::fmt;

/// One summarization job. Built per invocation, never persisted.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: Option<String>,
    pub language: Language,
}

impl SummaryRequest {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            url: if article.url.is_empty() {
                None
            } else {
                Some(article.url.clone())
            },
            language: article.language,
        }
    }
}

/// Which cascade stage produced the accepted summary. Observability only;
/// callers never branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Gemini,
    Bart,
    Extractive,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Gemini => f.write_str("gemini"),
            Provenance::Bart => f.write_str("bart"),
            Provenance::Extractive => f.write_str("extractive"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryArtifact {
    pub text: String,
    pub audio_url: Option<String>,
    pub provenance: Provenance,
}
