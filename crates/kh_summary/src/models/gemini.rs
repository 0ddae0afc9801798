use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::SummaryModel;
use crate::clean::truncate_chars;
use crate::types::{Provenance, SummaryRequest};
use kh_core::{Language, Result};

/// Endpoint variants tried in order; availability differs per key tier,
/// the first one that answers wins.
const MODEL_ENDPOINTS: [&str; 3] = [
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent",
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent",
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_EXCERPT_CHARS: usize = 3000;
/// Anything shorter than this is model filler, not a summary
const MIN_USABLE_CHARS: usize = 100;
/// The pipeline holds generative output to a higher bar than the
/// dedicated summarizer
const ACCEPT_CHARS: usize = 150;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

pub struct GeminiModel {
    client: Client,
    api_key: String,
}

impl GeminiModel {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Hindi articles get a Hindi instruction, everything else an English one.
fn build_prompt(request: &SummaryRequest, excerpt: &str) -> String {
    let combined = format!(
        "Title: {}\n\nDescription: {}\n\nContent: {}",
        request.title,
        request.description,
        truncate_chars(excerpt, MAX_EXCERPT_CHARS)
    );
    match request.language {
        Language::Hi => format!(
            "इस समाचार का 5-6 वाक्यों में पूर्ण सारांश दें:\n\n{}",
            combined
        ),
        Language::En => format!("Write a complete 5-6 sentence summary:\n\n{}", combined),
    }
}

#[async_trait]
impl SummaryModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Gemini
    }

    fn accepts(&self, _request: &SummaryRequest) -> bool {
        !self.api_key.is_empty()
    }

    fn min_chars(&self) -> usize {
        ACCEPT_CHARS
    }

    async fn try_summarize(
        &self,
        request: &SummaryRequest,
        excerpt: &str,
    ) -> Result<Option<String>> {
        let prompt = build_prompt(request, excerpt);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1500,
            },
        };

        for endpoint in MODEL_ENDPOINTS {
            let response = match self
                .client
                .post(endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!("Gemini endpoint {} unreachable: {}", endpoint, e);
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!("Gemini endpoint {} returned {}", endpoint, response.status());
                continue;
            }
            let parsed: GenerateResponse = match response.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("Gemini endpoint {} sent malformed payload: {}", endpoint, e);
                    continue;
                }
            };
            let text = parsed
                .candidates
                .first()
                .and_then(|candidate| candidate.content.parts.first())
                .map(|part| part.text.trim());
            if let Some(text) = text {
                if text.chars().count() > MIN_USABLE_CHARS {
                    return Ok(Some(text.to_string()));
                }
            }
        }
        Ok(None)
    }
}
