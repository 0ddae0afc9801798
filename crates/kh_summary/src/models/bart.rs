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

const API_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_INPUT_CHARS: usize = 1000;
const ACCEPT_CHARS: usize = 100;

#[derive(Serialize)]
struct SummarizationRequest {
    inputs: String,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_length: u32,
    min_length: u32,
}

#[derive(Deserialize)]
struct SummarizationResponse {
    #[serde(default)]
    summary_text: String,
}

/// Dedicated summarization endpoint. English only: bart-large-cnn has no
/// Hindi counterpart in this setup, so the language gate must hold even
/// when the credential is configured.
pub struct BartModel {
    client: Client,
    api_key: String,
}

impl BartModel {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

impl fmt::Debug for BartModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BartModel")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl SummaryModel for BartModel {
    fn name(&self) -> &str {
        "BART"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Bart
    }

    fn accepts(&self, request: &SummaryRequest) -> bool {
        !self.api_key.is_empty() && request.language == Language::En
    }

    fn min_chars(&self) -> usize {
        ACCEPT_CHARS
    }

    async fn try_summarize(
        &self,
        request: &SummaryRequest,
        _excerpt: &str,
    ) -> Result<Option<String>> {
        let combined = format!(
            "{}. {}. {}",
            request.title, request.description, request.content
        );
        let body = SummarizationRequest {
            inputs: truncate_chars(&combined, MAX_INPUT_CHARS).to_string(),
            parameters: Parameters {
                max_length: 200,
                min_length: 100,
            },
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            debug!("BART endpoint returned {}", response.status());
            return Ok(None);
        }
        let parsed: Vec<SummarizationResponse> = response.json().await?;
        Ok(parsed
            .into_iter()
            .next()
            .map(|entry| entry.summary_text)
            .filter(|text| !text.is_empty()))
    }
}
