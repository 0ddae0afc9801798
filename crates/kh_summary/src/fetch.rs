use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

use crate::clean::truncate_chars;
use kh_core::Result;

/// Sites routinely refuse the default reqwest user agent, so pretend to
/// be a desktop browser.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_EXCERPT_CHARS: usize = 5000;

static NOISE_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<nav[^>]*>.*?</nav>",
    )
    .unwrap()
});

/// Best-effort enrichment: pulls the live article page and reduces it to
/// a bounded plain-text excerpt. Failures degrade to an empty excerpt,
/// never to an error, since the summarizer works without it.
pub struct ContentFetcher {
    client: Client,
}

impl Default for ContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> String {
        match self.fetch_inner(url).await {
            Ok(text) => {
                debug!("extracted {} chars from {}", text.chars().count(), url);
                text
            }
            Err(e) => {
                debug!("enrichment fetch failed for {}: {}", url, e);
                String::new()
            }
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(String::new());
        }
        let html = response.text().await?;
        Ok(strip_markup(&html))
    }
}

/// Reduce an HTML page to whitespace-collapsed text: script/style/nav
/// blocks go first (contents included), then every remaining tag. This is
/// not article extraction, page chrome text survives.
pub(crate) fn strip_markup(html: &str) -> String {
    let stripped = NOISE_BLOCKS.replace_all(html, " ");
    let document = Html::parse_document(&stripped);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_EXCERPT_CHARS).to_string()
}
