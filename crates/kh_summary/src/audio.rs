use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use kh_core::{Error, Language, Result};

#[async_trait]
pub trait AudioSynthesizer: Send + Sync {
    /// Convert summary text into a retrievable audio reference
    /// (a path the web layer serves). Errors are the caller's to degrade.
    async fn synthesize(&self, text: &str, language: Language) -> Result<String>;
}

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// The endpoint rejects long q parameters, so text goes over in pieces
const MAX_CHUNK_CHARS: usize = 180;

/// Speech via the Google Translate TTS endpoint. MP3 frames are
/// self-contained, so per-chunk responses concatenate into one playable
/// file.
pub struct GoogleTtsSynthesizer {
    client: Client,
    audio_dir: PathBuf,
}

impl GoogleTtsSynthesizer {
    pub fn new(audio_dir: PathBuf) -> Self {
        Self {
            client: Client::new(),
            audio_dir,
        }
    }
}

fn chunk_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl AudioSynthesizer for GoogleTtsSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<String> {
        let chunks = chunk_text(text);
        if chunks.is_empty() {
            return Err(Error::Synthesis("nothing to synthesize".to_string()));
        }

        let mut audio = Vec::new();
        for chunk in &chunks {
            let response = self
                .client
                .get(TTS_URL)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language.code()),
                    ("q", chunk.as_str()),
                ])
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Error::Synthesis(format!(
                    "TTS endpoint returned {}",
                    response.status()
                )));
            }
            audio.extend_from_slice(&response.bytes().await?);
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let filename = format!("{}.mp3", Uuid::new_v4());
        tokio::fs::write(self.audio_dir.join(&filename), &audio).await?;
        Ok(format!("/static/audio/{}", filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_respects_limit() {
        let text = "word ".repeat(200);
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
        // nothing lost in the split
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined.split_whitespace().count(), 200);
    }

    #[test]
    fn test_chunk_text_short_input() {
        assert_eq!(chunk_text("just one chunk"), vec!["just one chunk"]);
        assert!(chunk_text("   ").is_empty());
    }

    #[test]
    fn test_chunk_text_hindi() {
        let text = "यह एक लंबा हिंदी वाक्य है ".repeat(30);
        for chunk in chunk_text(&text) {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
    }
}
