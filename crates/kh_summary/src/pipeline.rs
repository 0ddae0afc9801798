use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audio::{AudioSynthesizer, GoogleTtsSynthesizer};
use crate::clean::clean;
use crate::extractive;
use crate::fetch::ContentFetcher;
use crate::models::{BartModel, GeminiModel, SummaryModel};
use crate::types::{Provenance, SummaryArtifact, SummaryRequest};
use kh_core::Settings;

/// Below this the summary is too short to be worth reading aloud
const MIN_AUDIO_CHARS: usize = 20;

/// Best-effort summarization cascade: remote models in order of
/// preference, then the local extractive fallback, then optional audio.
/// `generate` cannot fail; an unconfigured instance still produces text.
///
/// Holds no mutable state, so one pipeline serves concurrent requests.
pub struct SummaryPipeline {
    fetcher: ContentFetcher,
    models: Vec<Arc<dyn SummaryModel>>,
    synthesizer: Option<Arc<dyn AudioSynthesizer>>,
}

impl SummaryPipeline {
    pub fn new(
        models: Vec<Arc<dyn SummaryModel>>,
        synthesizer: Option<Arc<dyn AudioSynthesizer>>,
    ) -> Self {
        Self {
            fetcher: ContentFetcher::new(),
            models,
            synthesizer,
        }
    }

    /// Wire up the cascade from runtime settings: each adapter joins the
    /// chain only when its credential is present.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut models: Vec<Arc<dyn SummaryModel>> = Vec::new();
        if let Some(key) = &settings.gemini_api_key {
            models.push(Arc::new(GeminiModel::new(key.clone())));
        }
        if let Some(key) = &settings.huggingface_api_key {
            models.push(Arc::new(BartModel::new(key.clone())));
        }
        let synthesizer: Arc<dyn AudioSynthesizer> =
            Arc::new(GoogleTtsSynthesizer::new(settings.audio_dir.clone()));
        Self::new(models, Some(synthesizer))
    }

    pub async fn generate(&self, request: &SummaryRequest) -> SummaryArtifact {
        let request = SummaryRequest {
            title: clean(&request.title),
            description: clean(&request.description),
            content: clean(&request.content),
            url: request.url.clone(),
            language: request.language,
        };

        let excerpt = match request.url.as_deref() {
            Some(url) if !url.is_empty() => self.fetcher.fetch(url).await,
            _ => String::new(),
        };

        let mut accepted = None;
        for model in &self.models {
            if !model.accepts(&request) {
                debug!("{} skipped: not configured for this request", model.name());
                continue;
            }
            match model.try_summarize(&request, &excerpt).await {
                Ok(Some(text)) if text.chars().count() > model.min_chars() => {
                    info!(
                        "{} summary accepted ({} chars)",
                        model.name(),
                        text.chars().count()
                    );
                    accepted = Some((text, model.provenance()));
                    break;
                }
                Ok(Some(text)) => debug!(
                    "{} output below acceptance threshold ({} chars)",
                    model.name(),
                    text.chars().count()
                ),
                Ok(None) => debug!("{} declined", model.name()),
                Err(e) => warn!("{} failed: {}", model.name(), e),
            }
        }

        let (text, provenance) = accepted.unwrap_or_else(|| {
            debug!("falling back to extractive summary");
            (
                extractive::summarize(
                    &request.title,
                    &request.description,
                    &request.content,
                    &excerpt,
                ),
                Provenance::Extractive,
            )
        });

        let audio_url = if text.chars().count() >= MIN_AUDIO_CHARS {
            match &self.synthesizer {
                Some(synthesizer) => match synthesizer.synthesize(&text, request.language).await
                {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("audio synthesis failed: {}", e);
                        None
                    }
                },
                None => None,
            }
        } else {
            debug!(
                "summary too short for audio ({} chars)",
                text.chars().count()
            );
            None
        };

        SummaryArtifact {
            text,
            audio_url,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kh_core::{Error, Language, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum StubOutcome {
        Text(String),
        Decline,
        Fail,
    }

    struct StubModel {
        outcome: StubOutcome,
        min_chars: usize,
        provenance: Provenance,
        english_only: bool,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn returning(text: &str, min_chars: usize, provenance: Provenance) -> Self {
            Self {
                outcome: StubOutcome::Text(text.to_string()),
                min_chars,
                provenance,
                english_only: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SummaryModel for StubModel {
        fn name(&self) -> &str {
            "Stub"
        }

        fn provenance(&self) -> Provenance {
            self.provenance
        }

        fn accepts(&self, request: &SummaryRequest) -> bool {
            !self.english_only || request.language == Language::En
        }

        fn min_chars(&self) -> usize {
            self.min_chars
        }

        async fn try_summarize(
            &self,
            _request: &SummaryRequest,
            _excerpt: &str,
        ) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                StubOutcome::Text(text) => Ok(Some(text.clone())),
                StubOutcome::Decline => Ok(None),
                StubOutcome::Fail => Err(Error::Storage("stub blew up".to_string())),
            }
        }
    }

    struct StubSynthesizer {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubSynthesizer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AudioSynthesizer for StubSynthesizer {
        async fn synthesize(&self, _text: &str, _language: Language) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Synthesis("stub refused".to_string()))
            } else {
                Ok("/static/audio/stub.mp3".to_string())
            }
        }
    }

    fn request(language: Language) -> SummaryRequest {
        SummaryRequest {
            title: "Markets rally as inflation cools.".to_string(),
            description: "Stocks surged Tuesday.".to_string(),
            content: String::new(),
            url: None,
            language,
        }
    }

    #[tokio::test]
    async fn test_no_credentials_falls_back_to_extraction() {
        let pipeline = SummaryPipeline::new(vec![], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(artifact.provenance, Provenance::Extractive);
        assert!(!artifact.text.is_empty());
        assert!(artifact.audio_url.is_none());
    }

    #[tokio::test]
    async fn test_exactly_threshold_is_rejected() {
        // 150 chars: must exceed, not equal
        let text = "x".repeat(150);
        let model = Arc::new(StubModel::returning(&text, 150, Provenance::Gemini));
        let pipeline = SummaryPipeline::new(vec![model], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(artifact.provenance, Provenance::Extractive);
    }

    #[tokio::test]
    async fn test_one_past_threshold_is_accepted() {
        let text = "x".repeat(151);
        let model = Arc::new(StubModel::returning(&text, 150, Provenance::Gemini));
        let pipeline = SummaryPipeline::new(vec![model], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(artifact.provenance, Provenance::Gemini);
        assert_eq!(artifact.text.chars().count(), 151);
    }

    #[tokio::test]
    async fn test_english_only_model_never_called_for_hindi() {
        let model = Arc::new(StubModel {
            outcome: StubOutcome::Text("y".repeat(200)),
            min_chars: 100,
            provenance: Provenance::Bart,
            english_only: true,
            calls: AtomicUsize::new(0),
        });
        let pipeline = SummaryPipeline::new(vec![model.clone()], None);
        let artifact = pipeline.generate(&request(Language::Hi)).await;
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(artifact.provenance, Provenance::Extractive);
    }

    #[tokio::test]
    async fn test_failing_model_falls_through_to_next() {
        let broken = Arc::new(StubModel {
            outcome: StubOutcome::Fail,
            min_chars: 150,
            provenance: Provenance::Gemini,
            english_only: false,
            calls: AtomicUsize::new(0),
        });
        let working = Arc::new(StubModel::returning(
            &"z".repeat(151),
            100,
            Provenance::Bart,
        ));
        let pipeline = SummaryPipeline::new(vec![broken.clone(), working], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(artifact.provenance, Provenance::Bart);
    }

    #[tokio::test]
    async fn test_declining_model_falls_through() {
        let declining = Arc::new(StubModel {
            outcome: StubOutcome::Decline,
            min_chars: 150,
            provenance: Provenance::Gemini,
            english_only: false,
            calls: AtomicUsize::new(0),
        });
        let pipeline = SummaryPipeline::new(vec![declining], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(artifact.provenance, Provenance::Extractive);
    }

    #[tokio::test]
    async fn test_audio_skipped_below_twenty_chars() {
        // accepted model text of 19 chars: no synthesis attempt
        let model = Arc::new(StubModel::returning(
            &"a".repeat(19),
            10,
            Provenance::Gemini,
        ));
        let synthesizer = Arc::new(StubSynthesizer::new(false));
        let pipeline = SummaryPipeline::new(vec![model], Some(synthesizer.clone()));
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
        assert!(artifact.audio_url.is_none());
    }

    #[tokio::test]
    async fn test_audio_attempted_at_twenty_chars() {
        let model = Arc::new(StubModel::returning(
            &"a".repeat(20),
            10,
            Provenance::Gemini,
        ));
        let synthesizer = Arc::new(StubSynthesizer::new(false));
        let pipeline = SummaryPipeline::new(vec![model], Some(synthesizer.clone()));
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(artifact.audio_url.as_deref(), Some("/static/audio/stub.mp3"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_degrades_to_no_audio() {
        let model = Arc::new(StubModel::returning(
            &"a".repeat(200),
            100,
            Provenance::Gemini,
        ));
        let synthesizer = Arc::new(StubSynthesizer::new(true));
        let pipeline = SummaryPipeline::new(vec![model], Some(synthesizer));
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert!(artifact.audio_url.is_none());
        assert_eq!(artifact.text.chars().count(), 200);
    }

    #[tokio::test]
    async fn test_inputs_are_cleaned_before_fallback() {
        let dirty = SummaryRequest {
            title: "Breaking news [+120 chars]".to_string(),
            description: "More to come....".to_string(),
            content: String::new(),
            url: None,
            language: Language::En,
        };
        let pipeline = SummaryPipeline::new(vec![], None);
        let artifact = pipeline.generate(&dirty).await;
        assert!(!artifact.text.contains("[+120 chars]"));
        assert!(!artifact.text.contains("...."));
    }

    #[tokio::test]
    async fn test_unconfigured_end_to_end_scenario() {
        let pipeline = SummaryPipeline::new(vec![], None);
        let artifact = pipeline.generate(&request(Language::En)).await;
        assert_eq!(artifact.provenance, Provenance::Extractive);
        assert_eq!(
            artifact.text,
            "Markets rally as inflation cools.. Stocks surged Tuesday."
        );
    }
}
