use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use kh_core::{Article, DeviceTokenStorage, Error, Result, Settings, Storage};

const FCM_URL: &str = "https://fcm.googleapis.com/fcm/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TITLE_CHARS: usize = 100;
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Default, Serialize)]
pub struct SendReport {
    pub success: usize,
    pub failure: usize,
    pub subscribers: usize,
}

/// Push relay. Failures here never propagate into ingestion or API
/// responses; callers log the report and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to every registered device token, pruning
    /// tokens the push service rejects
    async fn broadcast(&self, title: &str, body: &str) -> Result<SendReport>;

    /// Topic send announcing an article as breaking news
    async fn send_breaking(&self, article: &Article) -> Result<()>;

    /// Topic send for a named interest topic
    async fn send_topic(&self, article: &Article, topic: &str) -> Result<()>;
}

#[derive(Serialize)]
struct FcmMessage {
    to: String,
    notification: FcmNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<FcmData>,
}

#[derive(Serialize)]
struct FcmNotification {
    title: String,
    body: String,
}

#[derive(Serialize)]
struct FcmData {
    #[serde(rename = "articleId")]
    article_id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    url: String,
}

/// FCM topic names only allow `[a-zA-Z0-9-_.~%]`; we keep it to
/// lowercase word characters.
fn sanitize_topic(topic: &str) -> String {
    topic
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

pub struct FcmNotifier {
    client: Client,
    server_key: String,
    storage: Arc<dyn Storage>,
}

impl FcmNotifier {
    pub fn new(server_key: String, storage: Arc<dyn Storage>) -> Self {
        Self {
            client: Client::new(),
            server_key,
            storage,
        }
    }

    async fn send(&self, message: &FcmMessage) -> Result<()> {
        let response = self
            .client
            .post(FCM_URL)
            .header("Authorization", format!("key={}", self.server_key))
            .json(message)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Notification(format!(
                "FCM returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn article_message(article: &Article, kind: &str, topic: Option<&str>) -> FcmMessage {
        let target = match topic {
            Some(t) => format!("/topics/{}", sanitize_topic(t)),
            None => "/topics/breaking_news".to_string(),
        };
        let title = match kind {
            "breaking" => format!("🚨 Breaking: {}", clip(&article.title, MAX_TITLE_CHARS)),
            _ => format!(
                "{}: {}",
                topic.unwrap_or_default(),
                clip(&article.title, MAX_TITLE_CHARS)
            ),
        };
        FcmMessage {
            to: target,
            notification: FcmNotification {
                title,
                body: clip(&article.description, MAX_BODY_CHARS),
            },
            data: Some(FcmData {
                article_id: article.id.clone(),
                kind: kind.to_string(),
                topic: topic.map(|t| t.to_string()),
                url: format!("/article/{}", article.id),
            }),
        }
    }
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn broadcast(&self, title: &str, body: &str) -> Result<SendReport> {
        let tokens = self.storage.list_tokens().await?;
        if tokens.is_empty() {
            debug!("no subscribers, skipping broadcast");
            return Ok(SendReport::default());
        }

        info!("📬 sending notification to {} subscribers", tokens.len());
        let mut report = SendReport {
            subscribers: tokens.len(),
            ..Default::default()
        };
        let mut invalid = Vec::new();
        for token in &tokens {
            let message = FcmMessage {
                to: token.clone(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data: None,
            };
            match self.send(&message).await {
                Ok(()) => report.success += 1,
                Err(e) => {
                    report.failure += 1;
                    invalid.push(token.clone());
                    warn!("push to token failed: {}", e);
                }
            }
        }

        if !invalid.is_empty() {
            let removed = self.storage.remove_tokens(&invalid).await?;
            info!("🗑️ removed {} invalid tokens", removed);
        }
        info!("✅ sent: {} | failed: {}", report.success, report.failure);
        Ok(report)
    }

    async fn send_breaking(&self, article: &Article) -> Result<()> {
        let message = Self::article_message(article, "breaking", None);
        self.send(&message).await
    }

    async fn send_topic(&self, article: &Article, topic: &str) -> Result<()> {
        let message = Self::article_message(article, "topic", Some(topic));
        self.send(&message).await
    }
}

/// Stand-in when no FCM key is configured. Subscriptions still register;
/// delivery is a logged no-op.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn broadcast(&self, _title: &str, _body: &str) -> Result<SendReport> {
        debug!("notifications disabled, broadcast dropped");
        Ok(SendReport::default())
    }

    async fn send_breaking(&self, _article: &Article) -> Result<()> {
        debug!("notifications disabled, breaking send dropped");
        Ok(())
    }

    async fn send_topic(&self, _article: &Article, _topic: &str) -> Result<()> {
        debug!("notifications disabled, topic send dropped");
        Ok(())
    }
}

pub fn create_notifier(settings: &Settings, storage: Arc<dyn Storage>) -> Arc<dyn Notifier> {
    match &settings.fcm_server_key {
        Some(key) => {
            info!("✅ FCM notifier initialized");
            Arc::new(FcmNotifier::new(key.clone(), storage))
        }
        None => {
            info!("⚠️ FCM server key not set, notifications disabled");
            Arc::new(NoopNotifier)
        }
    }
}
