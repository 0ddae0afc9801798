use std::path::PathBuf;

/// Runtime settings, read once from the environment at startup.
///
/// Every credential is optional: a missing key disables the feature that
/// needs it (AI summaries fall back to extraction, notifications become
/// no-ops) instead of failing startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub news_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub fcm_server_key: Option<String>,
    pub admin_api_key: Option<String>,
    pub environment: String,
    pub audio_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            news_api_key: env_opt("NEWS_API_KEY"),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            huggingface_api_key: env_opt("HUGGINGFACE_API_KEY"),
            fcm_server_key: env_opt("FCM_SERVER_KEY"),
            admin_api_key: env_opt("ADMIN_API_KEY"),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            audio_dir: std::env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static/audio")),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_api_key: None,
            gemini_api_key: None,
            huggingface_api_key: None,
            fcm_server_key: None,
            admin_api_key: None,
            environment: "development".to_string(),
            audio_dir: PathBuf::from("static/audio"),
        }
    }
}

/// Empty environment values count as unset, so `GEMINI_API_KEY=` behaves
/// the same as leaving the variable out.
fn env_opt(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
