use chrono::Utc;
use clap::Parser;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use kh_core::{ArticleStorage, Error, Result, Settings};
use kh_fetcher::{IngestManager, NewsApiClient, RETENTION_DAYS};
use kh_summary::{SummaryPipeline, SummaryRequest};
use kh_web::AppState;

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Accepts `6h`, `30m`, `1h15m30s`, `45` (bare seconds), `1d`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if c.is_whitespace() {
                continue;
            } else {
                let num: u64 = current_number
                    .parse()
                    .map_err(|_| format!("expected a number before '{}'", c))?;
                current_number.clear();
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    'd' => total_seconds += num * 86400,
                    _ => return Err(format!("invalid duration unit: {}", c)),
                }
            }
        }

        // trailing bare number counts as seconds
        if !current_number.is_empty() {
            let num: u64 = current_number
                .parse()
                .map_err(|_| "invalid number in duration".to_string())?;
            total_seconds += num;
        }

        if total_seconds == 0 {
            return Err("duration must be positive".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = "memory", help = "Storage backend: memory or sqlite")]
    storage: String,
    #[arg(long, help = "SQLite database path (defaults to khabar.db)")]
    database_path: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the API server with the background ingestion scheduler
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,
        /// How often to pull fresh news (e.g. 6h, 30m, 1h15m30s)
        #[arg(long, default_value = "6h")]
        interval: HumanDuration,
    },
    /// Run one ingestion cycle and exit
    Fetch,
    /// Generate (or print the cached) summary for a stored article
    Summarize { id: String },
    /// Delete articles past the retention window
    Cleanup,
}

fn ingest_manager(
    settings: &Settings,
    storage: Arc<dyn kh_core::Storage>,
    notifier: Arc<dyn kh_notify::Notifier>,
) -> Result<IngestManager> {
    let key = settings
        .news_api_key
        .clone()
        .ok_or_else(|| Error::Config("NEWS_API_KEY is not set".to_string()))?;
    Ok(IngestManager::new(
        NewsApiClient::new(key),
        storage,
        notifier,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let settings = Settings::from_env();
    let storage = kh_storage::create_storage(&cli.storage, cli.database_path.as_deref()).await?;
    info!("💾 storage initialized (using {})", cli.storage);
    let pipeline = Arc::new(SummaryPipeline::from_settings(&settings));
    let notifier = kh_notify::create_notifier(&settings, storage.clone());

    match cli.command {
        Commands::Serve { addr, interval } => {
            match ingest_manager(&settings, storage.clone(), notifier.clone()) {
                Ok(manager) => {
                    let period = interval.0;
                    tokio::spawn(async move {
                        loop {
                            info!("starting ingestion cycle");
                            if let Err(e) = manager.run_cycle().await {
                                error!("ingestion cycle failed: {}", e);
                            }
                            if let Err(e) = manager.cleanup().await {
                                error!("cleanup failed: {}", e);
                            }
                            info!("next ingestion in {}s", period.as_secs());
                            tokio::time::sleep(period).await;
                        }
                    });
                }
                Err(_) => warn!("⚠️ NEWS_API_KEY not set, ingestion disabled"),
            }

            kh_web::serve(
                &addr,
                AppState {
                    storage,
                    pipeline,
                    notifier,
                    settings,
                },
            )
            .await?;
        }
        Commands::Fetch => {
            let manager = ingest_manager(&settings, storage, notifier)?;
            let stored = manager.run_cycle().await?;
            println!("stored {} new articles", stored);
        }
        Commands::Summarize { id } => {
            let article = storage
                .get_article(&id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
            if let Some(existing) = article.ai_summary.as_deref() {
                if existing.chars().count() > 100 {
                    println!("{} (cached)", existing);
                    return Ok(());
                }
            }
            let artifact = pipeline
                .generate(&SummaryRequest::from_article(&article))
                .await;
            storage
                .update_summary(&article.id, &artifact.text, artifact.audio_url.as_deref())
                .await?;
            println!("[{}] {}", artifact.provenance, artifact.text);
            if let Some(audio) = artifact.audio_url {
                println!("audio: {}", audio);
            }
        }
        Commands::Cleanup => {
            let cutoff = Utc::now() - chrono::Duration::days(RETENTION_DAYS);
            let removed = storage.delete_older_than(cutoff).await?;
            println!("deleted {} old articles", removed);
        }
    }

    Ok(())
}
