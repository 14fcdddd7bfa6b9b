use crate::types::PollConfig;
use clap::Parser;
use url::Url;

/// Runtime configuration, from flags or environment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "coinherald",
    about = "Relays crypto news and exchange order updates to a webhook"
)]
pub struct Config {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Webhook endpoint receiving notifications
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: String,

    /// News API endpoint; the page size is bounded in the URL
    #[arg(
        long,
        env = "NEWS_API_URL",
        default_value = "https://api.watcher.guru/content/data?news=10"
    )]
    pub news_api_url: String,

    /// Seconds between poll cycles
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 60)]
    pub poll_interval_secs: u64,

    /// Port for the keep-alive endpoint
    #[arg(long, env = "HEALTH_PORT", default_value_t = 8080)]
    pub health_port: u16,
}

impl Config {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            api_url: self.news_api_url.clone(),
            ..PollConfig::default()
        }
    }

    /// Connection string with the password masked, for logging.
    pub fn sanitized_database_url(&self) -> String {
        match Url::parse(&self.database_url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("***"));
                parsed.to_string()
            }
            _ => self.database_url.clone(),
        }
    }
}
