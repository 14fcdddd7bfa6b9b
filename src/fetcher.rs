use crate::traits::NewsSource;
use crate::types::{Article, HeraldError, PollConfig, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP implementation of [`NewsSource`] for the news API.
///
/// Retries inside a single fetch are bounded and transport-level; a fetch
/// that still fails after them surfaces one error and the poll cycle is
/// skipped.
pub struct NewsFetcher {
    client: Client,
    config: PollConfig,
}

impl NewsFetcher {
    pub fn new(config: PollConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn fetch_once(&self) -> Result<Vec<Article>> {
        let response = self.client.get(&self.config.api_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(HeraldError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let articles = response.json::<Vec<Article>>().await?;
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for NewsFetcher {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        debug!("Fetching news list: {}", self.config.api_url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once().await {
                Ok(articles) => {
                    info!("Fetched {} article(s) from news API", articles.len());
                    return Ok(articles);
                }
                Err(e) => {
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "News fetch attempt {} failed, retrying in {:?}",
                                attempt + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| HeraldError::Api("fetch failed".to_string())))
    }
}
