use clap::Parser;
use coinherald::{
    health, ArticleRepository, CheckpointStore, Config, DeliveryQueue, NewsFetcher, NewsPoller,
    NewsSource, NewsStore, NotificationSink, OrderStreamRelay, QueueConfig, WebhookSink,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("Starting coinherald");
    info!("Connecting to database: {}", config.sanitized_database_url());

    // Durability is the one fatal precondition: without it every restart
    // would re-announce the backlog.
    let store = match NewsStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Database connection failed, refusing to run without durable storage");
            return Err(e.into());
        }
    };
    store.setup_schema().await?;

    let sink: Arc<dyn NotificationSink> = Arc::new(WebhookSink::new(config.webhook_url.clone()));
    let queue = DeliveryQueue::start(sink, QueueConfig::default());

    let source: Arc<dyn NewsSource> = Arc::new(NewsFetcher::new(config.poll_config()));
    let checkpoints: Arc<dyn CheckpointStore> = store.clone();
    let articles: Arc<dyn ArticleRepository> = store.clone();

    let mut poller = NewsPoller::new(source, checkpoints, articles, queue.clone(), "news");
    poller.bootstrap().await?;

    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            error!("Liveness endpoint failed: {}", e);
        }
    });

    // The exchange streaming client owns this intake and pushes decoded
    // order-update events into it; the relay stays up as long as the intake
    // is alive.
    let (_order_intake, _relay_task) = OrderStreamRelay::start(queue.clone());

    tokio::spawn(poller.run(Duration::from_secs(config.poll_interval_secs)));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
