mod common;

use common::{article, MemoryArticles, MemoryCheckpoints, ScriptedSource, TestSink};
use coinherald::{CheckpointStore, DeliveryQueue, NewsPoller, QueueConfig};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    source: Arc<ScriptedSource>,
    checkpoints: Arc<MemoryCheckpoints>,
    articles: Arc<MemoryArticles>,
    sink: Arc<TestSink>,
    poller: NewsPoller,
}

fn fixture() -> Fixture {
    let source = Arc::new(ScriptedSource::default());
    let checkpoints = Arc::new(MemoryCheckpoints::default());
    let articles = Arc::new(MemoryArticles::default());
    let sink = Arc::new(TestSink::new());

    let queue = DeliveryQueue::start(
        sink.clone(),
        QueueConfig {
            max_attempts: 3,
            backoff_base: Duration::from_millis(5),
            send_gap: Duration::from_millis(1),
        },
    );

    let poller = NewsPoller::new(
        source.clone(),
        checkpoints.clone(),
        articles.clone(),
        queue,
        "news",
    );

    Fixture {
        source,
        checkpoints,
        articles,
        sink,
        poller,
    }
}

#[tokio::test]
async fn announces_only_articles_past_checkpoint() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;

    f.source
        .push_batch(vec![article(95), article(100), article(105), article(110)]);
    let cycle = f.poller.poll_once().await?;

    assert_eq!(cycle.announced, 2);
    assert_eq!(
        f.sink.delivered_titles(),
        vec!["Article 105", "Article 110"]
    );
    assert_eq!(f.checkpoints.stored("news"), 110);
    assert!(f.articles.contains(105));
    assert!(f.articles.contains(110));
    assert!(!f.articles.contains(95));
    Ok(())
}

#[tokio::test]
async fn replaying_an_unchanged_batch_announces_nothing() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;

    let batch = vec![article(105), article(110)];
    f.source.push_batch(batch.clone());
    f.source.push_batch(batch);

    let first = f.poller.poll_once().await?;
    let second = f.poller.poll_once().await?;

    assert_eq!(first.announced, 2);
    assert_eq!(second.announced, 0);
    assert_eq!(f.sink.delivered().len(), 2);
    Ok(())
}

#[tokio::test]
async fn shuffled_feed_is_announced_in_publish_order() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;

    f.source
        .push_batch(vec![article(110), article(95), article(105)]);
    f.poller.poll_once().await?;

    assert_eq!(
        f.sink.delivered_titles(),
        vec!["Article 105", "Article 110"]
    );
    Ok(())
}

#[tokio::test]
async fn bootstrap_prefers_the_stored_checkpoint() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 300).await?;
    f.articles.seed(article(200));

    f.poller.bootstrap().await?;

    assert_eq!(f.poller.last_timestamp(), 300);
    Ok(())
}

#[tokio::test]
async fn bootstrap_falls_back_to_the_repository_high_water_mark() -> anyhow::Result<()> {
    let mut f = fixture();
    f.articles.seed(article(500));

    f.poller.bootstrap().await?;
    assert_eq!(f.poller.last_timestamp(), 500);
    assert_eq!(f.checkpoints.stored("news"), 500);

    f.source.push_batch(vec![article(490), article(510)]);
    f.poller.poll_once().await?;

    assert_eq!(f.sink.delivered_titles(), vec!["Article 510"]);
    Ok(())
}

#[tokio::test]
async fn bootstrap_from_a_live_fetch_skips_the_backlog() -> anyhow::Result<()> {
    let mut f = fixture();
    f.source
        .push_batch(vec![article(10), article(20), article(30)]);

    f.poller.bootstrap().await?;
    assert_eq!(f.poller.last_timestamp(), 30);
    assert_eq!(f.checkpoints.stored("news"), 30);
    assert!(f.sink.delivered().is_empty());

    // The backlog the bootstrap saw is never announced.
    f.source
        .push_batch(vec![article(10), article(20), article(30)]);
    let quiet = f.poller.poll_once().await?;
    assert_eq!(quiet.announced, 0);

    f.source
        .push_batch(vec![article(20), article(30), article(40)]);
    f.poller.poll_once().await?;
    assert_eq!(f.sink.delivered_titles(), vec!["Article 40"]);
    Ok(())
}

#[tokio::test]
async fn duplicate_repository_rows_do_not_abort_the_cycle() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;
    f.articles.seed(article(105));

    f.source.push_batch(vec![article(105), article(110)]);
    let cycle = f.poller.poll_once().await?;

    assert_eq!(cycle.announced, 2);
    assert_eq!(
        f.sink.delivered_titles(),
        vec!["Article 105", "Article 110"]
    );
    assert_eq!(f.checkpoints.stored("news"), 110);
    assert_eq!(f.articles.count(), 2);
    Ok(())
}

#[tokio::test]
async fn permanent_send_failure_keeps_partial_progress() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;

    // First announcement succeeds; the second exhausts all three attempts.
    f.sink.succeed_next(1);
    f.sink.fail_next(3);

    f.source
        .push_batch(vec![article(101), article(102), article(103)]);
    let cycle = f.poller.poll_once().await?;

    assert_eq!(cycle.announced, 1);
    assert_eq!(cycle.dropped, 1);
    assert_eq!(f.checkpoints.stored("news"), 101);
    assert!(f.articles.contains(101));
    assert!(!f.articles.contains(102));

    // The unfinished tail is still above the checkpoint and goes out on the
    // next tick.
    f.source
        .push_batch(vec![article(101), article(102), article(103)]);
    let retry = f.poller.poll_once().await?;

    assert_eq!(retry.announced, 2);
    assert_eq!(
        f.sink.delivered_titles(),
        vec!["Article 101", "Article 102", "Article 103"]
    );
    assert_eq!(f.checkpoints.stored("news"), 103);
    Ok(())
}

#[tokio::test]
async fn fetch_failure_skips_the_cycle_and_the_next_tick_recovers() -> anyhow::Result<()> {
    let mut f = fixture();
    f.checkpoints.set("news", 100).await?;
    f.poller.bootstrap().await?;

    f.source.push_error();
    assert!(f.poller.poll_once().await.is_err());
    assert_eq!(f.checkpoints.stored("news"), 100);
    assert_eq!(f.sink.attempts(), 0);

    f.source.push_batch(vec![article(105)]);
    f.poller.poll_once().await?;
    assert_eq!(f.sink.delivered_titles(), vec!["Article 105"]);
    Ok(())
}
