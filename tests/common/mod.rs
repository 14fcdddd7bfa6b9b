#![allow(dead_code)]

use async_trait::async_trait;
use coinherald::{
    Article, ArticleRepository, CheckpointStore, HeraldError, InsertOutcome, NewsSource,
    NotificationSink, Outbound, Result,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn article(published: i64) -> Article {
    Article {
        title: format!("Article {}", published),
        url: format!("https://example.com/{}", published),
        description: format!("Description {}", published),
        image_hd: None,
        published,
    }
}

/// In-memory checkpoint store with the same monotonic `set` behavior as the
/// durable one.
#[derive(Default)]
pub struct MemoryCheckpoints {
    values: Mutex<BTreeMap<String, i64>>,
}

impl MemoryCheckpoints {
    pub fn stored(&self, key: &str) -> i64 {
        *self.values.lock().unwrap().get(key).unwrap_or(&0)
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoints {
    async fn get(&self, key: &str) -> Result<i64> {
        Ok(self.stored(key))
    }

    async fn set(&self, key: &str, timestamp: i64) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        let entry = values.entry(key.to_string()).or_insert(0);
        *entry = (*entry).max(timestamp);
        Ok(())
    }
}

/// In-memory article repository, idempotent on `published`.
#[derive(Default)]
pub struct MemoryArticles {
    rows: Mutex<BTreeMap<i64, Article>>,
}

impl MemoryArticles {
    pub fn seed(&self, article: Article) {
        self.rows
            .lock()
            .unwrap()
            .insert(article.published, article);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn contains(&self, published: i64) -> bool {
        self.rows.lock().unwrap().contains_key(&published)
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticles {
    async fn max_published(&self) -> Result<Option<i64>> {
        Ok(self.rows.lock().unwrap().keys().next_back().copied())
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&article.published) {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            rows.insert(article.published, article.clone());
            Ok(InsertOutcome::Inserted)
        }
    }
}

/// News source that replays scripted batches, one per fetch; an exhausted
/// script returns an empty feed.
#[derive(Default)]
pub struct ScriptedSource {
    batches: Mutex<VecDeque<std::result::Result<Vec<Article>, ()>>>,
}

impl ScriptedSource {
    pub fn push_batch(&self, batch: Vec<Article>) {
        self.batches.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_error(&self) {
        self.batches.lock().unwrap().push_back(Err(()));
    }
}

#[async_trait]
impl NewsSource for ScriptedSource {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(())) => Err(HeraldError::Api("scripted fetch failure".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

/// Sink double with a per-attempt outcome script. Each send attempt pops the
/// next scripted outcome; an exhausted script succeeds. Successful payloads
/// are recorded in order.
#[derive(Default)]
pub struct TestSink {
    script: Mutex<VecDeque<bool>>,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<Outbound>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` send attempts fail.
    pub fn fail_next(&self, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(false);
        }
    }

    /// The next `n` send attempts succeed.
    pub fn succeed_next(&self, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(true);
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Outbound> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_titles(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .filter_map(|payload| payload.embeds.first().and_then(|embed| embed.title.clone()))
            .collect()
    }

    pub fn delivered_contents(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .filter_map(|payload| payload.content.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for TestSink {
    async fn send(&self, payload: &Outbound) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);

        if ok {
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(())
        } else {
            Err(HeraldError::Send("scripted send failure".to_string()))
        }
    }
}
