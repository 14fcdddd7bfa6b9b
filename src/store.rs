use crate::traits::{ArticleRepository, CheckpointStore, InsertOutcome};
use crate::types::{Article, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Pool, Postgres, Row};
use tracing::{debug, info};

/// PostgreSQL-backed store implementing both the checkpoint and the article
/// repository contracts. Both tables are append-ish: checkpoints upsert,
/// articles insert-or-skip on the unique `published` key.
pub struct NewsStore {
    db: Pool<Postgres>,
}

impl NewsStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                key VARCHAR(64) PRIMARY KEY,
                last_timestamp BIGINT NOT NULL,
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                published BIGINT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                description TEXT,
                image_hd TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        info!("Database schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.db
    }
}

#[async_trait]
impl CheckpointStore for NewsStore {
    async fn get(&self, key: &str) -> Result<i64> {
        let row = sqlx::query("SELECT last_timestamp FROM checkpoints WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("last_timestamp")?),
            None => Ok(0),
        }
    }

    async fn set(&self, key: &str, timestamp: i64) -> Result<()> {
        // GREATEST keeps the stored mark non-decreasing even if callers race.
        sqlx::query(
            r#"
            INSERT INTO checkpoints (key, last_timestamp, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET
                last_timestamp = GREATEST(checkpoints.last_timestamp, EXCLUDED.last_timestamp),
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(timestamp)
        .execute(&self.db)
        .await?;

        debug!("Checkpoint {} advanced to {}", key, timestamp);
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for NewsStore {
    async fn max_published(&self) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT MAX(published) AS max_published FROM articles")
            .fetch_one(&self.db)
            .await?;

        Ok(row.try_get("max_published")?)
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (published, title, url, description, image_hd)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (published) DO NOTHING
            "#,
        )
        .bind(article.published)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.description)
        .bind(&article.image_hd)
        .execute(&self.db)
        .await?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }
}
