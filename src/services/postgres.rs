use crate::models::{PairingRun, StoredPair};
use crate::services::store::{PairStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

/// PostgreSQL-backed pair store
///
/// Keeps only the latest run. Writing a run clears the previous one in the
/// same transaction, so readers never see a mix of two runs.
pub struct PostgresPairStore {
    pool: PgPool,
}

impl PostgresPairStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from optional settings, filling in defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl PairStore for PostgresPairStore {
    async fn replace_all(&self, run: &PairingRun) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Pairs go with their run through ON DELETE CASCADE
        let cleared = sqlx::query("DELETE FROM pairing_runs")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("INSERT INTO pairing_runs (run_id, created_at) VALUES ($1, $2)")
            .bind(run.run_id)
            .bind(run.created_at)
            .execute(&mut *tx)
            .await?;

        for (position, pair) in run.pairs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pairs (run_id, position, handle_a, handle_b, score, time_overlap, is_full_match)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(run.run_id)
            .bind(position as i32)
            .bind(&pair.handle_a)
            .bind(&pair.handle_b)
            .bind(pair.score)
            .bind(&pair.overlap)
            .bind(pair.is_full_match)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Stored run {} ({} entries), cleared {} previous run(s)",
            run.run_id,
            run.pairs.len(),
            cleared
        );

        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<PairingRun>, StoreError> {
        let Some(row) = sqlx::query(
            r#"
            SELECT run_id, created_at
            FROM pairing_runs
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let run_id: uuid::Uuid = row.try_get("run_id")?;
        let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;

        let rows = sqlx::query(
            r#"
            SELECT handle_a, handle_b, score, time_overlap, is_full_match
            FROM pairs
            WHERE run_id = $1
            ORDER BY position
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        let pairs = rows
            .iter()
            .map(|row| {
                Ok(StoredPair {
                    handle_a: row.try_get("handle_a")?,
                    handle_b: row.try_get("handle_b")?,
                    score: row.try_get("score")?,
                    overlap: row.try_get("time_overlap")?,
                    is_full_match: row.try_get("is_full_match")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(PairingRun {
            run_id,
            created_at,
            pairs,
        }))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
