use crate::models::PairingRun;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur while persisting pairing results
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Destination of pairing results
///
/// A new run supersedes every earlier one: `replace_all` either stores the
/// whole run or leaves the previous one untouched.
#[async_trait]
pub trait PairStore: Send + Sync {
    async fn replace_all(&self, run: &PairingRun) -> Result<(), StoreError>;

    async fn load_latest(&self) -> Result<Option<PairingRun>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Process-local store, used when no database is configured
#[derive(Debug, Default)]
pub struct MemoryPairStore {
    latest: Mutex<Option<PairingRun>>,
}

impl MemoryPairStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PairStore for MemoryPairStore {
    async fn replace_all(&self, run: &PairingRun) -> Result<(), StoreError> {
        *self.latest.lock().await = Some(run.clone());
        tracing::debug!("Stored run {} with {} entries in memory", run.run_id, run.pairs.len());
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<PairingRun>, StoreError> {
        Ok(self.latest.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredPair;

    fn run(handles: &[(&str, &str)]) -> PairingRun {
        PairingRun {
            run_id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            pairs: handles
                .iter()
                .map(|(a, b)| StoredPair {
                    handle_a: a.to_string(),
                    handle_b: b.to_string(),
                    score: 0.5,
                    overlap: "100000".to_string(),
                    is_full_match: false,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryPairStore::new();
        assert!(store.load_latest().await.unwrap().is_none());
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_all_supersedes_previous_run() {
        let store = MemoryPairStore::new();
        store.replace_all(&run(&[("alex", "bella"), ("chris", "dana")])).await.unwrap();

        let second = run(&[("alex", "dana")]);
        store.replace_all(&second).await.unwrap();

        let latest = store.load_latest().await.unwrap().unwrap();
        assert_eq!(latest, second);
        assert_eq!(latest.pairs.len(), 1);
    }
}
