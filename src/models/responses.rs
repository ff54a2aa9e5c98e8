use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchOutcome, UserRecord};

/// A regular pair, resolved to handles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairView {
    pub a: String,
    pub b: String,
    pub score: f64,
    pub overlap: String,
    pub overlap_slots: Vec<String>,
}

/// A full match, resolved to handles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullMatchView {
    pub a: String,
    pub b: String,
    pub score: f64,
}

/// Result of a pairing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingResponse {
    pub pairs: Vec<PairView>,
    pub full_matches: Vec<FullMatchView>,
    pub unmatched: Vec<String>,
    pub users_count: usize,
}

impl PairingResponse {
    /// Resolve indices in `outcome` to handles; `slot_labels` names the mask positions
    pub fn build(users: &[UserRecord], outcome: &MatchOutcome, slot_labels: &[String]) -> Self {
        let pairs = outcome
            .pairs
            .iter()
            .map(|p| PairView {
                a: users[p.a].handle.clone(),
                b: users[p.b].handle.clone(),
                score: p.score,
                overlap: p.overlap.to_string(),
                overlap_slots: p
                    .overlap
                    .selected_slots(slot_labels)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        let full_matches = outcome
            .full_matches
            .iter()
            .map(|m| FullMatchView {
                a: users[m.a].handle.clone(),
                b: users[m.b].handle.clone(),
                score: m.score,
            })
            .collect();

        let unmatched = outcome
            .unmatched(users.len())
            .into_iter()
            .map(|i| users[i].handle.clone())
            .collect();

        Self {
            pairs,
            full_matches,
            unmatched,
            users_count: users.len(),
        }
    }
}

/// Response of a persisted run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRunResponse {
    pub run_id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub result: PairingResponse,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
