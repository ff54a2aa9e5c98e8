use crate::core::availability::AvailabilityMask;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One of the two pairing categories; a pair always spans both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// A user taking part in a pairing run
///
/// The user's index is its position in the input slice and only means
/// something for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRecord {
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "username")]
    pub handle: String,
    #[serde(alias = "sex")]
    pub gender: Gender,
    /// Free-form self description, also scanned for `@handle` mentions
    #[serde(default, alias = "interests")]
    pub about: String,
    /// Missing availability means no free slot
    #[serde(default, alias = "time_ranges", alias = "free_time")]
    pub availability: AvailabilityMask,
}

/// Regular pair: the two users share at least one free slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub a: usize,
    pub b: usize,
    pub score: f64,
    pub overlap: AvailabilityMask,
}

/// Mutual mentions without any shared free slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FullMatch {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

/// Everything one pairing run produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub pairs: Vec<Pair>,
    pub full_matches: Vec<FullMatch>,
}

impl MatchOutcome {
    /// Number of users placed in a pair or full match
    pub fn matched_count(&self) -> usize {
        2 * (self.pairs.len() + self.full_matches.len())
    }

    /// Indices in `0..user_count` that ended up in no result, ascending
    pub fn unmatched(&self, user_count: usize) -> Vec<usize> {
        let mut matched = vec![false; user_count];
        let ends = self
            .pairs
            .iter()
            .map(|p| (p.a, p.b))
            .chain(self.full_matches.iter().map(|m| (m.a, m.b)));
        for (a, b) in ends {
            if let Some(slot) = matched.get_mut(a) {
                *slot = true;
            }
            if let Some(slot) = matched.get_mut(b) {
                *slot = true;
            }
        }

        matched
            .iter()
            .enumerate()
            .filter(|(_, &m)| !m)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A persisted pairing entry, keyed by handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPair {
    pub handle_a: String,
    pub handle_b: String,
    pub score: f64,
    /// Shared slots as a bit-string; empty for full matches
    pub overlap: String,
    pub is_full_match: bool,
}

/// The complete result set of one run, replacing any earlier run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRun {
    pub run_id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub pairs: Vec<StoredPair>,
}

impl PairingRun {
    /// Resolve an outcome's indices against the users it was computed from
    pub fn from_outcome(users: &[UserRecord], outcome: &MatchOutcome) -> Self {
        let pairs = outcome
            .pairs
            .iter()
            .map(|p| StoredPair {
                handle_a: users[p.a].handle.clone(),
                handle_b: users[p.b].handle.clone(),
                score: p.score,
                overlap: p.overlap.to_string(),
                is_full_match: false,
            })
            .chain(outcome.full_matches.iter().map(|m| StoredPair {
                handle_a: users[m.a].handle.clone(),
                handle_b: users[m.b].handle.clone(),
                score: m.score,
                overlap: String::new(),
                is_full_match: true,
            }))
            .collect();

        Self {
            run_id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            pairs,
        }
    }
}
