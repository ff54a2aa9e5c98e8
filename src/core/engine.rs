use crate::core::{
    availability::{intersect, AvailabilityMask, MaskError, DEFAULT_SLOT_COUNT},
    preferences::{extract_preferences, PreferenceMap},
    similarity::{SimilarityError, SimilarityMatrix, SimilarityProvider},
};
use crate::models::{FullMatch, MatchOutcome, Pair, UserRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Score added when exactly one side mentions the other
pub const DEFAULT_ONE_SIDED_BONUS: f64 = 0.3;

/// Errors that stop a pairing run before any result is produced
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Duplicate handle in input: {0}")]
    DuplicateHandle(String),

    #[error("Availability of {handle} has {actual} slots, expected {expected}")]
    MaskWidth {
        handle: String,
        expected: usize,
        actual: usize,
    },

    #[error("Similarity matrix covers {actual} users, expected {expected}")]
    MatrixShape { expected: usize, actual: usize },

    #[error("Similarity scoring failed: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Availability error: {0}")]
    Mask(#[from] MaskError),
}

/// Order of equally scored candidates in the greedy pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Whole `(score, i, j)` tuple sorted descending: on equal score the
    /// larger `i`, then the larger `j`, wins
    #[default]
    IndexDescending,
    /// Score descending, then smaller `i`, then smaller `j`
    IndexAscending,
}

/// Tunables of the pairing algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub one_sided_bonus: f64,
    pub slot_count: usize,
    pub tie_break: TieBreak,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            one_sided_bonus: DEFAULT_ONE_SIDED_BONUS,
            slot_count: DEFAULT_SLOT_COUNT,
            tie_break: TieBreak::default(),
        }
    }
}

/// Candidate collected by the greedy pass
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    i: usize,
    j: usize,
    overlap: AvailabilityMask,
}

/// Two-phase greedy pairing
///
/// # Phases
/// 1. Mutual mentions: for each free user in index order, the first later
///    free user of the other gender with a mutual mention is taken. A shared
///    slot makes a regular pair, none makes a full match.
/// 2. Greedy: every remaining cross-gender pair is scored (similarity plus
///    a bonus for a one-sided mention), sorted best first, and accepted when
///    both users are still free and share a slot.
///
/// The engine keeps no state between runs.
#[derive(Debug, Clone, Default)]
pub struct PairingEngine {
    settings: EngineSettings,
}

impl PairingEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Check the input snapshot: unique handles and masks of the configured width
    pub fn validate(&self, users: &[UserRecord]) -> Result<(), MatchError> {
        let mut seen = HashSet::with_capacity(users.len());

        for user in users {
            if !seen.insert(user.handle.as_str()) {
                return Err(MatchError::DuplicateHandle(user.handle.clone()));
            }
            if user.availability.width() != self.settings.slot_count {
                return Err(MatchError::MaskWidth {
                    handle: user.handle.clone(),
                    expected: self.settings.slot_count,
                    actual: user.availability.width(),
                });
            }
        }

        Ok(())
    }

    /// Score all descriptions with `provider`, then pair
    ///
    /// The provider is called exactly once, and not at all for fewer than
    /// two users. Its failure aborts the run.
    pub async fn run<P>(&self, users: &[UserRecord], provider: &P) -> Result<MatchOutcome, MatchError>
    where
        P: SimilarityProvider + ?Sized,
    {
        self.validate(users)?;

        if users.len() < 2 {
            info!("Pairing skipped: {} user(s) in snapshot", users.len());
            return Ok(MatchOutcome::default());
        }

        let texts: Vec<String> = users.iter().map(|u| u.about.clone()).collect();
        let similarity = provider.score(&texts).await?;

        let outcome = self.pair_unchecked(users, &similarity)?;

        info!(
            "Pairing finished: {} users, {} pairs, {} full matches, {} unmatched",
            users.len(),
            outcome.pairs.len(),
            outcome.full_matches.len(),
            users.len() - outcome.matched_count(),
        );

        Ok(outcome)
    }

    /// Pair users against a precomputed similarity matrix
    pub fn pair(
        &self,
        users: &[UserRecord],
        similarity: &SimilarityMatrix,
    ) -> Result<MatchOutcome, MatchError> {
        self.validate(users)?;
        self.pair_unchecked(users, similarity)
    }

    /// `pair` for a snapshot that already passed `validate`
    fn pair_unchecked(
        &self,
        users: &[UserRecord],
        similarity: &SimilarityMatrix,
    ) -> Result<MatchOutcome, MatchError> {
        if similarity.size() != users.len() {
            return Err(MatchError::MatrixShape {
                expected: users.len(),
                actual: similarity.size(),
            });
        }

        let texts: Vec<&str> = users.iter().map(|u| u.about.as_str()).collect();
        let preferences = extract_preferences(&texts);

        let mut used = vec![false; users.len()];
        let mut outcome = MatchOutcome::default();

        self.mutual_pass(users, &preferences, similarity, &mut used, &mut outcome)?;
        debug!(
            "Mutual pass: {} pairs, {} full matches",
            outcome.pairs.len(),
            outcome.full_matches.len()
        );

        let mutual_pairs = outcome.pairs.len();
        self.greedy_pass(users, &preferences, similarity, &mut used, &mut outcome)?;
        debug!("Greedy pass: {} pairs", outcome.pairs.len() - mutual_pairs);

        Ok(outcome)
    }

    fn mutual_pass(
        &self,
        users: &[UserRecord],
        preferences: &PreferenceMap,
        similarity: &SimilarityMatrix,
        used: &mut [bool],
        outcome: &mut MatchOutcome,
    ) -> Result<(), MatchError> {
        let n = users.len();

        for i in 0..n {
            if used[i] {
                continue;
            }

            for j in (i + 1)..n {
                if used[j] || users[i].gender == users[j].gender {
                    continue;
                }

                let a_wants_b = preferences.wants(i, &users[j].handle);
                let b_wants_a = preferences.wants(j, &users[i].handle);
                if !(a_wants_b && b_wants_a) {
                    continue;
                }

                let overlap = intersect(&users[i].availability, &users[j].availability)?;
                let score = round_score(similarity.get(i, j));

                if overlap.has_overlap() {
                    outcome.pairs.push(Pair { a: i, b: j, score, overlap });
                } else {
                    outcome.full_matches.push(FullMatch { a: i, b: j, score });
                }

                used[i] = true;
                used[j] = true;
                break;
            }
        }

        Ok(())
    }

    fn greedy_pass(
        &self,
        users: &[UserRecord],
        preferences: &PreferenceMap,
        similarity: &SimilarityMatrix,
        used: &mut [bool],
        outcome: &mut MatchOutcome,
    ) -> Result<(), MatchError> {
        let n = users.len();
        let mut candidates = Vec::new();

        for i in 0..n {
            if used[i] {
                continue;
            }

            for j in (i + 1)..n {
                if used[j] || users[i].gender == users[j].gender {
                    continue;
                }

                let mut score = similarity.get(i, j);

                let a_wants_b = preferences.wants(i, &users[j].handle);
                let b_wants_a = preferences.wants(j, &users[i].handle);
                if a_wants_b != b_wants_a {
                    score += self.settings.one_sided_bonus;
                }

                // Kept even without a shared slot; filtered when accepting
                let overlap = intersect(&users[i].availability, &users[j].availability)?;
                candidates.push(Candidate { score, i, j, overlap });
            }
        }

        let tie_break = self.settings.tie_break;
        candidates.sort_by(|x, y| compare_candidates(x, y, tie_break));

        for c in candidates {
            if !used[c.i] && !used[c.j] && c.overlap.has_overlap() {
                outcome.pairs.push(Pair {
                    a: c.i,
                    b: c.j,
                    score: round_score(c.score),
                    overlap: c.overlap,
                });
                used[c.i] = true;
                used[c.j] = true;
            }
        }

        Ok(())
    }
}

/// Best candidate first
fn compare_candidates(x: &Candidate, y: &Candidate, tie_break: TieBreak) -> Ordering {
    let by_score = y.score.partial_cmp(&x.score).unwrap_or(Ordering::Equal);

    match tie_break {
        TieBreak::IndexDescending => by_score
            .then_with(|| y.i.cmp(&x.i))
            .then_with(|| y.j.cmp(&x.j)),
        TieBreak::IndexAscending => by_score
            .then_with(|| x.i.cmp(&y.i))
            .then_with(|| x.j.cmp(&y.j)),
    }
}

/// Round to three decimals
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
