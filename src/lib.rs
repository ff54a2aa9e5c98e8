//! Pairing Algo - pairs users for one-to-one meetings
//!
//! Each user ends up in at most one pair. Pairs always span both genders and
//! are chosen from three signals: similarity of free-text descriptions,
//! explicit `@handle` mentions, and shared free time slots.

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{PairingEngine, EngineSettings, SimilarityProvider, FixedSimilarity, SimilarityMatrix, MatchError};
pub use crate::models::{UserRecord, Gender, Pair, FullMatch, MatchOutcome, PairUsersRequest, PairingResponse};
