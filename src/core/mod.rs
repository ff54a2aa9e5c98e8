// Core algorithm exports
pub mod availability;
pub mod engine;
pub mod preferences;
pub mod similarity;

pub use availability::{intersect, AvailabilityMask, MaskError};
pub use engine::{EngineSettings, MatchError, PairingEngine, TieBreak};
pub use preferences::{extract_preferences, PreferenceMap};
pub use similarity::{FixedSimilarity, SimilarityError, SimilarityMatrix, SimilarityProvider};
