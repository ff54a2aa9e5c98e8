// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{FullMatch, Gender, MatchOutcome, Pair, PairingRun, StoredPair, UserRecord};
pub use requests::PairUsersRequest;
pub use responses::{ErrorResponse, HealthResponse, PairView, FullMatchView, PairingResponse, PairingRunResponse};
