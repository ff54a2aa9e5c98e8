// Service exports
pub mod ollama;
pub mod postgres;
pub mod store;

pub use ollama::OllamaProvider;
pub use postgres::PostgresPairStore;
pub use store::{MemoryPairStore, PairStore, StoreError};
