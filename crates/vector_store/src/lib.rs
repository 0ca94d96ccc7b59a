pub mod health;
pub mod models;
pub mod store;

pub use health::{CheckEntry, DatabaseHealthChecker, HealthReport};
pub use models::{Job, NewRepository, NewVectorDocument, Repository, SearchResult, VectorDocument};
pub use store::VectorStore;
