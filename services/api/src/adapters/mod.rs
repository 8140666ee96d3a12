pub mod db;
pub mod memory;
pub mod scoring;

pub use db::DbAdapter;
pub use memory::{InMemoryHistory, InMemorySessions};
pub use scoring::HttpScoringAdapter;
