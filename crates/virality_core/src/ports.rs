//! crates/virality_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or the
//! scoring backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AnalysisPage, AnalysisRecord, HistoryStats, NewAnalysis, ScoringOutcome};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Service at {endpoint} is unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Resolves the caller's identity from a session token issued by the identity provider.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns the owning user id, or `PortError::Unauthorized` for unknown or expired tokens.
    async fn resolve_session(&self, session_token: &str) -> PortResult<Uuid>;
}

/// The external virality scoring endpoint.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Scores a piece of text. Either a fully-formed outcome is returned or an error;
    /// missing fields are never defaulted.
    async fn score(&self, text: &str, num_comments: u32) -> PortResult<ScoringOutcome>;

    /// Whether the scoring endpoint currently answers its health probe.
    async fn is_healthy(&self) -> bool;

    /// The configured location of the endpoint, for diagnostics.
    fn endpoint(&self) -> &str;
}

/// Persistence for analysis records. Every operation is scoped to a single user.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn create_analysis(&self, analysis: NewAnalysis) -> PortResult<AnalysisRecord>;

    async fn list_analyses(&self, user_id: Uuid, limit: u32, offset: u32)
        -> PortResult<AnalysisPage>;

    /// Deletes the record only if `user_id` owns it. Returns whether a row was removed.
    async fn delete_owned_analysis(&self, id: Uuid, user_id: Uuid) -> PortResult<bool>;

    async fn analysis_stats(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
    ) -> PortResult<HistoryStats>;
}
