//! crates/virality_core/src/service.rs
//!
//! The analysis service: composes the scoring port, the synthesizer and the
//! history port into one request/response cycle. Callers authenticate before
//! reaching any method here, so every method takes an already-resolved user id.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    truncate_chars, AnalysisPage, AnalysisRecord, HistoryStats, NewAnalysis,
    PREVIEW_CONTENT_CHARS, STORED_CONTENT_CHARS,
};
use crate::ports::{HistoryRepository, PortError, ScoringService};
use crate::synthesis::Synthesizer;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

//=========================================================================================
// Error Taxonomy
//=========================================================================================

/// Every failure leaving the service is exactly one of these kinds.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Scoring backend at {endpoint} is unavailable")]
    BackendUnavailable { endpoint: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

//=========================================================================================
// Request/Response Shapes
//=========================================================================================

/// Caller-supplied paging, before defaults and the upper bound are applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageRequest {
    /// Returns `(limit, offset)` with defaults filled in and `limit` capped.
    pub fn resolve(self) -> (u32, u32) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

/// The stored record plus the short preview of the submitted text.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub preview: String,
}

//=========================================================================================
// The Service
//=========================================================================================

pub struct AnalysisService {
    scorer: Arc<dyn ScoringService>,
    history: Arc<dyn HistoryRepository>,
    synthesizer: Synthesizer,
}

impl AnalysisService {
    pub fn new(
        scorer: Arc<dyn ScoringService>,
        history: Arc<dyn HistoryRepository>,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            scorer,
            history,
            synthesizer,
        }
    }

    /// Validates, scores, synthesizes and persists one submission.
    pub async fn analyze(
        &self,
        user_id: Uuid,
        content: &str,
        num_comments: u32,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if content.trim().is_empty() {
            return Err(AnalysisError::InvalidInput("Content is required".to_string()));
        }

        let outcome = self
            .scorer
            .score(content, num_comments)
            .await
            .map_err(|e| self.scoring_error(e))?;

        let synthesis = self
            .synthesizer
            .synthesize(outcome.virality_probability, outcome.verdict);

        let record = self
            .history
            .create_analysis(NewAnalysis {
                user_id,
                content: truncate_chars(content, STORED_CONTENT_CHARS),
                score: synthesis.score,
                insights: synthesis.insights,
                recommendations: synthesis.recommendations,
            })
            .await
            .map_err(|e| {
                error!("Failed to persist analysis for user {}: {:?}", user_id, e);
                AnalysisError::Internal(e.to_string())
            })?;

        info!(
            "Stored analysis {} for user {} (verdict {}, overall {})",
            record.id, user_id, outcome.verdict, record.score.overall
        );

        Ok(AnalysisOutcome {
            preview: truncate_chars(content, PREVIEW_CONTENT_CHARS),
            record,
        })
    }

    /// One page of the user's history, newest first.
    pub async fn history(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<AnalysisPage, AnalysisError> {
        let (limit, offset) = page.resolve();
        self.history
            .list_analyses(user_id, limit, offset)
            .await
            .map_err(|e| {
                error!("Failed to list history for user {}: {:?}", user_id, e);
                AnalysisError::Internal(e.to_string())
            })
    }

    /// Deletes a record if the user owns it. Unknown and foreign ids are a silent no-op.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AnalysisError> {
        let removed = self
            .history
            .delete_owned_analysis(id, user_id)
            .await
            .map_err(|e| {
                error!("Failed to delete analysis {} for user {}: {:?}", id, user_id, e);
                AnalysisError::Internal(e.to_string())
            })?;
        debug!("Delete of analysis {} by user {} removed={}", id, user_id, removed);
        Ok(())
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<HistoryStats, AnalysisError> {
        self.stats_at(user_id, Utc::now()).await
    }

    /// Stats with "this month" measured against `now`.
    pub async fn stats_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<HistoryStats, AnalysisError> {
        self.history
            .analysis_stats(user_id, month_start(now))
            .await
            .map_err(|e| {
                error!("Failed to compute stats for user {}: {:?}", user_id, e);
                AnalysisError::Internal(e.to_string())
            })
    }

    pub async fn scoring_backend_healthy(&self) -> bool {
        self.scorer.is_healthy().await
    }

    fn scoring_error(&self, err: PortError) -> AnalysisError {
        match err {
            PortError::InvalidInput(msg) => AnalysisError::InvalidInput(msg),
            PortError::Unavailable { endpoint, reason } => {
                warn!("Scoring backend at {} unavailable: {}", endpoint, reason);
                AnalysisError::BackendUnavailable { endpoint }
            }
            other => {
                warn!("Scoring backend call failed: {}", other);
                AnalysisError::BackendUnavailable {
                    endpoint: self.scorer.endpoint().to_string(),
                }
            }
        }
    }
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}
