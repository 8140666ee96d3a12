//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{error::ApiError, error::ErrorBody, web::state::AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;
use virality_core::{
    domain::{AnalysisRecord, HistoryStats, ViralityScore},
    service::{AnalysisOutcome, PageRequest},
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        list_history_handler,
        delete_history_handler,
        history_stats_handler,
        health_handler,
    ),
    components(
        schemas(
            AnalyzeRequest,
            AnalysisResponse,
            ScoreResponse,
            HistoryResponse,
            DeleteResponse,
            StatsResponse,
            HealthResponse,
            ErrorBody,
        )
    ),
    tags(
        (
            name = "Virality Analysis API",
            description = "Content scoring and per-user analysis history."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of an analysis submission.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub num_comments: Option<u32>,
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub overall: u8,
    pub emotional_impact: u8,
    pub shareability: u8,
    pub timing: u8,
    pub uniqueness: u8,
    pub engagement: u8,
}

impl From<ViralityScore> for ScoreResponse {
    fn from(score: ViralityScore) -> Self {
        Self {
            overall: score.overall,
            emotional_impact: score.emotional_impact,
            shareability: score.shareability,
            timing: score.timing,
            uniqueness: score.uniqueness,
            engagement: score.engagement,
        }
    }
}

/// One analysis as returned by both `/analyze` and `/history`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub content: String,
    pub score: ScoreResponse,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AnalysisRecord> for AnalysisResponse {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            score: record.score.into(),
            insights: record.insights,
            recommendations: record.recommendations,
            timestamp: record.created_at,
        }
    }
}

impl From<AnalysisOutcome> for AnalysisResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let mut response = Self::from(outcome.record);
        response.content = outcome.preview;
        response
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page size, default 20, at most 100.
    pub limit: Option<u32>,
    /// Number of records to skip, default 0.
    pub offset: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisResponse>,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// The id of the analysis to delete.
    pub id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: u64,
    pub average_score: f64,
    pub high_scoring: u64,
    pub this_month: u64,
}

impl From<HistoryStats> for StatsResponse {
    fn from(stats: HistoryStats) -> Self {
        Self {
            total: stats.total,
            average_score: (stats.average_score * 10.0).round() / 10.0,
            high_scoring: stats.high_scoring,
            this_month: stats.this_month,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub scoring_backend: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Score a piece of content and store the result in the caller's history.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalysisResponse),
        (status = 400, description = "Empty content or malformed body", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 503, description = "Scoring backend unavailable", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn analyze_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let content = req.content.unwrap_or_default();

    let outcome = app_state
        .service
        .analyze(user_id, &content, req.num_comments.unwrap_or(0))
        .await?;

    Ok(Json(outcome.into()))
}

/// List the caller's past analyses, newest first.
#[utoipa::path(
    get,
    path = "/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "One page of history", body = HistoryResponse),
        (status = 400, description = "Malformed paging parameters", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = app_state
        .service
        .history(
            user_id,
            PageRequest {
                limit: query.limit,
                offset: query.offset,
            },
        )
        .await?;

    Ok(Json(HistoryResponse {
        analyses: page.records.into_iter().map(Into::into).collect(),
        total: page.total,
        has_more: page.has_more,
    }))
}

/// Delete one of the caller's analyses. Deleting an unknown, foreign or
/// non-UUID id succeeds without effect.
#[utoipa::path(
    delete,
    path = "/history",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deleted, or nothing to delete", body = DeleteResponse),
        (status = 400, description = "Missing id", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn delete_history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let raw_id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Analysis ID required".to_string()))?;
    // An id that is not a UUID cannot name any stored analysis.
    match Uuid::parse_str(raw_id.trim()) {
        Ok(id) => app_state.service.delete(user_id, id).await?,
        Err(_) => debug!("Ignoring delete of unknown analysis id '{}'", raw_id),
    }
    Ok(Json(DeleteResponse { success: true }))
}

/// Aggregates over the caller's whole history.
#[utoipa::path(
    get,
    path = "/history/stats",
    responses(
        (status = 200, description = "History statistics", body = StatsResponse),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn history_stats_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = app_state.service.stats(user_id).await?;
    Ok(Json(stats.into()))
}

/// Liveness of this service plus reachability of the scoring backend.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend_up = app_state.service.scoring_backend_healthy().await;
    let response = HealthResponse {
        status: if backend_up { "ok" } else { "degraded" }.to_string(),
        scoring_backend: if backend_up { "up" } else { "down" }.to_string(),
    };
    (StatusCode::OK, Json(response))
}
