//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `HistoryRepository` and `SessionResolver` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use virality_core::domain::{
    AnalysisPage, AnalysisRecord, HistoryStats, NewAnalysis, ViralityScore, HIGH_SCORE_THRESHOLD,
};
use virality_core::ports::{HistoryRepository, PortError, PortResult, SessionResolver};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence and session ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AnalysisRow {
    id: Uuid,
    user_id: Uuid,
    content: String,
    overall: i16,
    emotional_impact: i16,
    shareability: i16,
    timing: i16,
    uniqueness: i16,
    engagement: i16,
    insights: Vec<String>,
    recommendations: Vec<String>,
    created_at: DateTime<Utc>,
}

impl AnalysisRow {
    fn to_domain(self) -> PortResult<AnalysisRecord> {
        let score = ViralityScore {
            overall: score_field("overall", self.overall)?,
            emotional_impact: score_field("emotional_impact", self.emotional_impact)?,
            shareability: score_field("shareability", self.shareability)?,
            timing: score_field("timing", self.timing)?,
            uniqueness: score_field("uniqueness", self.uniqueness)?,
            engagement: score_field("engagement", self.engagement)?,
        };
        Ok(AnalysisRecord {
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            score,
            insights: self.insights,
            recommendations: self.recommendations,
            created_at: self.created_at,
        })
    }
}

fn score_field(name: &str, value: i16) -> PortResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| {
            PortError::Unexpected(format!("Stored {} score {} is out of range", name, value))
        })
}

#[derive(FromRow)]
struct StatsRow {
    total: i64,
    average_score: Option<f64>,
    high_scoring: i64,
    this_month: i64,
}

const ANALYSIS_COLUMNS: &str = "id, user_id, content, overall, emotional_impact, shareability, \
     timing, uniqueness, engagement, insights, recommendations, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `HistoryRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl HistoryRepository for DbAdapter {
    async fn create_analysis(&self, analysis: NewAnalysis) -> PortResult<AnalysisRecord> {
        let sql = format!(
            "INSERT INTO analyses (id, user_id, content, overall, emotional_impact, shareability, \
             timing, uniqueness, engagement, insights, recommendations) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            ANALYSIS_COLUMNS
        );
        let score = analysis.score;
        let row = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(analysis.user_id)
            .bind(analysis.content)
            .bind(i16::from(score.overall))
            .bind(i16::from(score.emotional_impact))
            .bind(i16::from(score.shareability))
            .bind(i16::from(score.timing))
            .bind(i16::from(score.uniqueness))
            .bind(i16::from(score.engagement))
            .bind(analysis.insights)
            .bind(analysis.recommendations)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        row.to_domain()
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<AnalysisPage> {
        let sql = format!(
            "SELECT {} FROM analyses WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            ANALYSIS_COLUMNS
        );
        // Page and count must come from the same snapshot for `has_more` to hold.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let rows = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(user_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        let records = rows
            .into_iter()
            .map(AnalysisRow::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(AnalysisPage::new(records, total.max(0) as u64, limit, offset))
    }

    async fn delete_owned_analysis(&self, id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn analysis_stats(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
    ) -> PortResult<HistoryStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total, \
             AVG(overall)::FLOAT8 AS average_score, \
             COUNT(*) FILTER (WHERE overall >= $2) AS high_scoring, \
             COUNT(*) FILTER (WHERE created_at >= $3) AS this_month \
             FROM analyses WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(i16::from(HIGH_SCORE_THRESHOLD))
        .bind(month_start)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(HistoryStats {
            total: row.total.max(0) as u64,
            average_score: row.average_score.unwrap_or(0.0),
            high_scoring: row.high_scoring.max(0) as u64,
            this_month: row.this_month.max(0) as u64,
        })
    }
}

//=========================================================================================
// `SessionResolver` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionResolver for DbAdapter {
    async fn resolve_session(&self, session_token: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }
}
