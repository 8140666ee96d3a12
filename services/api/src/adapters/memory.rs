//! services/api/src/adapters/memory.rs
//!
//! In-process implementations of the persistence and session ports. The HTTP
//! tests drive the full router against these.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use virality_core::domain::{
    AnalysisPage, AnalysisRecord, HistoryStats, NewAnalysis, HIGH_SCORE_THRESHOLD,
};
use virality_core::ports::{HistoryRepository, PortError, PortResult, SessionResolver};

/// Analysis records held in insertion order.
#[derive(Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<AnalysisRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully-formed record as-is, keeping its id and timestamp.
    pub async fn insert_record(&self, record: AnalysisRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistory {
    async fn create_analysis(&self, analysis: NewAnalysis) -> PortResult<AnalysisRecord> {
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            user_id: analysis.user_id,
            content: analysis.content,
            score: analysis.score,
            insights: analysis.insights,
            recommendations: analysis.recommendations,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<AnalysisPage> {
        let records = self.records.read().await;
        let mut owned: Vec<&AnalysisRecord> =
            records.iter().filter(|r| r.user_id == user_id).collect();
        // Stable sort, so equal timestamps keep insertion order before the reversal.
        owned.sort_by_key(|r| r.created_at);
        let total = owned.len() as u64;

        let page = owned
            .into_iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(AnalysisPage::new(page, total, limit, offset))
    }

    async fn delete_owned_analysis(&self, id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(records.len() != before)
    }

    async fn analysis_stats(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
    ) -> PortResult<HistoryStats> {
        let records = self.records.read().await;
        let owned: Vec<&AnalysisRecord> =
            records.iter().filter(|r| r.user_id == user_id).collect();

        let total = owned.len() as u64;
        let average_score = if owned.is_empty() {
            0.0
        } else {
            owned.iter().map(|r| f64::from(r.score.overall)).sum::<f64>() / owned.len() as f64
        };
        let high_scoring = owned
            .iter()
            .filter(|r| r.score.overall >= HIGH_SCORE_THRESHOLD)
            .count() as u64;
        let this_month = owned.iter().filter(|r| r.created_at >= month_start).count() as u64;

        Ok(HistoryStats {
            total,
            average_score,
            high_scoring,
            this_month,
        })
    }
}

/// Session tokens mapped to their owners.
#[derive(Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<String, Uuid>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: impl Into<String>, user_id: Uuid) {
        self.sessions.write().await.insert(token.into(), user_id);
    }
}

#[async_trait]
impl SessionResolver for InMemorySessions {
    async fn resolve_session(&self, session_token: &str) -> PortResult<Uuid> {
        self.sessions
            .read()
            .await
            .get(session_token)
            .copied()
            .ok_or(PortError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use virality_core::domain::ViralityScore;

    fn score(overall: u8) -> ViralityScore {
        ViralityScore {
            overall,
            emotional_impact: overall,
            shareability: overall,
            timing: overall,
            uniqueness: overall,
            engagement: overall,
        }
    }

    fn record(user_id: Uuid, overall: u8, created_at: DateTime<Utc>) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            user_id,
            content: format!("post scoring {}", overall),
            score: score(overall),
            insights: vec!["a".into(), "b".into(), "c".into()],
            recommendations: vec!["x".into(), "y".into(), "z".into()],
            created_at,
        }
    }

    #[tokio::test]
    async fn pagination_over_twenty_five_records() {
        let store = InMemoryHistory::new();
        let user = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for i in 0..25 {
            store
                .insert_record(record(user, 50, base + Duration::minutes(i)))
                .await;
        }
        store
            .insert_record(record(Uuid::new_v4(), 99, base))
            .await;

        let first = store.list_analyses(user, 20, 0).await.unwrap();
        assert_eq!(first.records.len(), 20);
        assert_eq!(first.total, 25);
        assert!(first.has_more);
        assert!(first
            .records
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(first.records[0].created_at, base + Duration::minutes(24));

        let second = store.list_analyses(user, 20, 20).await.unwrap();
        assert_eq!(second.records.len(), 5);
        assert_eq!(second.total, 25);
        assert!(!second.has_more);
        assert_eq!(second.records[4].created_at, base);
    }

    #[tokio::test]
    async fn delete_is_owner_scoped_and_idempotent() {
        let store = InMemoryHistory::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rec = record(owner, 70, Utc::now());
        let id = rec.id;
        store.insert_record(rec).await;

        assert!(!store.delete_owned_analysis(id, other).await.unwrap());
        assert!(store.get(id).await.is_some());

        assert!(store.delete_owned_analysis(id, owner).await.unwrap());
        assert!(!store.delete_owned_analysis(id, owner).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn stats_cover_average_high_and_this_month() {
        let store = InMemoryHistory::new();
        let user = Uuid::new_v4();
        let month_start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        store.insert_record(record(user, 90, month_start + Duration::days(2))).await;
        store.insert_record(record(user, 80, month_start)).await;
        store.insert_record(record(user, 40, month_start - Duration::seconds(1))).await;
        store.insert_record(record(Uuid::new_v4(), 100, month_start)).await;

        let stats = store.analysis_stats(user, month_start).await.unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.high_scoring, 2);
        assert_eq!(stats.this_month, 2);
        assert!((stats.average_score - 70.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_history_has_zero_stats() {
        let stats = InMemoryHistory::new()
            .analysis_stats(Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
    }

    #[tokio::test]
    async fn unknown_session_is_unauthorized() {
        let sessions = InMemorySessions::new();
        let user = Uuid::new_v4();
        sessions.insert("tok", user).await;

        assert_eq!(sessions.resolve_session("tok").await.unwrap(), user);
        assert!(matches!(
            sessions.resolve_session("nope").await,
            Err(PortError::Unauthorized)
        ));
    }
}
