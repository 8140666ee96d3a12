//! crates/virality_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of characters of the submitted text kept on the persisted record.
pub const STORED_CONTENT_CHARS: usize = 500;

/// Number of characters of the submitted text echoed back in the analysis response.
pub const PREVIEW_CONTENT_CHARS: usize = 200;

/// Overall score at or above which a record counts as high scoring.
pub const HIGH_SCORE_THRESHOLD: u8 = 80;

/// Coarse classification returned by the scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::High => "High",
            Verdict::Medium => "Medium",
            Verdict::Low => "Low",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verdict '{0}'")]
pub struct UnknownVerdict(pub String);

impl FromStr for Verdict {
    type Err = UnknownVerdict;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Verdict::High),
            "Medium" => Ok(Verdict::Medium),
            "Low" => Ok(Verdict::Low),
            other => Err(UnknownVerdict(other.to_string())),
        }
    }
}

/// The fully-formed answer of the scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringOutcome {
    pub virality_probability: f64,
    pub verdict: Verdict,
}

/// Six-dimension score, every field in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViralityScore {
    pub overall: u8,
    pub emotional_impact: u8,
    pub shareability: u8,
    pub timing: u8,
    pub uniqueness: u8,
    pub engagement: u8,
}

/// Everything the synthesizer derives from a single scoring outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub score: ViralityScore,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The fields of an analysis before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub content: String,
    pub score: ViralityScore,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A persisted analysis. Immutable once created; only its owner may delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub score: ViralityScore,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// One page of a user's history, newest first.
#[derive(Debug, Clone)]
pub struct AnalysisPage {
    pub records: Vec<AnalysisRecord>,
    pub total: u64,
    pub has_more: bool,
}

impl AnalysisPage {
    pub fn new(records: Vec<AnalysisRecord>, total: u64, limit: u32, offset: u32) -> Self {
        let has_more = u64::from(offset) + u64::from(limit) < total;
        Self {
            records,
            total,
            has_more,
        }
    }
}

/// Aggregates shown above a user's history list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub total: u64,
    pub average_score: f64,
    pub high_scoring: u64,
    pub this_month: u64,
}

/// Returns the first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_only_exact_wire_names() {
        assert_eq!("High".parse::<Verdict>(), Ok(Verdict::High));
        assert_eq!("Medium".parse::<Verdict>(), Ok(Verdict::Medium));
        assert_eq!("Low".parse::<Verdict>(), Ok(Verdict::Low));
        assert!("high".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 500), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn page_has_more_follows_offset_plus_limit() {
        assert!(AnalysisPage::new(Vec::new(), 25, 20, 0).has_more);
        assert!(!AnalysisPage::new(Vec::new(), 25, 20, 20).has_more);
        assert!(!AnalysisPage::new(Vec::new(), 20, 20, 0).has_more);
    }
}
