pub mod domain;
pub mod ports;
pub mod service;
pub mod synthesis;

pub use domain::{
    AnalysisPage, AnalysisRecord, HistoryStats, NewAnalysis, ScoringOutcome, Synthesis, Verdict,
    ViralityScore,
};
pub use ports::{HistoryRepository, PortError, PortResult, ScoringService, SessionResolver};
pub use service::{AnalysisError, AnalysisOutcome, AnalysisService, PageRequest};
pub use synthesis::{Narrative, NarrativeSource, ScriptedNarratives, Synthesizer};
