//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use virality_core::{ports::SessionResolver, service::AnalysisService};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(service: Arc<AnalysisService>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self { service, sessions }
    }
}
