//! services/api/src/adapters/scoring.rs
//!
//! This module contains the adapter for the external virality scoring backend.
//! It implements the `ScoringService` port from the `core` crate over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use virality_core::domain::{ScoringOutcome, Verdict};
use virality_core::ports::{PortError, PortResult, ScoringService};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    num_comments: u32,
}

/// Both fields are optional on the wire so that a missing one can be reported
/// as a malformed response instead of being defaulted.
#[derive(Deserialize)]
struct AnalyzeResponse {
    virality_probability: Option<f64>,
    verdict: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ScoringService` against `POST {base_url}/analyze`.
#[derive(Clone)]
pub struct HttpScoringAdapter {
    client: Client,
    base_url: String,
}

impl HttpScoringAdapter {
    /// Creates a new `HttpScoringAdapter` whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> PortError {
        PortError::Unavailable {
            endpoint: self.base_url.clone(),
            reason: reason.into(),
        }
    }

    fn outcome_from(&self, body: AnalyzeResponse) -> PortResult<ScoringOutcome> {
        let virality_probability = body
            .virality_probability
            .ok_or_else(|| self.unavailable("response is missing virality_probability"))?;
        if !virality_probability.is_finite() || !(0.0..=1.0).contains(&virality_probability) {
            return Err(self.unavailable(format!(
                "virality_probability {} is outside [0, 1]",
                virality_probability
            )));
        }

        let verdict = body
            .verdict
            .ok_or_else(|| self.unavailable("response is missing verdict"))?
            .parse::<Verdict>()
            .map_err(|e| self.unavailable(e.to_string()))?;

        Ok(ScoringOutcome {
            virality_probability,
            verdict,
        })
    }
}

//=========================================================================================
// `ScoringService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ScoringService for HttpScoringAdapter {
    async fn score(&self, text: &str, num_comments: u32) -> PortResult<ScoringOutcome> {
        if text.trim().is_empty() {
            return Err(PortError::InvalidInput("Content is required".to_string()));
        }

        let url = format!("{}/analyze", self.base_url);
        debug!("Scoring {} chars against {}", text.chars().count(), url);

        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { text, num_comments })
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("backend returned {}", status)));
        }

        let body = response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| self.unavailable(format!("malformed response: {}", e)))?;

        self.outcome_from(body)
    }

    async fn is_healthy(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Scoring backend health probe failed: {}", e);
                false
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
