#![forbid(unsafe_code)]

//! Request/response contract of the analysis endpoint.
//!
//! ```text
//! POST /analyze   {"channel_name": "..."}
//! 200             {"negatives": "0.2", "neutrals": "0.3", "positives": "0.5", "error": ""}
//! ```
//!
//! Probabilities may arrive as numbers or numeric strings; the all-empty
//! triple means "see `error`".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EndpointError;
use crate::triple::RawProbability;

/// Body of the analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub channel_name: String,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
        }
    }
}

/// Body of the analysis response. Missing fields decode as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub negatives: RawProbability,
    #[serde(default)]
    pub neutrals: RawProbability,
    #[serde(default)]
    pub positives: RawProbability,
    #[serde(default)]
    pub error: String,
}

impl AnalysisResponse {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// The backend that turns a channel name into a sentiment distribution.
///
/// Futures are `!Send`: the browser implementation holds JS values.
#[async_trait(?Send)]
pub trait AnalysisEndpoint {
    /// Issue exactly one request. No retries, no timeout.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, EndpointError>;
}
