use serde::{Deserialize, Serialize};

use crate::core::pipeline::PipelineStage;
use crate::core::transport::AccessibilityEvaluation;
use crate::models::domain::{QueryIntent, QueryProfile, RankedResult, TransportMode};
use crate::services::history::PreferenceSnapshot;

/// Response for the rank listings endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankListingsResponse {
    pub intent: QueryIntent,
    pub profile: QueryProfile,
    pub results: Vec<RankedResult>,
    pub total_candidates: usize,
    pub stages: Vec<PipelineStage>,
}

/// Transport modes compared for one distance, best first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityResponse {
    pub distance_m: f64,
    pub best_mode: Option<TransportMode>,
    pub evaluations: Vec<AccessibilityEvaluation>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Record interaction response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInteractionResponse {
    pub success: bool,
    pub interaction_id: String,
}

/// Latest learned preferences of one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub user_id: String,
    pub snapshot: PreferenceSnapshot,
}
