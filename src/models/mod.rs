// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AccessibilityBand, AmenityAssessment, AmenityPreference, AmenityType, Budget, Candidate, Criterion,
    CriterionExplanation, CriterionOutcome, CriterionScore, Explanation, ExtractedConstraints, LocationNote,
    NearbyAmenity, PriorityRank, QueryIntent, QueryProfile, RankedResult, ScoringWeights, TransportMode,
};
pub use requests::{AccessibilityRequest, ConstraintsInput, RankListingsRequest, RecordInteractionRequest};
pub use responses::{
    AccessibilityResponse, ErrorResponse, HealthResponse, RankListingsResponse, RecordInteractionResponse,
    SnapshotResponse,
};
