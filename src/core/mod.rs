// Core algorithm exports
pub mod aggregator;
pub mod distance;
pub mod evaluators;
pub mod membership;
pub mod pipeline;
pub mod profile;
pub mod transport;

pub use aggregator::{CandidateScore, Exclusion, ScoreAggregator};
pub use distance::haversine_distance_m;
pub use evaluators::{AmenityImportanceEvaluator, DistanceEvaluator, PriceBands, PriceCategory, PriceEvaluator};
pub use membership::{fuzzy_and, fuzzy_or, gaussian, trapezoidal, triangular, weighted_average, ConfigurationError, MembershipFunction};
pub use pipeline::{
    CandidateSource, Classification, Classifier, CollaboratorError, HistoricalBonus, PipelineError,
    PipelineStage, RankingOutcome, RankingPipeline, RankingRequest,
};
pub use profile::QueryProfileBuilder;
pub use transport::{AccessibilityEvaluation, ModeBands, TransportAccessibilityEvaluator};
