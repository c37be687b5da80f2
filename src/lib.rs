//! Casa Match - fuzzy matching and ranking of real-estate listings
//!
//! This library scores candidate listings against a buyer's request with fuzzy
//! membership functions, ranks them and explains every score. The HTTP service
//! in `main.rs` exposes the same pipeline.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{RankingPipeline, RankingRequest, ScoreAggregator, TransportAccessibilityEvaluator};
pub use models::{Candidate, QueryProfile, RankedResult, ScoringWeights, TransportMode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let pipeline = RankingPipeline::default();
        assert_eq!(pipeline.weights(), &ScoringWeights::default());

        let walk = TransportAccessibilityEvaluator::new().evaluate(100.0, TransportMode::Walk);
        assert_eq!(walk.accessibility_score, 1.0);
    }
}
