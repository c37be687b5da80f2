use async_trait::async_trait;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::{
    aggregator::{amenity_membership, CandidateScore, ScoreAggregator},
    distance::amenity_distance_m,
    evaluators::{AmenityImportanceEvaluator, DistanceEvaluator},
    profile::QueryProfileBuilder,
    transport::TransportAccessibilityEvaluator,
};
use crate::models::{
    AmenityAssessment, Candidate, Criterion, CriterionExplanation, CriterionOutcome, Explanation,
    ExtractedConstraints, LocationNote, QueryIntent, QueryProfile, RankedResult, ScoringWeights,
};

/// Upper bound of the additive history bonus
pub const MAX_HISTORY_BONUS: f64 = 0.2;

/// Number of results kept when the request sets no limit
pub const DEFAULT_LIMIT: usize = 10;

/// Failure reported by a classifier or candidate source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Pipeline-level failure; the engine never retries or falls back
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("classification failed: {0}")]
    Classification(#[source] CollaboratorError),

    #[error("candidate retrieval failed: {0}")]
    Retrieval(#[source] CollaboratorError),
}

impl PipelineError {
    /// Last stage reached before the pipeline failed
    ///
    /// A classifier failure still counts as reaching `Classified`.
    pub fn failed_after(&self) -> PipelineStage {
        match self {
            PipelineError::Classification(_) => PipelineStage::Classified,
            PipelineError::Retrieval(_) => PipelineStage::ConstraintsExtracted,
        }
    }

    /// Stage trace of the failed run, ending in [`PipelineStage::Failed`]
    pub fn stages(&self) -> Vec<PipelineStage> {
        let last = self.failed_after();
        let mut stages: Vec<PipelineStage> = PipelineStage::SUCCESS
            .iter()
            .copied()
            .take_while(|s| *s != last)
            .chain(std::iter::once(last))
            .collect();
        stages.push(PipelineStage::Failed);
        stages
    }
}

/// States a query moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Classified,
    ConstraintsExtracted,
    CandidatesFetched,
    Scored,
    Ranked,
    Explained,
    Failed,
}

impl PipelineStage {
    /// The full trace of a successful run
    pub const SUCCESS: [PipelineStage; 6] = [
        PipelineStage::Classified,
        PipelineStage::ConstraintsExtracted,
        PipelineStage::CandidatesFetched,
        PipelineStage::Scored,
        PipelineStage::Ranked,
        PipelineStage::Explained,
    ];
}

/// Output of a classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub intent: Option<QueryIntent>,
    pub constraints: ExtractedConstraints,
}

/// Detects the intent of a request and extracts its constraints
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, CollaboratorError>;
}

/// Supplies the listings to rank for a set of constraints
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(
        &self,
        constraints: &ExtractedConstraints,
    ) -> Result<Vec<Candidate>, CollaboratorError>;
}

/// Optional per-user bonus learned from past interactions
///
/// Values outside `[0, MAX_HISTORY_BONUS]` are clamped by the pipeline.
pub trait HistoricalBonus: Send + Sync {
    fn bonus(&self, candidate: &Candidate) -> f64;
}

/// One ranking request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingRequest {
    pub text: String,
    /// Constraints stated explicitly by the caller; they win over classified ones
    pub constraints: ExtractedConstraints,
    pub limit: Option<usize>,
}

impl RankingRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Result of a successful pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    pub intent: QueryIntent,
    pub profile: QueryProfile,
    pub results: Vec<RankedResult>,
    pub total_candidates: usize,
    pub stages: Vec<PipelineStage>,
}

struct Scored {
    candidate: Candidate,
    breakdown: CandidateScore,
    bonus: f64,
    score: f64,
}

/// Main ranking orchestrator
///
/// # Pipeline Stages
/// 1. Classification and constraint extraction (collaborator)
/// 2. Candidate retrieval (collaborator)
/// 3. Independent per-candidate scoring
/// 4. Sorting by score, then by price
/// 5. Explanation of the kept top-N
#[derive(Debug, Clone)]
pub struct RankingPipeline {
    builder: QueryProfileBuilder,
    aggregator: ScoreAggregator,
    distance: DistanceEvaluator,
    importance: AmenityImportanceEvaluator,
    weights: ScoringWeights,
    default_limit: usize,
}

impl RankingPipeline {
    pub fn new(aggregator: ScoreAggregator, distance: DistanceEvaluator, weights: ScoringWeights) -> Self {
        Self {
            builder: QueryProfileBuilder::new(),
            aggregator,
            distance,
            importance: AmenityImportanceEvaluator::new(),
            weights,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn transport(&self) -> &TransportAccessibilityEvaluator {
        self.distance.transport()
    }

    /// Run a request end to end
    ///
    /// Collaborator failures end the run with a [`PipelineError`]; nothing is
    /// scored in that case.
    pub async fn run(
        &self,
        request: &RankingRequest,
        classifier: &dyn Classifier,
        source: &dyn CandidateSource,
        history: Option<&dyn HistoricalBonus>,
    ) -> Result<RankingOutcome, PipelineError> {
        let mut stages = Vec::with_capacity(PipelineStage::SUCCESS.len());

        let classification = classifier
            .classify(&request.text)
            .await
            .map_err(PipelineError::Classification)?;
        let intent = classification.intent.unwrap_or(QueryIntent::Simple);
        stages.push(PipelineStage::Classified);
        tracing::debug!("Classified query as {:?}", intent);

        // The source and the profile must see the same location
        let constraints = classification
            .constraints
            .overridden_by(&request.constraints)
            .normalized();
        let profile = self.builder.build(&request.text, &constraints);
        stages.push(PipelineStage::ConstraintsExtracted);

        let candidates = source
            .fetch_candidates(&constraints)
            .await
            .map_err(PipelineError::Retrieval)?;
        let total_candidates = candidates.len();
        stages.push(PipelineStage::CandidatesFetched);
        tracing::debug!("Fetched {} candidates", total_candidates);

        let mut scored = self.score_all(&profile, candidates, history);
        stages.push(PipelineStage::Scored);

        sort_ranked(&mut scored);
        scored.truncate(self.limit_for(request.limit));
        stages.push(PipelineStage::Ranked);

        let results = self.explain_all(&profile, scored);
        stages.push(PipelineStage::Explained);
        tracing::debug!("Ranked {} of {} candidates", results.len(), total_candidates);

        Ok(RankingOutcome {
            intent,
            profile,
            results,
            total_candidates,
            stages,
        })
    }

    /// Score, sort and explain `candidates` for an already built profile
    pub fn rank(
        &self,
        profile: &QueryProfile,
        candidates: Vec<Candidate>,
        history: Option<&dyn HistoricalBonus>,
        limit: Option<usize>,
    ) -> Vec<RankedResult> {
        let mut scored = self.score_all(profile, candidates, history);
        sort_ranked(&mut scored);
        scored.truncate(self.limit_for(limit));
        self.explain_all(profile, scored)
    }

    fn limit_for(&self, requested: Option<usize>) -> usize {
        requested.filter(|l| *l > 0).unwrap_or(self.default_limit)
    }

    // Candidates are independent; collect keeps input order so the stable
    // sort afterwards decides ties deterministically.
    fn score_all(
        &self,
        profile: &QueryProfile,
        candidates: Vec<Candidate>,
        history: Option<&dyn HistoricalBonus>,
    ) -> Vec<Scored> {
        candidates
            .into_par_iter()
            .map(|candidate| {
                let breakdown = self.aggregator.score(&candidate, profile, &self.weights);
                let bonus = history
                    .map(|h| clamp_bonus(h.bonus(&candidate)))
                    .unwrap_or(0.0);
                let score = (breakdown.score + bonus).clamp(0.0, 1.0);
                tracing::trace!("Candidate {} scored {:.4} (bonus {:.2})", candidate.id, score, bonus);
                Scored {
                    candidate,
                    breakdown,
                    bonus,
                    score,
                }
            })
            .collect()
    }

    fn explain_all(&self, profile: &QueryProfile, scored: Vec<Scored>) -> Vec<RankedResult> {
        scored
            .into_iter()
            .map(|s| {
                let explanation = self.explain(profile, &s);
                RankedResult {
                    score: s.score,
                    base_score: s.breakdown.score,
                    history_bonus: s.bonus,
                    criteria: s.breakdown.criteria,
                    explanation,
                    candidate: s.candidate,
                }
            })
            .collect()
    }

    fn explain(&self, profile: &QueryProfile, scored: &Scored) -> Explanation {
        let candidate = &scored.candidate;

        let criteria: Vec<CriterionExplanation> = Criterion::ALL
            .iter()
            .map(|criterion| CriterionExplanation {
                criterion: *criterion,
                constraint: describe_constraint(*criterion, profile),
                observed: describe_observed(*criterion, candidate),
                outcome: outcome(*criterion, &scored.breakdown),
            })
            .collect();

        let prices = self.aggregator.price_evaluator();
        let price_categories: BTreeMap<String, f64> = candidate
            .price
            .map(|price| {
                prices
                    .evaluate(price)
                    .into_iter()
                    .map(|(category, degree)| (category.to_string(), degree))
                    .collect()
            })
            .unwrap_or_default();
        let price_category = candidate
            .price
            .and_then(|price| prices.dominant_category(price))
            .map(|category| category.to_string());

        let amenities: Vec<AmenityAssessment> = candidate
            .nearby_amenities
            .iter()
            .map(|amenity| {
                let distance_m = amenity_distance_m(candidate, amenity);
                AmenityAssessment {
                    amenity_type: amenity.amenity_type,
                    name: amenity.name.clone(),
                    distance_m,
                    distance_membership: amenity_membership(candidate, amenity),
                    distance_bands: distance_m
                        .map(|d| self.distance.evaluate(d, profile.transport_mode))
                        .unwrap_or_default(),
                    base_weight: amenity.amenity_type.base_weight(),
                    importance: self
                        .importance
                        .evaluate(amenity.amenity_type, &profile.amenity_preferences),
                    accessibility: profile
                        .transport_mode
                        .zip(distance_m)
                        .map(|(mode, d)| self.distance.transport().evaluate(d, mode)),
                }
            })
            .collect();

        let location = profile.location.as_ref().map(|preferred| LocationNote {
            preferred: preferred.clone(),
            listing: candidate.location.clone(),
            importance: profile.location_importance,
        });

        Explanation {
            criteria,
            price_categories,
            price_category,
            amenities,
            location,
            summary: summarize(scored),
        }
    }
}

impl Default for RankingPipeline {
    fn default() -> Self {
        Self::new(
            ScoreAggregator::default(),
            DistanceEvaluator::default(),
            ScoringWeights::default(),
        )
    }
}

/// Clamp a history bonus into `[0, MAX_HISTORY_BONUS]`; NaN counts as no bonus
pub fn clamp_bonus(bonus: f64) -> f64 {
    if bonus.is_nan() {
        return 0.0;
    }
    bonus.clamp(0.0, MAX_HISTORY_BONUS)
}

// Score descending, then price ascending with unpriced listings last.
// sort_by is stable, so ranking a ranked list again leaves it unchanged.
fn sort_ranked(scored: &mut [Scored]) {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| price_key(&a.candidate).total_cmp(&price_key(&b.candidate)))
    });
}

fn price_key(candidate: &Candidate) -> f64 {
    candidate.price.filter(|p| !p.is_nan()).unwrap_or(f64::INFINITY)
}

fn outcome(criterion: Criterion, breakdown: &CandidateScore) -> CriterionOutcome {
    if let Some(score) = breakdown.criterion(criterion) {
        return CriterionOutcome::Scored {
            score: score.score,
            weight: score.weight,
        };
    }
    let reason = breakdown
        .excluded
        .iter()
        .find(|e| e.criterion() == criterion)
        .map(|e| e.reason())
        .unwrap_or("not scored");
    CriterionOutcome::Excluded {
        reason: reason.to_string(),
    }
}

fn describe_constraint(criterion: Criterion, profile: &QueryProfile) -> String {
    match criterion {
        Criterion::Price => match profile.budget {
            Some(b) => format!("budget {:.0} (range {:.0}-{:.0})", b.ideal, b.min, b.max),
            None => "no budget".to_string(),
        },
        Criterion::Rooms => format!("at least {} rooms", profile.min_rooms),
        Criterion::Amenities => {
            if profile.amenity_preferences.is_empty() {
                return "no stated amenity preferences".to_string();
            }
            let wanted: Vec<String> = profile
                .amenity_preferences
                .iter()
                .map(|p| format!("{} ({:.1})", p.amenity, p.priority))
                .collect();
            format!("prefers {}", wanted.join(", "))
        }
    }
}

fn describe_observed(criterion: Criterion, candidate: &Candidate) -> String {
    match criterion {
        Criterion::Price => candidate
            .price
            .map(|p| format!("price {:.0}", p))
            .unwrap_or_else(|| "price unknown".to_string()),
        Criterion::Rooms => candidate
            .rooms
            .map(|r| format!("{} rooms", r))
            .unwrap_or_else(|| "rooms unknown".to_string()),
        Criterion::Amenities => format!("{} nearby amenities", candidate.nearby_amenities.len()),
    }
}

fn summarize(scored: &Scored) -> String {
    let parts: BTreeMap<Criterion, String> = scored
        .breakdown
        .criteria
        .iter()
        .map(|c| (c.criterion, format!("{} {:.2}x{:.2}", c.criterion, c.score, c.weight)))
        .collect();
    let parts: Vec<String> = parts.into_values().collect();

    format!(
        "score {:.3} = base {:.3} + history {:.2} [{}]",
        scored.score,
        scored.breakdown.score,
        scored.bonus,
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmenityType, NearbyAmenity, TransportMode};

    struct FixedClassifier(Classification);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, CollaboratorError> {
            Err(CollaboratorError::Unavailable("model offline".to_string()))
        }
    }

    struct FixedSource(Vec<Candidate>);

    #[async_trait]
    impl CandidateSource for FixedSource {
        async fn fetch_candidates(
            &self,
            _constraints: &ExtractedConstraints,
        ) -> Result<Vec<Candidate>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandidateSource for FailingSource {
        async fn fetch_candidates(
            &self,
            _constraints: &ExtractedConstraints,
        ) -> Result<Vec<Candidate>, CollaboratorError> {
            Err(CollaboratorError::Unavailable("listing store down".to_string()))
        }
    }

    struct Flat(f64);

    impl HistoricalBonus for Flat {
        fn bonus(&self, _candidate: &Candidate) -> f64 {
            self.0
        }
    }

    fn create_candidate(id: &str, price: Option<f64>, rooms: Option<u32>) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: None,
            price,
            rooms,
            area: None,
            location: "Godoy Cruz".to_string(),
            latitude: None,
            longitude: None,
            nearby_amenities: vec![],
        }
    }

    fn rooms_profile(min_rooms: u32) -> QueryProfile {
        QueryProfile {
            min_rooms,
            ..Default::default()
        }
    }

    #[test]
    fn test_ties_broken_by_cheaper_price() {
        let pipeline = RankingPipeline::default();
        let candidates = vec![
            create_candidate("x", Some(100_000.0), Some(4)),
            create_candidate("y", Some(90_000.0), Some(4)),
        ];

        let results = pipeline.rank(&rooms_profile(5), candidates, None, None);

        assert_eq!(results.len(), 2);
        assert!((results[0].score - 0.8).abs() < 1e-12);
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].candidate.id, "y");
        assert_eq!(results[1].candidate.id, "x");
    }

    #[test]
    fn test_unpriced_candidates_sort_last_on_ties() {
        let pipeline = RankingPipeline::default();
        let candidates = vec![
            create_candidate("unpriced", None, Some(2)),
            create_candidate("priced", Some(500_000.0), Some(2)),
        ];

        let results = pipeline.rank(&rooms_profile(2), candidates, None, None);
        assert_eq!(results[0].candidate.id, "priced");
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let pipeline = RankingPipeline::default();
        let profile = QueryProfile {
            budget: Some(crate::models::Budget::around(100_000.0)),
            min_rooms: 3,
            ..Default::default()
        };
        let candidates: Vec<Candidate> = (0..25)
            .map(|i| create_candidate(&i.to_string(), Some(60_000.0 + (i % 7) as f64 * 10_000.0), Some(i % 5)))
            .collect();

        let first = pipeline.rank(&profile, candidates, None, Some(25));
        let again = pipeline.rank(
            &profile,
            first.iter().map(|r| r.candidate.clone()).collect(),
            None,
            Some(25),
        );

        let ids = |results: &[RankedResult]| results.iter().map(|r| r.candidate.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&again));
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_respects_limit() {
        let pipeline = RankingPipeline::default();
        let candidates: Vec<Candidate> = (0..30)
            .map(|i| create_candidate(&i.to_string(), Some(100_000.0), Some(i % 4)))
            .collect();

        assert_eq!(pipeline.rank(&rooms_profile(2), candidates.clone(), None, None).len(), DEFAULT_LIMIT);
        assert_eq!(pipeline.rank(&rooms_profile(2), candidates.clone(), None, Some(3)).len(), 3);
        assert_eq!(pipeline.rank(&rooms_profile(2), candidates[..2].to_vec(), None, Some(5)).len(), 2);
    }

    #[test]
    fn test_history_bonus_is_clamped() {
        let pipeline = RankingPipeline::default();
        let candidates = vec![create_candidate("a", Some(100_000.0), Some(1))];

        let boosted = pipeline.rank(&rooms_profile(2), candidates.clone(), Some(&Flat(5.0)), None);
        assert_eq!(boosted[0].history_bonus, MAX_HISTORY_BONUS);
        assert!((boosted[0].base_score - 0.5).abs() < 1e-12);
        assert!((boosted[0].score - 0.7).abs() < 1e-12);

        let penalized = pipeline.rank(&rooms_profile(2), candidates.clone(), Some(&Flat(-1.0)), None);
        assert_eq!(penalized[0].history_bonus, 0.0);

        let full = pipeline.rank(&rooms_profile(1), candidates, Some(&Flat(0.2)), None);
        assert_eq!(full[0].score, 1.0);
        assert_eq!(clamp_bonus(f64::NAN), 0.0);
    }

    #[test]
    fn test_explanation_lists_every_criterion() {
        let pipeline = RankingPipeline::default();
        let mut candidate = create_candidate("a", Some(110_000.0), Some(2));
        candidate.nearby_amenities = vec![NearbyAmenity::at_distance(AmenityType::BusStop, 250.0)];
        let profile = QueryProfile {
            transport_mode: Some(TransportMode::Walk),
            location: Some("Godoy Cruz".to_string()),
            location_importance: 0.9,
            ..Default::default()
        };

        let results = pipeline.rank(&profile, vec![candidate], None, None);
        let explanation = &results[0].explanation;

        assert_eq!(explanation.criteria.len(), 3);
        assert!(matches!(
            explanation.criteria[0].outcome,
            CriterionOutcome::Excluded { .. }
        ));
        assert!(matches!(explanation.criteria[1].outcome, CriterionOutcome::Scored { .. }));
        assert_eq!(explanation.price_categories.len(), 4);
        assert_eq!(explanation.price_category.as_deref(), Some("expensive"));

        let stop = &explanation.amenities[0];
        assert_eq!(stop.distance_membership, 1.0);
        assert_eq!(stop.base_weight, 0.8);
        let access = stop.accessibility.as_ref().unwrap();
        assert_eq!(access.classification, crate::models::AccessibilityBand::Close);
        assert_eq!(stop.distance_bands, access.memberships);
        assert_eq!(explanation.location.as_ref().unwrap().importance, 0.9);

        let breakdown = results[0].breakdown();
        assert!(!breakdown.contains_key(&Criterion::Price));
        assert_eq!(breakdown[&Criterion::Rooms], (1.0, 0.2));
    }

    #[test]
    fn test_explanation_without_transport_mode() {
        use crate::models::AccessibilityBand;

        let pipeline = RankingPipeline::default();
        let mut candidate = create_candidate("a", None, Some(2));
        candidate.nearby_amenities = vec![
            NearbyAmenity::at_distance(AmenityType::Park, 350.0),
            NearbyAmenity {
                distance_m: None,
                ..NearbyAmenity::at_distance(AmenityType::Hospital, 0.0)
            },
        ];

        let results = pipeline.rank(&rooms_profile(2), vec![candidate], None, None);
        let explanation = &results[0].explanation;
        assert!(explanation.price_categories.is_empty());
        assert_eq!(explanation.price_category, None);

        // Generic bands when no mode is known
        let park = &explanation.amenities[0];
        assert!(park.accessibility.is_none());
        assert_eq!(park.distance_bands.len(), 4);
        assert_eq!(park.distance_bands[&AccessibilityBand::Close], 1.0);
        assert_eq!(park.distance_bands[&AccessibilityBand::VeryClose], 0.0);

        // No distance, no bands
        assert!(explanation.amenities[1].distance_bands.is_empty());
    }

    #[tokio::test]
    async fn test_run_traces_every_stage() {
        let pipeline = RankingPipeline::default();
        let classifier = FixedClassifier(Classification {
            intent: Some(QueryIntent::FilteredSearch),
            constraints: ExtractedConstraints {
                budget: Some(150_000.0),
                min_rooms: Some(2),
                ..Default::default()
            },
        });
        let source = FixedSource(vec![
            create_candidate("a", Some(140_000.0), Some(2)),
            create_candidate("b", Some(300_000.0), Some(1)),
        ]);

        let outcome = pipeline
            .run(&RankingRequest::new("casa 2 habitaciones"), &classifier, &source, None)
            .await
            .unwrap();

        assert_eq!(outcome.stages, PipelineStage::SUCCESS.to_vec());
        assert_eq!(outcome.intent, QueryIntent::FilteredSearch);
        assert_eq!(outcome.total_candidates, 2);
        assert_eq!(outcome.results[0].candidate.id, "a");
        assert!((outcome.results[0].score - 0.9692).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_explicit_constraints_override_classified() {
        let pipeline = RankingPipeline::default();
        let classifier = FixedClassifier(Classification {
            intent: None,
            constraints: ExtractedConstraints {
                min_rooms: Some(1),
                ..Default::default()
            },
        });
        let source = FixedSource(vec![create_candidate("a", None, Some(2))]);
        let request = RankingRequest {
            text: "casa".to_string(),
            constraints: ExtractedConstraints {
                min_rooms: Some(4),
                ..Default::default()
            },
            limit: None,
        };

        let outcome = pipeline.run(&request, &classifier, &source, None).await.unwrap();
        assert_eq!(outcome.intent, QueryIntent::Simple);
        assert_eq!(outcome.profile.min_rooms, 4);
        assert!((outcome.results[0].score - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_collaborator_failures_surface() {
        let pipeline = RankingPipeline::default();
        let request = RankingRequest::new("casa");

        let err = pipeline
            .run(&request, &FailingClassifier, &FixedSource(vec![]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Classification(_)));
        assert_eq!(err.failed_after(), PipelineStage::Classified);
        assert_eq!(err.stages(), vec![PipelineStage::Classified, PipelineStage::Failed]);

        let classifier = FixedClassifier(Classification::default());
        let err = pipeline
            .run(&request, &classifier, &FailingSource, None)
            .await
            .unwrap_err();
        assert_eq!(err.failed_after(), PipelineStage::ConstraintsExtracted);
        assert_eq!(
            err.stages(),
            vec![
                PipelineStage::Classified,
                PipelineStage::ConstraintsExtracted,
                PipelineStage::Failed
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_candidate_set() {
        let pipeline = RankingPipeline::default();
        let outcome = pipeline
            .run(
                &RankingRequest::new("casa"),
                &FixedClassifier(Classification::default()),
                &FixedSource(vec![]),
                None,
            )
            .await
            .unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.total_candidates, 0);
        assert_eq!(outcome.stages.last(), Some(&PipelineStage::Explained));
    }
}
