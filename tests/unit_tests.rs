// Unit tests for Casa Match

use casa_match::core::{
    aggregator::{amenities_score, rooms_score, ScoreAggregator},
    distance::haversine_distance_m,
    evaluators::{AmenityImportanceEvaluator, DistanceEvaluator, PriceCategory, PriceEvaluator},
    membership::{fuzzy_and, fuzzy_or, gaussian, trapezoidal, triangular, weighted_average},
    profile::QueryProfileBuilder,
    transport::TransportAccessibilityEvaluator,
};
use casa_match::models::{
    AccessibilityBand, AmenityPreference, AmenityType, Candidate, Criterion, ExtractedConstraints,
    NearbyAmenity, PriorityRank, QueryProfile, ScoringWeights, TransportMode,
};

fn create_candidate(price: Option<f64>, rooms: Option<u32>, amenities: Vec<NearbyAmenity>) -> Candidate {
    Candidate {
        id: "listing".to_string(),
        name: Some("Casa de prueba".to_string()),
        price,
        rooms,
        area: Some(80.0),
        location: "Godoy Cruz".to_string(),
        latitude: None,
        longitude: None,
        nearby_amenities: amenities,
    }
}

fn create_profile(budget: Option<f64>, min_rooms: u32) -> QueryProfile {
    QueryProfileBuilder::new().build(
        "",
        &ExtractedConstraints {
            budget,
            min_rooms: Some(min_rooms),
            ..Default::default()
        },
    )
}

#[test]
fn test_membership_degrees_stay_in_unit_interval() {
    for step in -50..250 {
        let x = step as f64 * 10.0;
        for value in [
            triangular(x, 0.0, 500.0, 1000.0),
            trapezoidal(x, 100.0, 300.0, 600.0, 1500.0),
            gaussian(x, 750.0, 200.0).unwrap(),
        ] {
            assert!((0.0..=1.0).contains(&value), "x = {}, value = {}", x, value);
        }
    }
}

#[test]
fn test_fuzzy_operators_and_defuzzification() {
    assert_eq!(fuzzy_and(&[0.2, 0.7]), 0.2);
    assert_eq!(fuzzy_or(&[0.2, 0.7]), 0.7);
    assert_eq!(weighted_average(&[0.5], &[0.0]), 0.0);
    assert!((weighted_average(&[1.0, 0.5], &[0.2, 0.3]) - 0.7).abs() < 1e-12);
}

#[test]
fn test_walk_200m_is_very_close() {
    let evaluator = TransportAccessibilityEvaluator::new();
    let result = evaluator.evaluate(200.0, TransportMode::Walk);

    assert_eq!(result.classification, AccessibilityBand::VeryClose);
    assert_eq!(result.accessibility_score, 1.0);
    assert_eq!(result.time_minutes, 2.4);
}

#[test]
fn test_walk_5000m_is_very_far() {
    let evaluator = TransportAccessibilityEvaluator::new();
    let result = evaluator.evaluate(5000.0, TransportMode::Walk);

    assert_eq!(result.classification, AccessibilityBand::VeryFar);
    assert_eq!(result.accessibility_score, 0.0);
}

#[test]
fn test_same_distance_differs_by_mode() {
    let evaluator = TransportAccessibilityEvaluator::new();
    let walk = evaluator.evaluate(1200.0, TransportMode::Walk);
    let car = evaluator.evaluate(1200.0, TransportMode::Car);

    assert_eq!(walk.classification, AccessibilityBand::Far);
    assert_eq!(car.classification, AccessibilityBand::Close);
    assert_eq!(walk.time_minutes, 14.4);
    assert_eq!(car.time_minutes, 2.4);
}

#[test]
fn test_price_evaluator_categories() {
    let evaluator = PriceEvaluator::default();
    let degrees = evaluator.evaluate(20_000.0);

    assert_eq!(degrees[&PriceCategory::VeryCheap], 1.0);
    assert_eq!(degrees[&PriceCategory::Cheap], 0.0);
    assert_eq!(evaluator.dominant_category(140_000.0), Some(PriceCategory::Expensive));
    assert_eq!(evaluator.dominant_category(500_000.0), None);
}

#[test]
fn test_distance_evaluator_generic_and_transport() {
    let evaluator = DistanceEvaluator::default();

    let generic = evaluator.evaluate(350.0, None);
    assert_eq!(generic[&AccessibilityBand::Close], 1.0);

    let by_bus = evaluator.evaluate(350.0, Some(TransportMode::Bus));
    assert!(by_bus[&AccessibilityBand::Close] > 0.0);
    assert_eq!(by_bus.len(), 5);
}

#[test]
fn test_amenity_importance_uses_max() {
    let evaluator = AmenityImportanceEvaluator::new();
    let prefs = vec![AmenityPreference::from_rank(AmenityType::Supermarket, PriorityRank::new(2).unwrap())];

    assert!((evaluator.evaluate(AmenityType::Supermarket, &prefs) - 0.8).abs() < 1e-12);
    assert_eq!(evaluator.evaluate(AmenityType::Hospital, &prefs), 0.8);
}

#[test]
fn test_budget_and_rooms_aggregate() {
    let aggregator = ScoreAggregator::default();
    let result = aggregator.score(
        &create_candidate(Some(140_000.0), Some(2), vec![]),
        &create_profile(Some(150_000.0), 2),
        &ScoringWeights::default(),
    );

    let price = result.criterion(Criterion::Price).unwrap().score;
    assert!((price - 0.949).abs() < 1e-3);
    assert_eq!(result.criterion(Criterion::Rooms).unwrap().score, 1.0);
    assert!(result.criterion(Criterion::Amenities).is_none());
    assert!((result.score - 0.9696).abs() < 1e-3);
}

#[test]
fn test_missing_budget_renormalizes() {
    let aggregator = ScoreAggregator::default();
    let amenities = vec![
        NearbyAmenity::at_distance(AmenityType::EducationCentre, 400.0),
        NearbyAmenity::at_distance(AmenityType::Park, 2000.0),
    ];
    let candidate = create_candidate(Some(1_000_000.0), Some(3), amenities);
    let result = aggregator.score(&candidate, &create_profile(None, 3), &ScoringWeights::default());

    assert!(result.criterion(Criterion::Price).is_none());
    let amenity = amenities_score(&candidate);
    let expected = (1.0 * 0.20 + amenity * 0.50) / 0.70;
    assert!((result.score - expected).abs() < 1e-12);

    // A very expensive listing is not penalized when no budget was given
    let cheap = create_candidate(Some(10_000.0), Some(3), candidate.nearby_amenities.clone());
    let cheap_result = aggregator.score(&cheap, &create_profile(None, 3), &ScoringWeights::default());
    assert_eq!(result.score, cheap_result.score);
}

#[test]
fn test_rooms_partial_credit() {
    assert_eq!(rooms_score(&create_candidate(None, Some(2), vec![]), 4), 0.5);
    assert_eq!(rooms_score(&create_candidate(None, Some(6), vec![]), 4), 1.0);
}

#[test]
fn test_haversine_in_metres() {
    // Godoy Cruz centre to Ciudad de Mendoza centre, roughly 3.5 km
    let distance = haversine_distance_m(-32.9193, -68.8400, -32.8895, -68.8446);
    assert!(distance > 3000.0 && distance < 4000.0, "got {}", distance);
}
