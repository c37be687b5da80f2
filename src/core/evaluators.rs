use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::membership::{fuzzy_or, ConfigurationError, MembershipFunction, Shape};
use crate::core::transport::TransportAccessibilityEvaluator;
use crate::models::{AccessibilityBand, AmenityPreference, AmenityType, TransportMode};

/// Fuzzy price category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    VeryCheap,
    Cheap,
    Moderate,
    Expensive,
}

impl PriceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceCategory::VeryCheap => "very_cheap",
            PriceCategory::Cheap => "cheap",
            PriceCategory::Moderate => "moderate",
            PriceCategory::Expensive => "expensive",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Break-points of the four price categories
///
/// The first three are triangles `[start, peak, end]`, the last a trapezoid
/// `[start, plateau start, plateau end, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBands {
    pub very_cheap: [f64; 3],
    pub cheap: [f64; 3],
    pub moderate: [f64; 3],
    pub expensive: [f64; 4],
}

impl Default for PriceBands {
    fn default() -> Self {
        Self {
            very_cheap: [0.0, 20_000.0, 40_000.0],
            cheap: [20_000.0, 55_000.0, 70_000.0],
            moderate: [55_000.0, 95_000.0, 120_000.0],
            expensive: [95_000.0, 120_000.0, 160_000.0, 200_000.0],
        }
    }
}

/// Price evaluator: fuzzy categories plus the budget-deviation score
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEvaluator {
    categories: [(PriceCategory, MembershipFunction); 4],
    tolerance_ratio: f64,
}

impl PriceEvaluator {
    /// Default budget tolerance, as a share of the budget
    pub const DEFAULT_TOLERANCE: f64 = 0.3;

    pub fn new(bands: &PriceBands, tolerance_ratio: f64) -> Result<Self, ConfigurationError> {
        if !(tolerance_ratio.is_finite() && tolerance_ratio >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "budget tolerance",
                value: tolerance_ratio,
            });
        }

        let [a, b, c] = bands.very_cheap;
        let very_cheap = MembershipFunction::triangular(a, b, c)?;
        let [a, b, c] = bands.cheap;
        let cheap = MembershipFunction::triangular(a, b, c)?;
        let [a, b, c] = bands.moderate;
        let moderate = MembershipFunction::triangular(a, b, c)?;
        let [a, b, c, d] = bands.expensive;
        let expensive = MembershipFunction::trapezoidal(a, b, c, d)?;

        Ok(Self {
            categories: [
                (PriceCategory::VeryCheap, very_cheap),
                (PriceCategory::Cheap, cheap),
                (PriceCategory::Moderate, moderate),
                (PriceCategory::Expensive, expensive),
            ],
            tolerance_ratio,
        })
    }

    pub fn tolerance_ratio(&self) -> f64 {
        self.tolerance_ratio
    }

    /// Degree of membership of `price` in each category; degrees may overlap
    pub fn evaluate(&self, price: f64) -> BTreeMap<PriceCategory, f64> {
        self.categories
            .iter()
            .map(|(category, function)| (*category, function.evaluate(price)))
            .collect()
    }

    /// Category with the highest degree, if any is above zero
    pub fn dominant_category(&self, price: f64) -> Option<PriceCategory> {
        self.evaluate(price)
            .into_iter()
            .filter(|(_, degree)| *degree > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(category, _)| category)
    }

    /// Closeness of `price` to `budget`:
    /// `max(0, 1 - |price - budget| / (budget + tolerance))`
    pub fn budget_score(&self, price: f64, budget: f64) -> f64 {
        if !(price.is_finite() && budget.is_finite()) || budget <= 0.0 {
            return 0.0;
        }
        let tolerance = self.tolerance_ratio * budget;
        let deviation = (price - budget).abs();
        (1.0 - deviation / (budget + tolerance)).clamp(0.0, 1.0)
    }
}

impl Default for PriceEvaluator {
    fn default() -> Self {
        let bands = PriceBands::default();
        Self {
            categories: [
                (PriceCategory::VeryCheap, triangle(bands.very_cheap)),
                (PriceCategory::Cheap, triangle(bands.cheap)),
                (PriceCategory::Moderate, triangle(bands.moderate)),
                (PriceCategory::Expensive, trapezoid(bands.expensive)),
            ],
            tolerance_ratio: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Distance evaluator: transport-aware when a mode is given, generic otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceEvaluator {
    transport: TransportAccessibilityEvaluator,
    generic: [(AccessibilityBand, MembershipFunction); 4],
}

impl DistanceEvaluator {
    pub fn new(transport: TransportAccessibilityEvaluator) -> Self {
        Self {
            transport,
            generic: [
                (AccessibilityBand::VeryClose, triangle([0.0, 100.0, 200.0])),
                (AccessibilityBand::Close, triangle([100.0, 350.0, 500.0])),
                (AccessibilityBand::Moderate, triangle([350.0, 750.0, 1000.0])),
                (
                    AccessibilityBand::Far,
                    MembershipFunction::from_trusted(Shape::Gaussian {
                        center: 1500.0,
                        sigma: 500.0,
                    }),
                ),
            ],
        }
    }

    pub fn transport(&self) -> &TransportAccessibilityEvaluator {
        &self.transport
    }

    /// Membership degrees of `distance_m` in each distance band
    pub fn evaluate(
        &self,
        distance_m: f64,
        mode: Option<TransportMode>,
    ) -> BTreeMap<AccessibilityBand, f64> {
        match mode {
            Some(mode) => self.transport.evaluate(distance_m, mode).memberships,
            None => self
                .generic
                .iter()
                .map(|(band, function)| (*band, function.evaluate(distance_m)))
                .collect(),
        }
    }
}

impl Default for DistanceEvaluator {
    fn default() -> Self {
        Self::new(TransportAccessibilityEvaluator::new())
    }
}

/// Combines an amenity's objective importance with the user's interest in it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmenityImportanceEvaluator;

impl AmenityImportanceEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// `fuzzy_or(base_weight, interest)`; the first preference for the type wins
    pub fn evaluate(&self, amenity: AmenityType, preferences: &[AmenityPreference]) -> f64 {
        let interest = preferences
            .iter()
            .find(|p| p.amenity == amenity)
            .map(|p| p.priority)
            .unwrap_or(0.0);
        fuzzy_or(&[amenity.base_weight(), interest])
    }
}

// Built-in break-points are known to be ordered.
fn triangle([a, b, c]: [f64; 3]) -> MembershipFunction {
    MembershipFunction::from_trusted(Shape::Triangular { a, b, c })
}

fn trapezoid([a, b, c, d]: [f64; 4]) -> MembershipFunction {
    MembershipFunction::from_trusted(Shape::Trapezoidal { a, b, c, d })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriorityRank;

    #[test]
    fn test_price_categories_overlap() {
        let evaluator = PriceEvaluator::default();
        let degrees = evaluator.evaluate(110_000.0);

        assert_eq!(degrees.len(), 4);
        assert_eq!(degrees[&PriceCategory::VeryCheap], 0.0);
        assert_eq!(degrees[&PriceCategory::Cheap], 0.0);
        assert!((degrees[&PriceCategory::Moderate] - 0.4).abs() < 1e-9);
        assert!((degrees[&PriceCategory::Expensive] - 0.6).abs() < 1e-9);
        assert_eq!(evaluator.dominant_category(110_000.0), Some(PriceCategory::Expensive));
    }

    #[test]
    fn test_price_degrees_in_unit_interval() {
        let evaluator = PriceEvaluator::default();
        for price in (0..300).map(|i| i as f64 * 1000.0) {
            for degree in evaluator.evaluate(price).values() {
                assert!((0.0..=1.0).contains(degree), "price {} degree {}", price, degree);
            }
        }
    }

    #[test]
    fn test_budget_score() {
        let evaluator = PriceEvaluator::default();
        let score = evaluator.budget_score(140_000.0, 150_000.0);
        assert!((score - (1.0 - 10_000.0 / 195_000.0)).abs() < 1e-12);

        assert_eq!(evaluator.budget_score(150_000.0, 150_000.0), 1.0);
        assert_eq!(evaluator.budget_score(1_000_000.0, 150_000.0), 0.0);
        assert_eq!(evaluator.budget_score(100_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_custom_price_bands_validated() {
        let mut bands = PriceBands::default();
        bands.cheap = [70_000.0, 55_000.0, 20_000.0];
        assert!(PriceEvaluator::new(&bands, 0.3).is_err());
        assert!(PriceEvaluator::new(&PriceBands::default(), -0.1).is_err());
        assert_eq!(
            PriceEvaluator::new(&PriceBands::default(), 0.3).unwrap(),
            PriceEvaluator::default()
        );
    }

    #[test]
    fn test_generic_distance_bands() {
        let evaluator = DistanceEvaluator::default();
        let degrees = evaluator.evaluate(100.0, None);

        assert_eq!(degrees[&AccessibilityBand::VeryClose], 1.0);
        assert_eq!(degrees[&AccessibilityBand::Close], 0.0);
        assert!(!degrees.contains_key(&AccessibilityBand::VeryFar));

        let far = evaluator.evaluate(1500.0, None);
        assert_eq!(far[&AccessibilityBand::Far], 1.0);
        assert_eq!(far[&AccessibilityBand::Moderate], 0.0);
    }

    #[test]
    fn test_distance_delegates_to_transport() {
        let evaluator = DistanceEvaluator::default();
        let degrees = evaluator.evaluate(100.0, Some(TransportMode::Walk));
        let expected = evaluator.transport().evaluate(100.0, TransportMode::Walk).memberships;

        assert_eq!(degrees, expected);
        assert_eq!(degrees.len(), 5);
    }

    #[test]
    fn test_amenity_importance() {
        let evaluator = AmenityImportanceEvaluator::new();

        // No declared interest: base weight alone
        assert_eq!(evaluator.evaluate(AmenityType::Park, &[]), 0.6);
        assert_eq!(evaluator.evaluate(AmenityType::Other, &[]), 0.5);

        // Strong interest lifts a modest amenity
        let prefs = [AmenityPreference::from_rank(AmenityType::Park, PriorityRank::new(1).unwrap())];
        assert_eq!(evaluator.evaluate(AmenityType::Park, &prefs), 1.0);

        // Weak interest never lowers an important one
        let prefs = [AmenityPreference::from_rank(
            AmenityType::EducationCentre,
            PriorityRank::new(5).unwrap(),
        )];
        assert_eq!(evaluator.evaluate(AmenityType::EducationCentre, &prefs), 0.9);
    }
}
