use crate::core::distance::amenity_distance_m;
use crate::core::evaluators::PriceEvaluator;
use crate::core::membership::{trapezoidal, weighted_average};
use crate::models::{AmenityType, Candidate, Criterion, CriterionScore, NearbyAmenity, QueryProfile, ScoringWeights};

/// Why a criterion was left out of a candidate's aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// The query states no budget
    NoBudget,
    /// The listing has no nearby amenities
    NoAmenities,
}

impl Exclusion {
    pub fn criterion(self) -> Criterion {
        match self {
            Exclusion::NoBudget => Criterion::Price,
            Exclusion::NoAmenities => Criterion::Amenities,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Exclusion::NoBudget => "no budget in query",
            Exclusion::NoAmenities => "listing has no nearby amenities",
        }
    }
}

/// Aggregate compatibility of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// Weighted average of the criteria present, in [0, 1]
    pub score: f64,
    pub criteria: Vec<CriterionScore>,
    pub excluded: Vec<Exclusion>,
}

impl CandidateScore {
    pub fn criterion(&self, criterion: Criterion) -> Option<&CriterionScore> {
        self.criteria.iter().find(|c| c.criterion == criterion)
    }
}

/// Combines per-criterion scores into one compatibility score per candidate
///
/// Criteria that do not apply are excluded from the weighted average rather
/// than counted as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreAggregator {
    price: PriceEvaluator,
}

impl ScoreAggregator {
    pub fn new(price: PriceEvaluator) -> Self {
        Self { price }
    }

    pub fn price_evaluator(&self) -> &PriceEvaluator {
        &self.price
    }

    /// Score `candidate` against `profile` using the caller's category weights
    pub fn score(
        &self,
        candidate: &Candidate,
        profile: &QueryProfile,
        weights: &ScoringWeights,
    ) -> CandidateScore {
        let mut criteria = Vec::with_capacity(3);
        let mut excluded = Vec::new();

        match profile.budget {
            Some(budget) => criteria.push(CriterionScore {
                criterion: Criterion::Price,
                score: self.price_score(candidate, budget.ideal),
                weight: weights.price,
            }),
            None => excluded.push(Exclusion::NoBudget),
        }

        criteria.push(CriterionScore {
            criterion: Criterion::Rooms,
            score: rooms_score(candidate, profile.min_rooms),
            weight: weights.rooms,
        });

        if candidate.nearby_amenities.is_empty() {
            excluded.push(Exclusion::NoAmenities);
        } else {
            criteria.push(CriterionScore {
                criterion: Criterion::Amenities,
                score: amenities_score(candidate),
                weight: weights.amenities,
            });
        }

        let scores: Vec<f64> = criteria.iter().map(|c| c.score).collect();
        let weights: Vec<f64> = criteria.iter().map(|c| c.weight).collect();
        let score = weighted_average(&scores, &weights).clamp(0.0, 1.0);

        CandidateScore {
            score,
            criteria,
            excluded,
        }
    }

    // A listing without a price scores zero on an active price criterion.
    fn price_score(&self, candidate: &Candidate, budget: f64) -> f64 {
        candidate
            .price
            .map(|price| self.price.budget_score(price, budget))
            .unwrap_or(0.0)
    }
}

/// 1.0 when the listing has enough rooms, otherwise the fraction it has
pub fn rooms_score(candidate: &Candidate, min_rooms: u32) -> f64 {
    let Some(rooms) = candidate.rooms else {
        return 0.0;
    };
    if min_rooms == 0 || rooms >= min_rooms {
        return 1.0;
    }
    f64::from(rooms) / f64::from(min_rooms)
}

/// Reachability of an amenity from its distance
///
/// 1.0 up to the type's ideal distance, falling linearly to 0.0 at three
/// times that distance. Unknown distance scores 0.0.
pub fn amenity_membership(candidate: &Candidate, amenity: &NearbyAmenity) -> f64 {
    let ideal = amenity.amenity_type.ideal_distance_m();
    amenity_distance_m(candidate, amenity)
        .map(|distance| trapezoidal(distance, 0.0, 0.0, ideal, ideal * 3.0))
        .unwrap_or(0.0)
}

/// Sum of reachability × base weight over the listing's amenities, divided by
/// the size of the amenity catalogue
///
/// Normalizing by the catalogue rather than the listing's own amenity count
/// penalizes listings with sparse amenity data.
pub fn amenities_score(candidate: &Candidate) -> f64 {
    let total: f64 = candidate
        .nearby_amenities
        .iter()
        .map(|amenity| amenity_membership(candidate, amenity) * amenity.amenity_type.base_weight())
        .sum();

    (total / AmenityType::CATALOGUE.len() as f64).clamp(0.0, 1.0)
}
