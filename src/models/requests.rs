use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{
    AmenityPreference, AmenityType, Candidate, ExtractedConstraints, PriorityRank, TransportMode,
};

/// Request to rank a batch of listings against a free-text query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankListingsRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    #[validate(length(min = 1))]
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<usize>,
    #[validate(nested)]
    #[serde(default)]
    pub constraints: Option<ConstraintsInput>,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Constraints stated explicitly by the caller
///
/// Amenity priorities use the 1 (most wanted) to 5 (least wanted) scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsInput {
    #[serde(default)]
    pub budget: Option<f64>,
    #[validate(range(max = 50))]
    #[serde(default)]
    pub min_rooms: Option<u32>,
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub transport_mode: Option<TransportMode>,
    #[serde(default)]
    pub amenities: Vec<AmenityPriorityInput>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmenityPriorityInput {
    #[serde(rename = "type")]
    pub amenity: AmenityType,
    pub priority: u8,
}

impl ConstraintsInput {
    /// Convert into engine constraints, rejecting values the engine cannot use
    pub fn to_constraints(&self) -> Result<ExtractedConstraints, String> {
        if let Some(budget) = self.budget {
            if !(budget.is_finite() && budget > 0.0) {
                return Err(format!("budget must be a positive amount, got {}", budget));
            }
        }

        let amenity_preferences = self
            .amenities
            .iter()
            .map(|a| {
                PriorityRank::new(a.priority)
                    .map(|rank| AmenityPreference::from_rank(a.amenity, rank))
                    .ok_or_else(|| {
                        format!("priority for {} must be between 1 and 5, got {}", a.amenity, a.priority)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExtractedConstraints {
            budget: self.budget,
            min_rooms: self.min_rooms,
            location: self.location.clone(),
            transport_mode: self.transport_mode,
            amenity_preferences,
        })
    }
}

/// Request to compare transport modes for one distance
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityRequest {
    #[validate(range(min = 0.0))]
    pub distance_m: f64,
    /// Modes to compare; every mode when empty
    #[serde(default)]
    pub modes: Vec<TransportMode>,
}

/// Request to record a user's interaction with a listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordInteractionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "listing_id")]
    pub listing_id: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub score: Option<f64>,
}
