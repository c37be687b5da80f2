use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::transport::AccessibilityEvaluation;

/// Kind of point of interest near a listing
///
/// Each variant owns a base importance weight and an ideal walking distance.
/// `Other` absorbs labels the catalogue does not know about and is not
/// counted as part of the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum AmenityType {
    Park,
    CommercialCentre,
    Hospital,
    EducationCentre,
    BusStop,
    Supermarket,
    University,
    Other,
}

impl AmenityType {
    /// Every amenity type the system cares about
    pub const CATALOGUE: [AmenityType; 7] = [
        AmenityType::Park,
        AmenityType::CommercialCentre,
        AmenityType::Hospital,
        AmenityType::EducationCentre,
        AmenityType::BusStop,
        AmenityType::Supermarket,
        AmenityType::University,
    ];

    /// Objective importance of this amenity, independent of any user
    pub fn base_weight(self) -> f64 {
        match self {
            AmenityType::EducationCentre => 0.9,
            AmenityType::CommercialCentre => 0.7,
            AmenityType::Hospital => 0.8,
            AmenityType::Park => 0.6,
            AmenityType::BusStop => 0.8,
            AmenityType::Supermarket => 0.6,
            AmenityType::University => 0.8,
            AmenityType::Other => 0.5,
        }
    }

    /// Distance in metres up to which the amenity counts as fully reachable
    pub fn ideal_distance_m(self) -> f64 {
        match self {
            AmenityType::Park => 500.0,
            AmenityType::CommercialCentre => 1500.0,
            AmenityType::Hospital => 2000.0,
            AmenityType::EducationCentre => 1000.0,
            AmenityType::BusStop => 300.0,
            AmenityType::Supermarket => 800.0,
            AmenityType::University => 3000.0,
            AmenityType::Other => 1000.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AmenityType::Park => "park",
            AmenityType::CommercialCentre => "commercial_centre",
            AmenityType::Hospital => "hospital",
            AmenityType::EducationCentre => "education_centre",
            AmenityType::BusStop => "bus_stop",
            AmenityType::Supermarket => "supermarket",
            AmenityType::University => "university",
            AmenityType::Other => "other",
        }
    }

    /// Parse a free-form label, in English or Spanish
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "park" | "parque" | "plaza" => AmenityType::Park,
            "commercial_centre" | "commercial_center" | "centro_comercial" | "shopping" | "mall" => {
                AmenityType::CommercialCentre
            }
            "hospital" | "clinica" | "clínica" | "clinic" => AmenityType::Hospital,
            "education_centre" | "education_center" | "escuela" | "colegio" | "school" => {
                AmenityType::EducationCentre
            }
            "bus_stop" | "parada" | "parada_colectivo" | "transporte" | "transport" => {
                AmenityType::BusStop
            }
            "supermarket" | "supermercado" => AmenityType::Supermarket,
            "university" | "universidad" | "facultad" => AmenityType::University,
            _ => AmenityType::Other,
        }
    }
}

impl From<String> for AmenityType {
    fn from(value: String) -> Self {
        AmenityType::from_label(&value)
    }
}

impl From<AmenityType> for &'static str {
    fn from(value: AmenityType) -> Self {
        value.as_str()
    }
}

impl fmt::Display for AmenityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Way of travelling from a listing to an amenity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walk,
    Bike,
    Bus,
    Car,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Walk,
        TransportMode::Bike,
        TransportMode::Bus,
        TransportMode::Car,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
            TransportMode::Bus => "bus",
            TransportMode::Car => "car",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named distance interval, ordered from nearest to farthest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityBand {
    VeryClose,
    Close,
    Moderate,
    Far,
    VeryFar,
}

impl AccessibilityBand {
    pub const ALL: [AccessibilityBand; 5] = [
        AccessibilityBand::VeryClose,
        AccessibilityBand::Close,
        AccessibilityBand::Moderate,
        AccessibilityBand::Far,
        AccessibilityBand::VeryFar,
    ];

    /// Crisp accessibility score attached to the band
    pub fn step_score(self) -> f64 {
        match self {
            AccessibilityBand::VeryClose => 1.0,
            AccessibilityBand::Close => 0.8,
            AccessibilityBand::Moderate => 0.6,
            AccessibilityBand::Far => 0.3,
            AccessibilityBand::VeryFar => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessibilityBand::VeryClose => "very_close",
            AccessibilityBand::Close => "close",
            AccessibilityBand::Moderate => "moderate",
            AccessibilityBand::Far => "far",
            AccessibilityBand::VeryFar => "very_far",
        }
    }
}

impl fmt::Display for AccessibilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point of interest near a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyAmenity {
    #[serde(rename = "type")]
    pub amenity_type: AmenityType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl NearbyAmenity {
    pub fn at_distance(amenity_type: AmenityType, distance_m: f64) -> Self {
        Self {
            amenity_type,
            name: None,
            distance_m: Some(distance_m),
            latitude: None,
            longitude: None,
        }
    }
}

/// A listing to be ranked. Read-only input to scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub nearby_amenities: Vec<NearbyAmenity>,
}

impl Candidate {
    /// Helper to get coordinates when both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Declared interest in an amenity type
///
/// `priority` is an interest degree in [0, 1], 1 meaning most wanted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmenityPreference {
    #[serde(rename = "type")]
    pub amenity: AmenityType,
    pub priority: f64,
}

impl AmenityPreference {
    pub fn new(amenity: AmenityType, priority: f64) -> Self {
        Self {
            amenity,
            priority: if priority.is_finite() { priority.clamp(0.0, 1.0) } else { 0.0 },
        }
    }

    pub fn from_rank(amenity: AmenityType, rank: PriorityRank) -> Self {
        Self::new(amenity, rank.interest())
    }
}

/// Ranked priority as users state it: 1 = most wanted, 5 = least wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriorityRank(u8);

impl PriorityRank {
    pub fn new(rank: u8) -> Option<Self> {
        (1..=5).contains(&rank).then_some(Self(rank))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Interest degree in [0.2, 1.0]
    pub fn interest(self) -> f64 {
        (6.0 - f64::from(self.0)) / 5.0
    }
}

/// Stated budget with its implied tolerance band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub ideal: f64,
    pub min: f64,
    pub max: f64,
}

impl Budget {
    /// Band of 80% to 120% around the stated figure
    pub fn around(ideal: f64) -> Self {
        Self {
            ideal,
            min: ideal * 0.8,
            max: ideal * 1.2,
        }
    }
}

/// Normalized buyer request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProfile {
    pub budget: Option<Budget>,
    pub min_rooms: u32,
    pub location: Option<String>,
    pub location_importance: f64,
    pub amenity_preferences: Vec<AmenityPreference>,
    pub transport_mode: Option<TransportMode>,
}

impl Default for QueryProfile {
    fn default() -> Self {
        Self {
            budget: None,
            min_rooms: 1,
            location: None,
            location_importance: 0.5,
            amenity_preferences: Vec::new(),
            transport_mode: None,
        }
    }
}

/// Kind of request detected by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Simple,
    FilteredSearch,
    Recommendation,
}

/// Structured constraints extracted from a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedConstraints {
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub min_rooms: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub transport_mode: Option<TransportMode>,
    #[serde(default)]
    pub amenity_preferences: Vec<AmenityPreference>,
}

impl ExtractedConstraints {
    /// Overlay `explicit` on top of `self`, field by field
    pub fn overridden_by(mut self, explicit: &ExtractedConstraints) -> Self {
        if explicit.budget.is_some() {
            self.budget = explicit.budget;
        }
        if explicit.min_rooms.is_some() {
            self.min_rooms = explicit.min_rooms;
        }
        if explicit.location.is_some() {
            self.location = explicit.location.clone();
        }
        if explicit.transport_mode.is_some() {
            self.transport_mode = explicit.transport_mode;
        }
        if !explicit.amenity_preferences.is_empty() {
            self.amenity_preferences = explicit.amenity_preferences.clone();
        }
        self
    }

    /// Trim the location and drop it when blank
    pub fn normalized(mut self) -> Self {
        self.location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        self
    }
}

/// Scoring dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Price,
    Rooms,
    Amenities,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [Criterion::Price, Criterion::Rooms, Criterion::Amenities];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Price => "price",
            Criterion::Rooms => "rooms",
            Criterion::Amenities => "amenities",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category weights
///
/// Owned by the caller and handed to the aggregator on every call, so an
/// external optimizer can adjust them without touching engine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price: f64,
    pub rooms: f64,
    pub amenities: f64,
}

impl ScoringWeights {
    pub fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Price => self.price,
            Criterion::Rooms => self.rooms,
            Criterion::Amenities => self.amenities,
        }
    }

    pub fn sum(&self) -> f64 {
        self.price + self.rooms + self.amenities
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.30,
            rooms: 0.20,
            amenities: 0.50,
        }
    }
}

/// Score of one criterion together with the weight that applied to it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub score: f64,
    pub weight: f64,
}

/// How a criterion took part in a candidate's aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CriterionOutcome {
    Scored { score: f64, weight: f64 },
    Excluded { reason: String },
}

/// One explanation line: what was asked, what the listing offers, how it scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionExplanation {
    pub criterion: Criterion,
    pub constraint: String,
    pub observed: String,
    pub outcome: CriterionOutcome,
}

/// Assessment of one nearby amenity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenityAssessment {
    #[serde(rename = "type")]
    pub amenity_type: AmenityType,
    pub name: Option<String>,
    pub distance_m: Option<f64>,
    pub distance_membership: f64,
    /// Degree of the distance in each band, under the transport mode when one is set
    pub distance_bands: BTreeMap<AccessibilityBand, f64>,
    pub base_weight: f64,
    pub importance: f64,
    pub accessibility: Option<AccessibilityEvaluation>,
}

/// Requested location versus the listing's location label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNote {
    pub preferred: String,
    pub listing: String,
    pub importance: f64,
}

/// Explanation attached to every returned listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub criteria: Vec<CriterionExplanation>,
    pub price_categories: BTreeMap<String, f64>,
    pub price_category: Option<String>,
    pub amenities: Vec<AmenityAssessment>,
    pub location: Option<LocationNote>,
    pub summary: String,
}

/// Ranked listing with the scores that produced its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub candidate: Candidate,
    pub score: f64,
    pub base_score: f64,
    pub history_bonus: f64,
    pub criteria: Vec<CriterionScore>,
    pub explanation: Explanation,
}

impl RankedResult {
    /// Breakdown map {criterion -> (score, weight)}
    pub fn breakdown(&self) -> BTreeMap<Criterion, (f64, f64)> {
        self.criteria
            .iter()
            .map(|c| (c.criterion, (c.score, c.weight)))
            .collect()
    }
}
