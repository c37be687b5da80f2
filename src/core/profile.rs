use crate::models::{AmenityPreference, AmenityType, Budget, ExtractedConstraints, QueryProfile};

/// Location importance when the request names a location
pub const EXPLICIT_LOCATION_IMPORTANCE: f64 = 0.9;
/// Location importance otherwise
pub const DEFAULT_LOCATION_IMPORTANCE: f64 = 0.5;
/// Priority given to amenity types inferred from keywords
pub const INFERRED_AMENITY_PRIORITY: f64 = 0.8;

/// Text fragments that signal interest in an amenity type
///
/// Matched as case-insensitive substrings. Fragments must not be substrings of
/// common search words ("bus" would match "busca").
const AMENITY_KEYWORDS: &[(AmenityType, &[&str])] = &[
    (AmenityType::Park, &["parque", "verde", "naturaleza", "park", "green space"]),
    (
        AmenityType::EducationCentre,
        &["escuela", "educación", "educacion", "niños", "ninos", "colegio", "school"],
    ),
    (AmenityType::Hospital, &["hospital", "salud", "médico", "medico", "clínica", "clinica"]),
    (
        AmenityType::BusStop,
        &["transporte", "colectivo", "subte", "metro", "parada", "public transport"],
    ),
    (AmenityType::Supermarket, &["supermercado", "comercio", "compras", "supermarket", "grocer"]),
    (AmenityType::CommercialCentre, &["centro comercial", "shopping", "mall"]),
    (AmenityType::University, &["universidad", "facultad", "university", "campus"]),
];

/// Turns classified constraints and the raw request text into a [`QueryProfile`]
///
/// Deterministic and rule based.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryProfileBuilder;

impl QueryProfileBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, text: &str, constraints: &ExtractedConstraints) -> QueryProfile {
        let budget = match constraints.budget {
            Some(amount) if amount.is_finite() && amount > 0.0 => Some(Budget::around(amount)),
            Some(amount) => {
                tracing::warn!("Ignoring non-positive budget constraint: {}", amount);
                None
            }
            None => None,
        };

        let location = constraints
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        let location_importance = if location.is_some() {
            EXPLICIT_LOCATION_IMPORTANCE
        } else {
            DEFAULT_LOCATION_IMPORTANCE
        };

        QueryProfile {
            budget,
            min_rooms: constraints.min_rooms.unwrap_or(1).max(1),
            location,
            location_importance,
            amenity_preferences: merge_preferences(
                &constraints.amenity_preferences,
                infer_amenity_preferences(text),
            ),
            transport_mode: constraints.transport_mode,
        }
    }
}

/// Amenity preferences implied by keywords in `text`, in catalogue order
pub fn infer_amenity_preferences(text: &str) -> Vec<AmenityPreference> {
    let lowered = text.to_lowercase();
    AMENITY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(amenity, _)| AmenityPreference::new(*amenity, INFERRED_AMENITY_PRIORITY))
        .collect()
}

// Declared preferences win over inferred ones for the same type.
fn merge_preferences(
    declared: &[AmenityPreference],
    inferred: Vec<AmenityPreference>,
) -> Vec<AmenityPreference> {
    let mut merged: Vec<AmenityPreference> = Vec::with_capacity(declared.len() + inferred.len());
    for preference in declared.iter().copied().chain(inferred) {
        if !merged.iter().any(|p| p.amenity == preference.amenity) {
            merged.push(AmenityPreference::new(preference.amenity, preference.priority));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;

    #[test]
    fn test_defaults_without_constraints() {
        let profile = QueryProfileBuilder::new().build("", &ExtractedConstraints::default());

        assert_eq!(profile, QueryProfile::default());
        assert_eq!(profile.min_rooms, 1);
        assert_eq!(profile.location_importance, DEFAULT_LOCATION_IMPORTANCE);
    }

    #[test]
    fn test_budget_and_location() {
        let constraints = ExtractedConstraints {
            budget: Some(150_000.0),
            min_rooms: Some(2),
            location: Some("  Godoy Cruz ".to_string()),
            transport_mode: Some(TransportMode::Bus),
            ..Default::default()
        };
        let profile = QueryProfileBuilder::new().build("", &constraints);

        let budget = profile.budget.unwrap();
        assert_eq!(budget.ideal, 150_000.0);
        assert_eq!(budget.min, 120_000.0);
        assert_eq!(budget.max, 180_000.0);
        assert_eq!(profile.min_rooms, 2);
        assert_eq!(profile.location.as_deref(), Some("Godoy Cruz"));
        assert_eq!(profile.location_importance, EXPLICIT_LOCATION_IMPORTANCE);
        assert_eq!(profile.transport_mode, Some(TransportMode::Bus));
    }

    #[test]
    fn test_invalid_values_degrade() {
        let constraints = ExtractedConstraints {
            budget: Some(-5.0),
            min_rooms: Some(0),
            location: Some("   ".to_string()),
            ..Default::default()
        };
        let profile = QueryProfileBuilder::new().build("", &constraints);

        assert!(profile.budget.is_none());
        assert_eq!(profile.min_rooms, 1);
        assert!(profile.location.is_none());
    }

    #[test]
    fn test_keyword_inference_case_insensitive_and_multiple() {
        let prefs = infer_amenity_preferences("Busco casa cerca de un PARQUE y una Escuela");
        let types: Vec<AmenityType> = prefs.iter().map(|p| p.amenity).collect();

        assert_eq!(types, vec![AmenityType::Park, AmenityType::EducationCentre]);
        assert!(prefs.iter().all(|p| p.priority == INFERRED_AMENITY_PRIORITY));
    }

    #[test]
    fn test_search_verb_does_not_imply_bus_stop() {
        assert!(infer_amenity_preferences("busca departamentos").is_empty());
        let prefs = infer_amenity_preferences("con buen transporte");
        assert_eq!(prefs[0].amenity, AmenityType::BusStop);
    }

    #[test]
    fn test_declared_preferences_win() {
        let constraints = ExtractedConstraints {
            amenity_preferences: vec![AmenityPreference::new(AmenityType::Park, 0.3)],
            ..Default::default()
        };
        let profile = QueryProfileBuilder::new().build("quiero un parque y hospital", &constraints);

        assert_eq!(profile.amenity_preferences.len(), 2);
        assert_eq!(profile.amenity_preferences[0], AmenityPreference::new(AmenityType::Park, 0.3));
        assert_eq!(profile.amenity_preferences[1].amenity, AmenityType::Hospital);
    }
}
