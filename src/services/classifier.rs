use async_trait::async_trait;

use crate::core::pipeline::{Classification, Classifier, CollaboratorError};
use crate::models::{ExtractedConstraints, QueryIntent, TransportMode};

/// Upper bound for a number to be read as a room count
const MAX_ROOMS: f64 = 10.0;

const RECOMMENDATION_KEYWORDS: &[&str] = &[
    "recomienda", "recomiénda", "recomend", "mejor", "sugiere", "sugier", "ideal", "recommend", "best",
    "suggest",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "busca", "buscar", "barrio", "zona", "presupuesto", "precio", "habitaciones", "casa", "casas",
    "departamento", "depto", "ciudad", "mendoza", "propiedad", "propiedades", "search", "budget", "rooms",
    "house", "apartment",
];

const ROOM_KEYWORDS: &[&str] = &[
    "habitacion", "habitación", "dormitorio", "ambiente", "room", "bedroom",
];

/// Neighbourhood fragments and their canonical names, most specific first
const NEIGHBOURHOODS: &[(&str, &str)] = &[
    ("ciudad de mendoza", "Ciudad de Mendoza"),
    ("lujan de cuyo", "Luján de Cuyo"),
    ("luján de cuyo", "Luján de Cuyo"),
    ("chacras de coria", "Chacras de Coria"),
    ("godoy cruz", "Godoy Cruz"),
    ("las heras", "Las Heras"),
    ("villa nueva", "Villa Nueva"),
    ("san rafael", "San Rafael"),
    ("quinta sección", "Quinta Sección"),
    ("quinta seccion", "Quinta Sección"),
    ("cuarta sección", "Cuarta Sección"),
    ("cuarta seccion", "Cuarta Sección"),
    ("sexta sección", "Sexta Sección"),
    ("sexta seccion", "Sexta Sección"),
    ("san jose", "San José"),
    ("san josé", "San José"),
    ("guaymallen", "Guaymallén"),
    ("guaymallén", "Guaymallén"),
    ("dorrego", "Dorrego"),
    ("maipu", "Maipú"),
    ("maipú", "Maipú"),
    ("godoy", "Godoy Cruz"),
    ("luján", "Luján de Cuyo"),
    ("lujan", "Luján de Cuyo"),
    ("mendoza", "Ciudad de Mendoza"),
    ("ciudad", "Ciudad de Mendoza"),
];

/// Whole words that name a transport mode; short words like "bus" and "car"
/// would produce false hits as substrings
const TRANSPORT_WORDS: &[(TransportMode, &[&str])] = &[
    (TransportMode::Walk, &["caminando", "caminar", "camino", "pie", "walk", "walking"]),
    (TransportMode::Bike, &["bici", "bicicleta", "bike", "cycling"]),
    (TransportMode::Bus, &["colectivo", "bus", "ómnibus", "omnibus", "micro"]),
    (TransportMode::Car, &["auto", "coche", "car", "manejar", "driving"]),
];

/// Rule-based classifier: intent by keyword, constraints by pattern
///
/// Deterministic and free of I/O, so it never reports a collaborator error.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_intent(&self, text: &str) -> QueryIntent {
        let lowered = text.to_lowercase();
        if contains_any(&lowered, RECOMMENDATION_KEYWORDS) {
            QueryIntent::Recommendation
        } else if contains_any(&lowered, SEARCH_KEYWORDS) {
            QueryIntent::FilteredSearch
        } else {
            QueryIntent::Simple
        }
    }

    pub fn extract_constraints(&self, text: &str) -> ExtractedConstraints {
        let lowered = text.to_lowercase();
        let numbers = extract_numbers(&lowered);

        let budget = numbers
            .iter()
            .copied()
            .filter(|n| *n > MAX_ROOMS)
            .max_by(f64::total_cmp);

        let min_rooms = if contains_any(&lowered, ROOM_KEYWORDS) {
            numbers
                .iter()
                .copied()
                .find(|n| *n >= 1.0 && *n <= MAX_ROOMS)
                .map(|n| n as u32)
        } else {
            None
        };

        let location = NEIGHBOURHOODS
            .iter()
            .find(|(fragment, _)| lowered.contains(fragment))
            .map(|(_, name)| name.to_string());

        ExtractedConstraints {
            budget,
            min_rooms,
            location,
            transport_mode: detect_transport(&lowered),
            amenity_preferences: Vec::new(),
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, CollaboratorError> {
        let classification = Classification {
            intent: Some(self.detect_intent(text)),
            constraints: self.extract_constraints(text),
        };
        tracing::debug!("Keyword classifier extracted {:?}", classification.constraints);
        Ok(classification)
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn detect_transport(lowered: &str) -> Option<TransportMode> {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TRANSPORT_WORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(w)))
        .map(|(mode, _)| *mode)
}

/// Every number in `text`, in order of appearance
///
/// Dots and commas followed by exactly three digits are thousands separators
/// ("150.000" is 150000); a single other separator is a decimal point.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut token = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        let separator_inside = (*c == '.' || *c == ',')
            && !token.is_empty()
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit());

        if c.is_ascii_digit() || separator_inside {
            token.push(*c);
        } else if !token.is_empty() {
            numbers.extend(parse_number(&token));
            token.clear();
        }
    }
    if !token.is_empty() {
        numbers.extend(parse_number(&token));
    }
    numbers
}

fn parse_number(token: &str) -> Option<f64> {
    let groups: Vec<&str> = token.split(['.', ',']).collect();
    if groups.len() == 1 {
        return token.parse().ok();
    }
    if groups[1..].iter().all(|g| g.len() == 3) {
        return groups.concat().parse().ok();
    }
    if groups.len() == 2 {
        return format!("{}.{}", groups[0], groups[1]).parse().ok();
    }
    groups[0].parse().ok()
}
