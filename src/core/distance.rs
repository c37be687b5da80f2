use crate::models::{Candidate, NearbyAmenity};

/// Earth's radius in metres
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the Haversine distance between two points in metres
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance from a listing to one of its amenities, in metres
///
/// An explicit distance wins; otherwise it is derived from coordinates when
/// both the listing and the amenity carry them.
pub fn amenity_distance_m(candidate: &Candidate, amenity: &NearbyAmenity) -> Option<f64> {
    if let Some(distance) = amenity.distance_m.filter(|d| d.is_finite()) {
        return Some(distance.max(0.0));
    }

    let (lat, lon) = candidate.coordinates()?;
    let amenity_lat = amenity.latitude?;
    let amenity_lon = amenity.longitude?;
    Some(haversine_distance_m(lat, lon, amenity_lat, amenity_lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AmenityType;

    fn candidate_at(latitude: Option<f64>, longitude: Option<f64>) -> Candidate {
        Candidate {
            id: "listing".to_string(),
            name: None,
            price: Some(100_000.0),
            rooms: Some(2),
            area: Some(70.0),
            location: "Ciudad de Mendoza".to_string(),
            latitude,
            longitude,
            nearby_amenities: vec![],
        }
    }

    #[test]
    fn test_haversine_distance() {
        // Plaza Independencia to Parque General San Martín (roughly 2 km)
        let distance = haversine_distance_m(-32.8895, -68.8446, -32.8908, -68.8660);
        assert!((distance - 2000.0).abs() < 200.0, "Distance should be ~2km, got {}", distance);

        assert!(haversine_distance_m(-32.89, -68.84, -32.89, -68.84) < 0.01);
    }

    #[test]
    fn test_explicit_distance_wins() {
        let candidate = candidate_at(Some(-32.8895), Some(-68.8446));
        let amenity = NearbyAmenity {
            amenity_type: AmenityType::Park,
            name: None,
            distance_m: Some(120.0),
            latitude: Some(-32.8908),
            longitude: Some(-68.8660),
        };

        assert_eq!(amenity_distance_m(&candidate, &amenity), Some(120.0));
    }

    #[test]
    fn test_distance_from_coordinates() {
        let candidate = candidate_at(Some(-32.8895), Some(-68.8446));
        let amenity = NearbyAmenity {
            amenity_type: AmenityType::Park,
            name: None,
            distance_m: None,
            latitude: Some(-32.8908),
            longitude: Some(-68.8660),
        };

        let distance = amenity_distance_m(&candidate, &amenity).unwrap();
        assert!(distance > 1500.0 && distance < 2500.0);
    }

    #[test]
    fn test_missing_location_data() {
        let amenity = NearbyAmenity {
            amenity_type: AmenityType::Hospital,
            name: None,
            distance_m: None,
            latitude: Some(-32.8908),
            longitude: Some(-68.8660),
        };

        assert_eq!(amenity_distance_m(&candidate_at(None, None), &amenity), None);
    }
}
