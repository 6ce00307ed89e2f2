//! Shared test fixtures.

use crate::features::FeatureRecord;

/// A two-tree forest over the full feature set, predicting log price.
///
/// Flats under ~53 sqm with two or more bedrooms average a log price of 13.0.
pub const SAMPLE_ARTIFACT: &str = include_str!("sample_model.json");

pub fn sample_record() -> FeatureRecord {
    FeatureRecord {
        latitude: 51.5,
        longitude: -0.12,
        floor_area_sq_m: 50.0,
        bedrooms: 2.0,
        bathrooms: 1.0,
        living_rooms: 1.0,
        property_type: "Flat".to_string(),
        tenure: "Leasehold".to_string(),
        current_energy_rating: "C".to_string(),
        postcode_area: "SW1".to_string(),
    }
}

pub fn sample_payload() -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.5,
        "longitude": -0.12,
        "floorAreaSqM": 50,
        "bedrooms": 2,
        "bathrooms": 1,
        "livingRooms": 1,
        "propertyType": "Flat",
        "tenure": "Leasehold",
        "currentEnergyRating": "C",
        "postcodeArea": "SW1"
    })
}
