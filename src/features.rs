//! The fixed-shape feature record consumed by the price model.

use crate::error::FeatureError;
use crate::geocode::coords_from_postcode_area;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Training-time column order.
pub const FEATURES: [&str; 10] = [
    "latitude",
    "longitude",
    "floorAreaSqM",
    "bedrooms",
    "bathrooms",
    "livingRooms",
    "propertyType",
    "tenure",
    "currentEnergyRating",
    "postcodeArea",
];

pub const NUMERIC_FEATURES: [&str; 6] = [
    "latitude",
    "longitude",
    "floorAreaSqM",
    "bedrooms",
    "bathrooms",
    "livingRooms",
];

// Older versions of the form posted the floor area under this name.
const LEGACY_FLOOR_AREA_FIELD: &str = "floorAreaSQM";

pub fn is_numeric_feature(name: &str) -> bool {
    NUMERIC_FEATURES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Number(f64),
    Text(&'a str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub floor_area_sq_m: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub living_rooms: f64,
    pub property_type: String,
    pub tenure: String,
    pub current_energy_rating: String,
    pub postcode_area: String,
}

impl FeatureRecord {
    /// Builds a record from a JSON object.
    ///
    /// Every one of the ten features must be present; all missing keys are
    /// reported together, in feature order. Numeric fields accept numbers,
    /// numeric strings and booleans.
    pub fn from_json_map(payload: &Map<String, Value>) -> Result<Self, FeatureError> {
        let missing: Vec<String> = FEATURES
            .iter()
            .filter(|name| !payload.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FeatureError::MissingFields(missing));
        }

        let number = |name: &str| coerce_json_number(name, &payload[name]);
        let text = |name: &str| json_text(&payload[name]);

        Ok(Self {
            latitude: number("latitude")?,
            longitude: number("longitude")?,
            floor_area_sq_m: number("floorAreaSqM")?,
            bedrooms: number("bedrooms")?,
            bathrooms: number("bathrooms")?,
            living_rooms: number("livingRooms")?,
            property_type: text("propertyType"),
            tenure: text("tenure"),
            current_energy_rating: text("currentEnergyRating"),
            postcode_area: text("postcodeArea"),
        })
    }

    /// Builds a record from submitted form fields.
    ///
    /// Latitude and longitude always come from the postcode area. Numeric
    /// fields that are absent, empty or unparseable become 0.0.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let postcode_area = form.get("postcodeArea").cloned().unwrap_or_default();
        let (latitude, longitude) = coords_from_postcode_area(Some(&postcode_area));

        let number = |name: &str| form.get(name).map(|v| lenient_number(v)).unwrap_or(0.0);
        let text = |name: &str| form.get(name).cloned().unwrap_or_default();

        let floor_area_sq_m = form
            .get("floorAreaSqM")
            .or_else(|| form.get(LEGACY_FLOOR_AREA_FIELD))
            .map(|v| lenient_number(v))
            .unwrap_or(0.0);

        Self {
            latitude,
            longitude,
            floor_area_sq_m,
            bedrooms: number("bedrooms"),
            bathrooms: number("bathrooms"),
            living_rooms: number("livingRooms"),
            property_type: text("propertyType"),
            tenure: text("tenure"),
            current_energy_rating: text("currentEnergyRating"),
            postcode_area,
        }
    }

    /// Value of the feature at `index` in [`FEATURES`] order.
    pub fn value(&self, index: usize) -> Option<FeatureValue<'_>> {
        let value = match index {
            0 => FeatureValue::Number(self.latitude),
            1 => FeatureValue::Number(self.longitude),
            2 => FeatureValue::Number(self.floor_area_sq_m),
            3 => FeatureValue::Number(self.bedrooms),
            4 => FeatureValue::Number(self.bathrooms),
            5 => FeatureValue::Number(self.living_rooms),
            6 => FeatureValue::Text(&self.property_type),
            7 => FeatureValue::Text(&self.tenure),
            8 => FeatureValue::Text(&self.current_energy_rating),
            9 => FeatureValue::Text(&self.postcode_area),
            _ => return None,
        };
        Some(value)
    }
}

fn coerce_json_number(field: &str, value: &Value) -> Result<f64, FeatureError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FeatureError::NotNumeric {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}
