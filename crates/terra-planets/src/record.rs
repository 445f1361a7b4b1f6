//! The planet record as returned by providers and served to clients.

use serde::{Deserialize, Serialize};

/// Name of the planet every query response is anchored on.
pub const REFERENCE_PLANET: &str = "Earth";

/// Physical statistics for one planet.
///
/// Units follow the upstream API: mass and radius in Jupiter units, period in
/// days, semi-major axis in AU, temperatures in kelvin, distance in light
/// years, host star mass in solar masses. Any numeric field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_major_axis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_light_year: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_star_mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_star_temperature: Option<f64>,
    /// Set on records served by the query endpoint; absent on raw provider output.
    #[serde(rename = "isEarth", default, skip_serializing_if = "Option::is_none")]
    pub is_reference: Option<bool>,
}

impl PlanetRecord {
    /// A record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mass: None,
            radius: None,
            period: None,
            semi_major_axis: None,
            temperature: None,
            distance_light_year: None,
            host_star_mass: None,
            host_star_temperature: None,
            is_reference: None,
        }
    }

    /// The hardcoded Earth record.
    pub fn earth() -> Self {
        Self {
            name: REFERENCE_PLANET.to_string(),
            mass: Some(0.00315),
            radius: Some(0.0892),
            period: Some(365.2),
            semi_major_axis: Some(1.0),
            temperature: Some(288.0),
            distance_light_year: Some(0.0),
            host_star_mass: Some(1.0),
            host_star_temperature: Some(6000.0),
            is_reference: None,
        }
    }

    /// Copy of this record flagged as the reference planet or not.
    #[must_use]
    pub fn tagged(self, is_reference: bool) -> Self {
        Self {
            is_reference: Some(is_reference),
            ..self
        }
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_serializes_with_upstream_field_names() {
        let json = serde_json::to_value(PlanetRecord::earth()).unwrap();
        assert_eq!(json["name"], "Earth");
        assert_eq!(json["mass"], 0.00315);
        assert_eq!(json["semi_major_axis"], 1.0);
        assert_eq!(json["host_star_temperature"], 6000.0);
        assert!(json.get("isEarth").is_none());
    }

    #[test]
    fn test_tagged_sets_flag_without_touching_data() {
        let tagged = PlanetRecord::earth().tagged(true);
        assert!(tagged.is_reference());
        assert_eq!(tagged.period, Some(365.2));

        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["isEarth"], true);

        let untagged = tagged.tagged(false);
        assert!(!untagged.is_reference());
        assert_eq!(serde_json::to_value(&untagged).unwrap()["isEarth"], false);
    }

    #[test]
    fn test_missing_numbers_deserialize_as_absent() {
        let record: PlanetRecord =
            serde_json::from_str(r#"{"name":"Kepler-22b","radius":0.21,"period":289.9}"#).unwrap();
        assert_eq!(record.name, "Kepler-22b");
        assert_eq!(record.radius, Some(0.21));
        assert_eq!(record.mass, None);
        assert_eq!(record.host_star_mass, None);
        assert!(!record.is_reference());
    }

    #[test]
    fn test_integer_fields_accepted() {
        let record: PlanetRecord =
            serde_json::from_str(r#"{"name":"Earth","semi_major_axis":1,"temperature":288}"#)
                .unwrap();
        assert_eq!(record.semi_major_axis, Some(1.0));
        assert_eq!(record.temperature, Some(288.0));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let record: PlanetRecord =
            serde_json::from_str(r#"{"name":"Mars","mass":0.000338,"discovered":"antiquity"}"#)
                .unwrap();
        assert_eq!(record, PlanetRecord {
            mass: Some(0.000338),
            ..PlanetRecord::named("Mars")
        });
    }
}
