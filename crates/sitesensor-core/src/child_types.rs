//! Virtual sensor types an expression value can be pushed to

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildType {
    pub name: String,
    #[serde(rename = "type")]
    pub type_urn: String,
}

impl ChildType {
    fn new(name: &str, type_urn: &str) -> Self {
        Self {
            name: name.to_string(),
            type_urn: type_urn.to_string(),
        }
    }
}

/// Types offered when no catalog endpoint is configured or reachable
pub fn default_child_types() -> Vec<ChildType> {
    vec![
        ChildType::new(
            "Security Sensor (boolean)",
            "urn:schemas-micasaverde-com:device:MotionSensor:1",
        ),
        ChildType::new(
            "Temperature Sensor (numeric)",
            "urn:schemas-micasaverde-com:device:TemperatureSensor:1",
        ),
        ChildType::new(
            "Humidity Sensor (numeric)",
            "urn:schemas-micasaverde-com:device:HumiditySensor:1",
        ),
        ChildType::new(
            "Light Sensor (numeric)",
            "urn:schemas-micasaverde-com:device:LightSensor:1",
        ),
        ChildType::new(
            "Generic Sensor (numeric)",
            "urn:schemas-micasaverde-com:device:GenericSensor:1",
        ),
        ChildType::new(
            "Virtual Switch (boolean)",
            "urn:schemas-upnp-org:device:BinaryLight:1",
        ),
    ]
}

/// Parse a catalog response: `[{ "name": ..., "type": ... }, ...]`
///
/// Entries with a blank type are skipped.
pub fn parse_catalog(json: &str) -> Result<Vec<ChildType>> {
    let types: Vec<ChildType> = serde_json::from_str(json)?;
    Ok(types
        .into_iter()
        .filter(|t| !t.type_urn.trim().is_empty())
        .collect())
}

/// Display name for a type URN, falling back to the URN itself
pub fn display_name<'a>(catalog: &'a [ChildType], type_urn: &'a str) -> &'a str {
    catalog
        .iter()
        .find(|t| t.type_urn == type_urn)
        .map(|t| t.name.as_str())
        .unwrap_or(type_urn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let types = default_child_types();
        assert_eq!(types.len(), 6);
        assert!(types.iter().all(|t| t.type_urn.starts_with("urn:")));
    }

    #[test]
    fn test_parse_catalog() {
        let json = r#"[
            { "name": "Temp", "type": "urn:t" },
            { "name": "Nothing", "type": " " }
        ]"#;
        let types = parse_catalog(json).unwrap();
        assert_eq!(types, vec![ChildType::new("Temp", "urn:t")]);
        assert!(parse_catalog("{}").is_err());
    }

    #[test]
    fn test_display_name() {
        let types = default_child_types();
        assert_eq!(
            display_name(&types, "urn:schemas-upnp-org:device:BinaryLight:1"),
            "Virtual Switch (boolean)"
        );
        assert_eq!(display_name(&types, "urn:other"), "urn:other");
    }
}
