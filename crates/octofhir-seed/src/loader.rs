//! Reads resource files and normalizes them into a flat list.
//!
//! Accepted layouts:
//! - `{"data": [ ... ]}` wrapper object
//! - a bare array of resources
//! - a single object carrying `resourceType`
//!
//! Anything else is reported and treated as empty so one bad file never stops
//! a run.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::resource::Resource;

/// Load the resources stored in `path`, preserving file order.
pub fn load_resources(path: &Path) -> Vec<Resource> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            return Vec::new();
        }
    };
    parse_resources(&content).unwrap_or_else(|reason| {
        tracing::warn!(path = %path.display(), "{reason}");
        Vec::new()
    })
}

/// Normalize JSON text into resources. The error string describes why the
/// content was rejected.
pub fn parse_resources(content: &str) -> Result<Vec<Resource>, String> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| format!("Failed to parse JSON: {e}"))?;
    normalize(value)
}

fn normalize(value: Value) -> Result<Vec<Resource>, String> {
    match value {
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                match data {
                    Value::Array(items) => Ok(items.into_iter().map(Resource::new).collect()),
                    _ => Err("Unknown data format: `data` is not an array".to_string()),
                }
            } else if map.contains_key("resourceType") {
                Ok(vec![Resource::new(Value::Object(map))])
            } else {
                Err("Unknown data format".to_string())
            }
        }
        Value::Array(items) => Ok(items.into_iter().map(Resource::new).collect()),
        _ => Err("Unknown data format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ids(resources: &[Resource]) -> Vec<&str> {
        resources.iter().filter_map(Resource::id).collect()
    }

    #[test]
    fn wrapper_object_keeps_order() {
        let resources = parse_resources(
            r#"{"data": [
                {"resourceType": "Patient", "id": "b"},
                {"resourceType": "Patient", "id": "a"},
                {"resourceType": "Patient", "id": "c"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(ids(&resources), vec!["b", "a", "c"]);
    }

    #[test]
    fn bare_array() {
        let resources = parse_resources(
            r#"[{"resourceType": "Task", "id": "t2"}, {"resourceType": "Task", "id": "t1"}]"#,
        )
        .unwrap();
        assert_eq!(ids(&resources), vec!["t2", "t1"]);
    }

    #[test]
    fn single_resource_object() {
        let resources =
            parse_resources(r#"{"resourceType": "Patient", "id": "Patient-29590"}"#).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].reference().as_deref(), Some("Patient/Patient-29590"));
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(parse_resources(r#"{"items": []}"#).is_err());
        assert!(parse_resources(r#"{"data": {"resourceType": "Patient"}}"#).is_err());
        assert!(parse_resources("42").is_err());
        assert!(parse_resources(r#""Patient""#).is_err());
        assert!(parse_resources("{not json").is_err());
    }

    #[test]
    fn entries_without_identity_are_passed_through() {
        let resources = parse_resources(r#"[{"resourceType": "Patient"}, 7]"#).unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources.iter().all(|r| r.reference().is_none()));
    }

    #[test]
    fn load_from_disk_falls_back_to_empty() {
        let dir = tempfile::tempdir().expect("tmp dir");

        let good = dir.path().join("Patient.json");
        fs::write(&good, r#"{"data": [{"resourceType": "Patient", "id": "p1"}]}"#).unwrap();
        assert_eq!(load_resources(&good).len(), 1);

        let broken = dir.path().join("Task.json");
        fs::write(&broken, "[{").unwrap();
        assert!(load_resources(&broken).is_empty());

        assert!(load_resources(&dir.path().join("Missing.json")).is_empty());
    }
}
