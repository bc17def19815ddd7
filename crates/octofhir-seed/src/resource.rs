use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A FHIR resource as loaded from disk.
///
/// No schema is enforced: the server decides what is valid. Entries that are
/// not objects, or lack `resourceType`/`id`, are still carried so that the
/// importer can count them as failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Value);

impl Resource {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// `Type/id`, when both parts are present.
    pub fn reference(&self) -> Option<String> {
        Some(format!("{}/{}", self.resource_type()?, self.id()?))
    }

    /// Every `reference` string found anywhere in the resource.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_references(&self.0, &mut out);
        out
    }

    /// Resource types named by [`Resource::references`]; contained (`#`) and
    /// absolute references are ignored.
    pub fn referenced_types(&self) -> Vec<&str> {
        self.references()
            .into_iter()
            .filter(|r| !r.starts_with('#') && !r.contains("://"))
            .filter_map(|r| r.split_once('/').map(|(rt, _)| rt))
            .collect()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn collect_references<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == "reference"
                    && let Some(s) = v.as_str()
                {
                    out.push(s);
                } else {
                    collect_references(v, out);
                }
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_references(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_requires_type_and_id() {
        let full = Resource::new(json!({"resourceType": "Patient", "id": "p1"}));
        assert_eq!(full.reference().as_deref(), Some("Patient/p1"));

        let no_id = Resource::new(json!({"resourceType": "Patient"}));
        assert_eq!(no_id.reference(), None);

        let empty_id = Resource::new(json!({"resourceType": "Patient", "id": ""}));
        assert_eq!(empty_id.id(), None);

        let scalar = Resource::new(json!(42));
        assert_eq!(scalar.resource_type(), None);
    }

    #[test]
    fn references_are_collected_recursively() {
        let task = Resource::new(json!({
            "resourceType": "Task",
            "id": "t1",
            "for": {"reference": "Patient/Patient-29590"},
            "basedOn": [{"reference": "ServiceRequest/ActivityInstance-426538"}],
            "owner": {"reference": "#contained-1"},
            "input": [{"valueReference": {"reference": "http://example.org/fhir/Group/g1"}}]
        }));

        assert_eq!(task.references().len(), 4);
        let mut types = task.referenced_types();
        types.sort_unstable();
        assert_eq!(types, vec!["Patient", "ServiceRequest"]);
    }
}
