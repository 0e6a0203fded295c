use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::Result;

/// Capability every entity stored behind a view must provide
///
/// Two entities are the same record iff their identities are equal. The
/// identity is assigned by the server; an entity that has never been saved
/// reports `None`.
pub trait Identifiable: Clone + Send + Sync {
    /// Declared entity type (table name) this record belongs to
    fn entity_type(&self) -> &str;

    /// Server-assigned identity, `None` if not yet assigned
    fn object_id(&self) -> Option<&str>;
}

/// Schemaless record: an entity type, an identity and a JSON object body
///
/// # Example
///
/// ```ignore
/// use pagedview::Record;
///
/// let record = Record::new("Person", "p-1").with_field("age", 42);
/// assert_eq!(record.object_id(), Some("p-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "___class")]
    entity_type: String,
    #[serde(rename = "objectId", default, skip_serializing_if = "Option::is_none")]
    object_id: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(entity_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Record {
            entity_type: entity_type.into(),
            object_id: Some(object_id.into()),
            fields: Map::new(),
        }
    }

    /// A record that has not been assigned an identity yet
    pub fn unsaved(entity_type: impl Into<String>) -> Self {
        Record {
            entity_type: entity_type.into(),
            object_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Identifiable for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_identity() {
        let record = Record::new("Person", "p-1");
        assert_eq!(record.entity_type(), "Person");
        assert_eq!(record.object_id(), Some("p-1"));

        let unsaved = Record::unsaved("Person");
        assert_eq!(unsaved.object_id(), None);
    }

    #[test]
    fn test_record_json_shape() {
        let record = Record::new("Person", "p-1").with_field("name", "Ada");
        let json = record.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["___class"], "Person");
        assert_eq!(value["objectId"], "p-1");
        assert_eq!(value["name"], "Ada");

        let parsed = Record::from_json(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_without_object_id() {
        let parsed = Record::from_json(r#"{"___class":"Person","age":3}"#).unwrap();
        assert_eq!(parsed.object_id(), None);
        assert_eq!(parsed.get("age"), Some(&Value::from(3)));
    }

    #[test]
    fn test_record_malformed_json() {
        let err = Record::from_json(r#"{"objectId":"x"}"#).unwrap_err();
        assert_eq!(err.code(), &crate::Code::Corruption);
    }
}
