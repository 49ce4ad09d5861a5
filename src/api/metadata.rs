//! Module metadata returned by `listtypes` and `describe`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Answer of `listtypes`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleList {
    #[serde(default)]
    pub types: Vec<String>,
    /// Per-module summary keyed by module name
    #[serde(default)]
    pub information: Map<String, Value>,
}

impl ModuleList {
    pub fn contains(&self, module: &str) -> bool {
        self.types.iter().any(|t| t == module)
    }
}

/// Answer of `describe`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub id_prefix: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub createable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub updateable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub deleteable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub retrieveable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_entity: bool,
    #[serde(default)]
    pub label_fields: Value,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl ModuleInfo {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.mandatory)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub mandatory: bool,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub nullable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub editable: bool,
    #[serde(default, rename = "default")]
    pub default_value: Value,
}

/// `type` object of a field; only the name is always present
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldType {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "refersTo", default, skip_serializing_if = "Vec::is_empty")]
    pub refers_to: Vec<String>,
    #[serde(rename = "picklistValues", default, skip_serializing_if = "Vec::is_empty")]
    pub picklist_values: Vec<Value>,
}

// The server mixes true/false, "1"/"0" and 1/0 for flags
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_payload() {
        let info: ModuleInfo = serde_json::from_value(json!({
            "label": "Leads",
            "name": "Leads",
            "createable": true,
            "updateable": true,
            "deleteable": "1",
            "retrieveable": 1,
            "idPrefix": "10",
            "isEntity": true,
            "labelFields": "firstname,lastname",
            "fields": [
                {
                    "name": "lastname",
                    "label": "Last Name",
                    "mandatory": true,
                    "type": {"name": "string"},
                    "nullable": false,
                    "editable": true,
                    "default": ""
                },
                {
                    "name": "leadstatus",
                    "label": "Lead Status",
                    "mandatory": false,
                    "type": {"name": "picklist", "picklistValues": [{"label": "Hot", "value": "Hot"}]},
                    "nullable": true,
                    "editable": true
                }
            ]
        }))
        .unwrap();

        assert_eq!(info.id_prefix, "10");
        assert!(info.deleteable && info.retrieveable && info.is_entity);
        assert_eq!(info.mandatory_fields().count(), 1);
        assert_eq!(info.field("leadstatus").unwrap().field_type.name, "picklist");
        assert_eq!(info.field("leadstatus").unwrap().field_type.picklist_values.len(), 1);
    }

    #[test]
    fn test_listtypes_payload() {
        let list: ModuleList = serde_json::from_value(json!({
            "types": ["Leads", "Contacts"],
            "information": {"Leads": {"isEntity": true, "label": "Leads", "singular": "Lead"}}
        }))
        .unwrap();

        assert!(list.contains("Leads"));
        assert!(!list.contains("Potentials"));
        assert!(list.information.contains_key("Leads"));
    }
}
