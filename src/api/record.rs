//! Generic CRM record
//!
//! The web service returns every entity as a flat JSON object. [`Record`] keeps the
//! object as-is and adds accessors for the fields every entity carries.

use super::entities::numeric_id;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const CRM_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Typed id such as `4x1234`
    pub fn typed_id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Numeric part of the typed id, -1 when there is none
    pub fn numeric_id(&self) -> i64 {
        self.typed_id().map(numeric_id).unwrap_or(-1)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.str_field("assigned_user_id")
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp("createdtime")
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp("modifiedtime")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value as a string; empty strings count as absent
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.str_field(field)?;
        NaiveDateTime::parse_from_str(raw, CRM_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
