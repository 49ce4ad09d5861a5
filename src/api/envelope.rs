//! Request and response envelopes
//!
//! Every call is a flat string map carrying at least `operation`; every answer is
//! either `{"success": true, "result": ...}` or `{"error": {"code", "message"}}`.

use super::constants::{SENSITIVE_FIELDS, fields};
use super::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Operation name plus its string payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEnvelope {
    payload: BTreeMap<String, String>,
}

impl OperationEnvelope {
    pub fn new(operation: impl Into<String>) -> Self {
        let mut payload = BTreeMap::new();
        payload.insert(fields::OPERATION.to_string(), operation.into());
        Self { payload }
    }

    /// Build from a raw payload map; the map is expected to carry `operation`
    pub fn from_payload(payload: BTreeMap<String, String>) -> Self {
        Self { payload }
    }

    /// Set a payload entry, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.payload.insert(key.into(), value.into());
    }

    pub fn operation(&self) -> Option<&str> {
        self.payload.get(fields::OPERATION).map(|s| s.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(|s| s.as_str())
    }

    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    /// Percent-escaped `key=value` pairs joined by `&`
    pub fn to_urlencoded(&self) -> String {
        self.payload
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Payload rendering safe for log output
    pub fn redacted(&self) -> String {
        let entries: Vec<String> = self
            .payload
            .iter()
            .map(|(k, v)| {
                if SENSITIVE_FIELDS.contains(&k.as_str()) {
                    format!("{}=***", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

/// Wire-level response wrapper
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success { result: Value },
    Failure { code: String, message: String },
}

impl ResponseEnvelope {
    /// Classify a raw response body
    pub fn parse(body: &str) -> ApiResult<Self> {
        if body.trim().is_empty() {
            return Err(ApiError::protocol("the server returned an empty response", body));
        }

        let json: Value = serde_json::from_str(body).map_err(|e| ApiError::UnknownServer {
            body: body.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(error) = json.get("error") {
            return Ok(Self::Failure {
                code: string_field(error, "code"),
                message: string_field(error, "message"),
            });
        }

        if json.get("success").and_then(Value::as_bool) == Some(true) {
            let result = json.get("result").cloned().unwrap_or(Value::Null);
            return Ok(Self::Success { result });
        }

        Err(ApiError::protocol(
            format!("failed to parse the following vtiger response: '{}'", body),
            body,
        ))
    }

    /// Unwrap the result, turning a failure envelope into [`ApiError::RemoteService`]
    pub fn into_result(self) -> ApiResult<Value> {
        match self {
            Self::Success { result } => Ok(result),
            Self::Failure { code, message } => Err(ApiError::RemoteService { code, message }),
        }
    }
}

/// Convert a `result` value into the caller's type; `Value` passes through untouched
pub fn decode_result<T: DeserializeOwned>(result: Value) -> ApiResult<T> {
    serde_json::from_value(result.clone()).map_err(|e| ApiError::ResponseShape {
        reason: e.to_string(),
        result,
    })
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
