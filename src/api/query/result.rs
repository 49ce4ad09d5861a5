//! Query result handling
//!
//! `query` answers with an array of row objects; these helpers pull typed values out of it.

use crate::api::error::{ApiError, ApiResult};
use serde_json::Value;

/// Numeric value of a `SELECT COUNT(*)` answer, taken from the first column of the first row
pub fn count_from_rows(rows: &Value) -> ApiResult<u64> {
    let first_value = rows
        .as_array()
        .and_then(|rows| rows.first())
        .and_then(|row| match row {
            Value::Object(map) => map.get("count").or_else(|| map.values().next()),
            other => Some(other),
        });

    let Some(value) = first_value else {
        return Err(shape_error("count query returned no rows", rows));
    };

    coerce_count(value).ok_or_else(|| shape_error(&format!("count value {} is not a number", value), rows))
}

fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn shape_error(reason: &str, rows: &Value) -> ApiError {
    ApiError::ResponseShape {
        reason: reason.to_string(),
        result: rows.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_from_string_and_number() {
        assert_eq!(count_from_rows(&json!([{"count": "42"}])).unwrap(), 42);
        assert_eq!(count_from_rows(&json!([{"count": 7}])).unwrap(), 7);
        assert_eq!(count_from_rows(&json!([{"COUNT(*)": "3"}])).unwrap(), 3);
    }

    #[test]
    fn test_missing_count_is_shape_error() {
        assert!(matches!(count_from_rows(&json!([])), Err(ApiError::ResponseShape { .. })));
        assert!(matches!(count_from_rows(&json!({"count": 1})), Err(ApiError::ResponseShape { .. })));
        assert!(matches!(
            count_from_rows(&json!([{"count": "many"}])),
            Err(ApiError::ResponseShape { .. })
        ));
    }
}
