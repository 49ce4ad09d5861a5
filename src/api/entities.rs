//! Entity operations
//!
//! Thin wrappers over the CRUD, lookup and sync operations of the web service. Results
//! decode into any `DeserializeOwned` type; [`Record`](super::record::Record) and
//! `serde_json::Value` are the usual choices.

use super::client::VtigerClient;
use super::constants::{fields, operations};
use super::envelope::OperationEnvelope;
use super::error::{ApiError, ApiResult, require_non_blank};
use super::query::{Condition, ConditionGroup, QueryBuilder};
use super::record::Record;
use super::transport::HttpMethod;
use chrono::{DateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub struct Entities<'a> {
    client: &'a VtigerClient,
}

impl<'a> Entities<'a> {
    pub fn new(client: &'a VtigerClient) -> Self {
        Self { client }
    }

    pub async fn retrieve<T: DeserializeOwned>(&self, typed_id: &str) -> ApiResult<T> {
        require_non_blank(fields::ID, typed_id)?;
        let envelope = OperationEnvelope::new(operations::RETRIEVE).with(fields::ID, typed_id);
        self.client.dispatch(envelope, HttpMethod::Get).await
    }

    pub async fn retrieve_by_numeric_id<T: DeserializeOwned>(&self, module: &str, id: i64) -> ApiResult<T> {
        let typed_id = self.client.modules().typed_id(module, id).await?;
        self.retrieve(&typed_id).await
    }

    /// First record whose fields match all `criteria` (SQL LIKE semantics)
    pub async fn find_one<T, I, K, V>(&self, module: &str, criteria: I, select: &[&str]) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query = lookup_query(module, criteria, select)?;
        query.fetch_one(self.client).await
    }

    /// All records matching `criteria`, at most `limit` of them when `limit > 0`
    pub async fn find_many<T, I, K, V>(
        &self,
        module: &str,
        criteria: I,
        select: &[&str],
        limit: u32,
    ) -> ApiResult<Vec<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query = lookup_query(module, criteria, select)?.take(limit);
        query.fetch_many(self.client).await
    }

    /// Typed id of the first record matching `criteria`
    pub async fn get_id<I, K, V>(&self, module: &str, criteria: I) -> ApiResult<Option<String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let record: Option<Record> = self.find_one(module, criteria, &[fields::ID]).await?;
        Ok(record.and_then(|r| r.typed_id().map(str::to_string)))
    }

    /// Numeric id of the first record matching `criteria`, -1 when nothing matches
    pub async fn get_numeric_id<I, K, V>(&self, module: &str, criteria: I) -> ApiResult<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let id = self.get_id(module, criteria).await?;
        Ok(id.as_deref().map(numeric_id).unwrap_or(-1))
    }

    /// Create a record; `assigned_user_id` defaults to the logged-in user
    pub async fn create<T: DeserializeOwned>(&self, module: &str, element: Map<String, Value>) -> ApiResult<T> {
        require_non_blank(fields::ELEMENT_TYPE, module)?;
        if element.is_empty() {
            return Err(ApiError::invalid_argument(fields::ELEMENT, "no data to create the record with"));
        }

        let mut element = element;
        if !element.contains_key(fields::ASSIGNED_USER_ID) {
            self.client.ensure_authenticated().await?;
            if let Some(user) = &self.client.session().current_user {
                element.insert(fields::ASSIGNED_USER_ID.to_string(), Value::String(user.id.clone()));
            }
        }

        let envelope = OperationEnvelope::new(operations::CREATE)
            .with(fields::ELEMENT_TYPE, module)
            .with(fields::ELEMENT, encode_element(&element)?);
        self.client.dispatch(envelope, HttpMethod::Post).await
    }

    /// Retrieve the record, overlay `changes` on it and send the result back
    pub async fn update<T: DeserializeOwned>(
        &self,
        module: &str,
        typed_id: &str,
        changes: Map<String, Value>,
    ) -> ApiResult<T> {
        require_non_blank(fields::ELEMENT_TYPE, module)?;
        if changes.is_empty() {
            return Err(ApiError::invalid_argument(fields::ELEMENT, "no data to update the record with"));
        }

        let current: Map<String, Value> = self.retrieve(typed_id).await?;
        let mut element = merge_records(current, changes);
        element.insert(fields::ID.to_string(), Value::String(typed_id.to_string()));

        let envelope = OperationEnvelope::new(operations::UPDATE)
            .with(fields::ELEMENT_TYPE, module)
            .with(fields::ELEMENT, encode_element(&element)?);
        self.client.dispatch(envelope, HttpMethod::Post).await
    }

    pub async fn delete(&self, typed_id: &str) -> ApiResult<bool> {
        require_non_blank(fields::ID, typed_id)?;
        let envelope = OperationEnvelope::new(operations::DELETE).with(fields::ID, typed_id);
        let result: Value = self.client.dispatch(envelope, HttpMethod::Post).await?;
        Ok(delete_succeeded(&result))
    }

    pub async fn delete_by_numeric_id(&self, module: &str, id: i64) -> ApiResult<bool> {
        let typed_id = self.client.modules().typed_id(module, id).await?;
        self.delete(&typed_id).await
    }

    /// Records changed since `since` (midnight UTC today by default), optionally for one module
    pub async fn sync(&self, since: Option<DateTime<Utc>>, module: Option<&str>) -> ApiResult<Value> {
        let since = since.unwrap_or_else(start_of_today);
        let mut envelope =
            OperationEnvelope::new(operations::SYNC).with(fields::MODIFIED_TIME, since.timestamp().to_string());

        if let Some(module) = module {
            require_non_blank(fields::ELEMENT_TYPE, module)?;
            envelope.insert(fields::ELEMENT_TYPE, module);
        }

        self.client.dispatch(envelope, HttpMethod::Get).await
    }
}

/// Numeric part of a typed id (`4x1234` -> 1234), -1 when the id is malformed
pub fn numeric_id(typed_id: &str) -> i64 {
    typed_id
        .rsplit_once('x')
        .and_then(|(_, suffix)| suffix.parse::<i64>().ok())
        .filter(|id| *id >= 0)
        .unwrap_or(-1)
}

/// Shallow merge where `overlay` wins; nested values are replaced, never merged
pub fn merge_records(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

fn lookup_query<I, K, V>(module: &str, criteria: I, select: &[&str]) -> ApiResult<QueryBuilder>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    require_non_blank("module", module)?;

    let group: ConditionGroup = criteria
        .into_iter()
        .map(|(column, value)| Condition::like(column, value))
        .collect::<Vec<_>>()
        .into();
    if group.is_empty() {
        return Err(ApiError::invalid_argument("fields", "at least one field to match on is required"));
    }

    let mut query = QueryBuilder::new(module).filter_group(group)?;
    if !select.is_empty() {
        query = query.select(select.iter().copied());
    }
    Ok(query)
}

fn encode_element(element: &Map<String, Value>) -> ApiResult<String> {
    serde_json::to_string(element).map_err(|e| ApiError::invalid_argument(fields::ELEMENT, e.to_string()))
}

fn delete_succeeded(result: &Value) -> bool {
    match result {
        Value::Bool(b) => *b,
        Value::Object(map) => map
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("successful")),
        _ => false,
    }
}

fn start_of_today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("4x1234"), 1234);
        assert_eq!(numeric_id("19x1"), 1);
        assert_eq!(numeric_id("1234"), -1);
        assert_eq!(numeric_id("4x"), -1);
        assert_eq!(numeric_id("4xabc"), -1);
        assert_eq!(numeric_id(""), -1);
    }

    #[test]
    fn test_merge_records_overlay_wins() {
        let base = map(json!({"id": "4x1", "lastname": "Smith", "tags": ["a", "b"], "address": {"city": "Ghent"}}));
        let overlay = map(json!({"lastname": "Jones", "tags": ["c"], "address": {"zip": "9000"}}));

        let merged = merge_records(base, overlay);
        assert_eq!(
            Value::Object(merged),
            json!({"id": "4x1", "lastname": "Jones", "tags": ["c"], "address": {"zip": "9000"}})
        );
    }

    #[test]
    fn test_lookup_query_uses_like_and_joins_with_and() {
        let query = lookup_query("Contacts", [("lastname", "Smith"), ("email", "%@acme.be")], &["id"]).unwrap();
        assert_eq!(
            query.compile().unwrap(),
            "SELECT id FROM Contacts WHERE (lastname LIKE 'Smith' AND email LIKE '%@acme.be');"
        );
    }

    #[test]
    fn test_lookup_query_requires_criteria() {
        let result = lookup_query("Contacts", Vec::<(String, String)>::new(), &[]);
        assert!(matches!(result, Err(ApiError::InvalidArgument { .. })));
    }

    #[test]
    fn test_delete_result_shapes() {
        assert!(delete_succeeded(&json!({"status": "successful"})));
        assert!(delete_succeeded(&json!(true)));
        assert!(!delete_succeeded(&json!({"status": "failed"})));
        assert!(!delete_succeeded(&Value::Null));
    }

    #[test]
    fn test_start_of_today_is_midnight() {
        let midnight = start_of_today();
        assert_eq!(midnight.timestamp() % 86_400, 0);
        assert!(midnight <= Utc::now());
    }
}
