//! QueryBuilder for fluent query construction
//!
//! Chain methods consume and return the builder; terminal calls compile the query and
//! send it through the `query` operation over GET.

use super::condition::Condition;
use super::orderby::{OrderBy, SortDirection};
use super::query::{ConditionGroup, Joiner, Projection, Query};
use super::result::count_from_rows;
use crate::api::client::VtigerClient;
use crate::api::constants::{fields, operations};
use crate::api::envelope::OperationEnvelope;
use crate::api::error::{ApiError, ApiResult};
use crate::api::transport::HttpMethod;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            query: Query::new(module),
        }
    }

    /// Add a condition, AND-joined to anything already present
    pub fn filter(self, condition: Condition) -> Self {
        self.and_filter(condition)
    }

    pub fn and_filter(mut self, condition: Condition) -> Self {
        self.query.push_group(condition.into(), Joiner::And);
        self
    }

    pub fn or_filter(mut self, condition: Condition) -> Self {
        self.query.push_group(condition.into(), Joiner::Or);
        self
    }

    pub fn filter_group(self, group: impl Into<ConditionGroup>) -> ApiResult<Self> {
        self.and_filter_group(group)
    }

    pub fn and_filter_group(self, group: impl Into<ConditionGroup>) -> ApiResult<Self> {
        self.push_group(group.into(), Joiner::And)
    }

    pub fn or_filter_group(self, group: impl Into<ConditionGroup>) -> ApiResult<Self> {
        self.push_group(group.into(), Joiner::Or)
    }

    fn push_group(mut self, group: ConditionGroup, joiner: Joiner) -> ApiResult<Self> {
        if group.is_empty() {
            return Err(ApiError::invalid_argument("group", "condition group must not be empty"));
        }
        self.query.push_group(group, joiner);
        Ok(self)
    }

    pub fn filter_in<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Condition::in_list(column, values))
    }

    pub fn and_filter_in<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.and_filter(Condition::in_list(column, values))
    }

    pub fn or_filter_in<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.or_filter(Condition::in_list(column, values))
    }

    /// Ascending order on `fields`, replacing any previous ordering
    pub fn order_by<I, S>(self, fields: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordered(fields, SortDirection::Asc)
    }

    pub fn order_by_desc<I, S>(self, fields: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordered(fields, SortDirection::Desc)
    }

    fn ordered<I, S>(mut self, fields: I, direction: SortDirection) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.order_by = Some(OrderBy::new(fields, direction)?);
        Ok(self)
    }

    pub fn take(mut self, limit: u32) -> Self {
        self.query.limit = limit;
        self
    }

    pub fn skip(mut self, offset: u32) -> Self {
        self.query.offset = offset;
        self
    }

    /// Project specific fields, replacing any previous selection
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.projection = Projection::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn compile(&self) -> ApiResult<String> {
        self.query.compile()
    }

    /// Build the final Query object (reusable)
    pub fn build(self) -> Query {
        self.query
    }

    pub async fn fetch_many<T: DeserializeOwned>(self, client: &VtigerClient) -> ApiResult<Vec<T>> {
        let text = self.query.compile()?;
        run_query(client, text).await
    }

    /// First matching row, fetched with an implicit limit of one
    pub async fn fetch_one<T: DeserializeOwned>(self, client: &VtigerClient) -> ApiResult<Option<T>> {
        let rows: Vec<T> = self.take(1).fetch_many(client).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn count(self, client: &VtigerClient) -> ApiResult<u64> {
        let text = self.query.compile_count()?;
        let rows: Value = run_query(client, text).await?;
        count_from_rows(&rows)
    }
}

async fn run_query<T: DeserializeOwned>(client: &VtigerClient, text: String) -> ApiResult<T> {
    log::debug!("Running query: {}", text);
    let envelope = OperationEnvelope::new(operations::QUERY).with(fields::QUERY, text);
    client.dispatch(envelope, HttpMethod::Get).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leads_query() {
        let sql = QueryBuilder::new("Leads")
            .select(["id", "firstname", "lastname", "company"])
            .filter_in("leadstatus", ["Cold", "Contacted", "Hot", "Warm"])
            .or_filter(Condition::contains("company", "Ltd"))
            .order_by_desc(["lead_no"])
            .unwrap()
            .take(10)
            .skip(2)
            .compile()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT id, firstname, lastname, company FROM Leads WHERE leadstatus IN ('Cold', 'Contacted', 'Hot', 'Warm') OR company LIKE '%Ltd%' ORDER BY lead_no DESC LIMIT 2, 10;"
        );
    }

    #[test]
    fn test_first_group_never_has_joiner() {
        let query = QueryBuilder::new("Contacts")
            .or_filter(Condition::eq("lastname", "Smith"))
            .filter(Condition::eq("firstname", "Jane"))
            .build();

        assert_eq!(query.groups[0].joiner(), Joiner::None);
        assert_eq!(query.groups[1].joiner(), Joiner::And);
        assert_eq!(
            query.compile().unwrap(),
            "SELECT * FROM Contacts WHERE lastname = 'Smith' AND firstname = 'Jane';"
        );
    }

    #[test]
    fn test_group_renders_parenthesized() {
        let sql = QueryBuilder::new("Contacts")
            .filter(Condition::eq("mailingcountry", "BE"))
            .or_filter_group(vec![Condition::like("email", "%@acme.be"), Condition::is_null("mobile")])
            .unwrap()
            .compile()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM Contacts WHERE mailingcountry = 'BE' OR (email LIKE '%@acme.be' AND mobile = null);"
        );
    }

    #[test]
    fn test_empty_group_rejected() {
        let result = QueryBuilder::new("Leads").filter_group(Vec::<Condition>::new());
        assert!(matches!(result, Err(ApiError::InvalidArgument { .. })));
    }

    #[test]
    fn test_order_by_replaces_previous() {
        let sql = QueryBuilder::new("Leads")
            .order_by(["lastname"])
            .unwrap()
            .order_by_desc(["createdtime", "lead_no"])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM Leads ORDER BY createdtime,lead_no DESC;");

        assert!(QueryBuilder::new("Leads").order_by(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_select_replaces_previous() {
        let query = QueryBuilder::new("Leads").select(["a"]).select(["b", "c"]).build();
        assert_eq!(query.projection, Projection::Fields(vec!["b".to_string(), "c".to_string()]));
    }
}
