//! Query model and compiler
//!
//! A [`Query`] is plain data; compiling it is a pure function of its state and
//! produces the web-service query language (a SELECT subset terminated by `;`).

use super::condition::Condition;
use super::orderby::OrderBy;
use crate::api::error::{ApiResult, require_non_blank};

/// How a condition group attaches to the groups before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Joiner {
    #[default]
    None,
    And,
    Or,
}

impl Joiner {
    fn prefix(&self) -> &'static str {
        match self {
            Joiner::None => "",
            Joiner::And => " AND",
            Joiner::Or => " OR",
        }
    }
}

/// Conditions AND-joined together, attached to the previous group by `joiner`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
    joiner: Joiner,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            joiner: Joiner::None,
        }
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn joiner(&self) -> Joiner {
        self.joiner
    }

    pub(crate) fn set_joiner(&mut self, joiner: Joiner) {
        self.joiner = joiner;
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// ` AND (a = '1' AND b = '2')`, or ` a = '1'` without parentheses for a single condition
    fn render(&self) -> ApiResult<String> {
        let rendered = self
            .conditions
            .iter()
            .map(Condition::render)
            .collect::<ApiResult<Vec<_>>>()?;

        let body = if rendered.len() > 1 {
            format!("({})", rendered.join(" AND "))
        } else {
            rendered.join("")
        };

        Ok(format!("{} {}", self.joiner.prefix(), body))
    }
}

impl From<Vec<Condition>> for ConditionGroup {
    fn from(conditions: Vec<Condition>) -> Self {
        Self::new(conditions)
    }
}

impl From<Condition> for ConditionGroup {
    fn from(condition: Condition) -> Self {
        Self::new(vec![condition])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Projection {
    fn render(&self) -> String {
        match self {
            Projection::Fields(fields) if !fields.is_empty() => fields.join(", "),
            _ => "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub module: String,
    pub groups: Vec<ConditionGroup>,
    pub projection: Projection,
    pub order_by: Option<OrderBy>,
    /// 0 means unbounded
    pub limit: u32,
    pub offset: u32,
}

impl Query {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            groups: Vec::new(),
            projection: Projection::All,
            order_by: None,
            limit: 0,
            offset: 0,
        }
    }

    /// Append a group; the first group never carries a joiner
    pub fn push_group(&mut self, mut group: ConditionGroup, joiner: Joiner) {
        let joiner = if self.groups.is_empty() { Joiner::None } else { joiner };
        group.set_joiner(joiner);
        self.groups.push(group);
    }

    pub fn compile(&self) -> ApiResult<String> {
        require_non_blank("module", &self.module)?;
        let mut sql = format!("SELECT {} FROM {}", self.projection.render(), self.module);
        sql.push_str(&self.where_clause()?);

        if let Some(order_by) = &self.order_by {
            sql.push(' ');
            sql.push_str(&order_by.to_clause());
        }

        if self.limit > 0 {
            if self.offset > 0 {
                sql.push_str(&format!(" LIMIT {}, {}", self.offset, self.limit));
            } else {
                sql.push_str(&format!(" LIMIT {}", self.limit));
            }
        }

        sql.push(';');
        Ok(sql)
    }

    /// `SELECT COUNT(*)` over the same conditions; projection, ordering and paging are ignored
    pub fn compile_count(&self) -> ApiResult<String> {
        require_non_blank("module", &self.module)?;
        Ok(format!("SELECT COUNT(*) FROM {}{};", self.module, self.where_clause()?))
    }

    fn where_clause(&self) -> ApiResult<String> {
        if self.groups.is_empty() {
            return Ok(String::new());
        }

        let mut clause = String::from(" WHERE");
        for group in &self.groups {
            clause.push_str(&group.render()?);
        }
        Ok(clause)
    }
}
