//! ORDER BY clause for vtiger queries

use crate::api::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One or more fields sharing a single direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<String>,
    direction: SortDirection,
}

impl OrderBy {
    pub fn new<I, S>(fields: I, direction: SortDirection) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(ApiError::invalid_argument("fields", "ordering needs at least one field"));
        }
        Ok(Self { fields, direction })
    }

    pub fn asc<I, S>(fields: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, SortDirection::Asc)
    }

    pub fn desc<I, S>(fields: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, SortDirection::Desc)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `ORDER BY a,b DESC`
    pub fn to_clause(&self) -> String {
        format!("ORDER BY {} {}", self.fields.join(","), self.direction.as_str())
    }
}
