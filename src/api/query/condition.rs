//! Filter conditions for vtiger queries
//!
//! A [`Condition`] can be built from anything; whether it is renderable is only checked
//! when the query is compiled.

use crate::api::error::{ApiError, ApiResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    Equals,
    NotEquals,
    Like,
    StartsWith,
    EndsWith,
    Contains,
    GreaterThan,
    LessThan,
    GreaterOrEquals,
    LessOrEquals,
    In,
}

impl ComparisonKind {
    /// LIKE-family kinds that wrap the value in `%` and need one to be present
    pub fn requires_value(&self) -> bool {
        matches!(self, Self::StartsWith | Self::EndsWith | Self::Contains)
    }

    fn operator(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::Like | Self::StartsWith | Self::EndsWith | Self::Contains => "LIKE",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEquals => ">=",
            Self::LessOrEquals => "<=",
            Self::In => "IN",
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    /// `None` renders as a `null` literal
    Single(Option<String>),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    column: String,
    kind: ComparisonKind,
    value: ConditionValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, kind: ComparisonKind, value: Option<String>) -> Self {
        let value = match kind {
            ComparisonKind::In => ConditionValue::List(value.into_iter().collect()),
            _ => ConditionValue::Single(value),
        };
        Self {
            column: column.into(),
            kind,
            value,
        }
    }

    fn single(column: impl Into<String>, kind: ComparisonKind, value: impl Into<String>) -> Self {
        Self::new(column, kind, Some(value.into()))
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::Equals, value)
    }

    /// `column = null`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, ComparisonKind::Equals, None)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::NotEquals, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::Like, pattern)
    }

    pub fn starts_with(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::StartsWith, value)
    }

    pub fn ends_with(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::EndsWith, value)
    }

    pub fn contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::Contains, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::GreaterThan, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::LessThan, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::GreaterOrEquals, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(column, ComparisonKind::LessOrEquals, value)
    }

    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            kind: ComparisonKind::In,
            value: ConditionValue::List(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> ComparisonKind {
        self.kind
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    /// Render to the query grammar, validating the value against the kind
    pub fn render(&self) -> ApiResult<String> {
        if self.column.trim().is_empty() {
            return Err(ApiError::invalid_argument("column", "condition column must be a non-empty string"));
        }

        let column = &self.column;
        let operator = self.kind.operator();

        match (&self.value, self.kind) {
            (ConditionValue::List(items), ComparisonKind::In) => {
                if items.is_empty() {
                    return Err(ApiError::invalid_argument(
                        column.as_str(),
                        "an IN condition needs at least one value",
                    ));
                }
                let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
                Ok(format!("{} IN ({})", column, quoted.join(", ")))
            }
            (ConditionValue::Single(value), kind) if kind.requires_value() => {
                let value = value.as_deref().ok_or_else(|| {
                    ApiError::invalid_argument(
                        column.as_str(),
                        format!("{} cannot be used with a null value", kind),
                    )
                })?;
                let pattern = match kind {
                    ComparisonKind::StartsWith => format!("{}%", value),
                    ComparisonKind::EndsWith => format!("%{}", value),
                    _ => format!("%{}%", value),
                };
                Ok(format!("{} {} '{}'", column, operator, pattern))
            }
            (ConditionValue::Single(Some(value)), _) => Ok(format!("{} {} '{}'", column, operator, value)),
            (ConditionValue::Single(None), _) => Ok(format!("{} {} null", column, operator)),
            (ConditionValue::List(items), kind) => Err(ApiError::invalid_argument(
                column.as_str(),
                format!("{} does not take a list of {} values", kind, items.len()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_templates() {
        assert_eq!(Condition::eq("lastname", "Smith").render().unwrap(), "lastname = 'Smith'");
        assert_eq!(Condition::is_null("email").render().unwrap(), "email = null");
        assert_eq!(Condition::ne("leadstatus", "Cold").render().unwrap(), "leadstatus != 'Cold'");
        assert_eq!(Condition::gt("annualrevenue", "1000").render().unwrap(), "annualrevenue > '1000'");
        assert_eq!(Condition::lt("annualrevenue", "1000").render().unwrap(), "annualrevenue < '1000'");
        assert_eq!(Condition::ge("createdtime", "2024-01-01").render().unwrap(), "createdtime >= '2024-01-01'");
        assert_eq!(Condition::le("createdtime", "2024-01-01").render().unwrap(), "createdtime <= '2024-01-01'");
    }

    #[test]
    fn test_like_family_templates() {
        assert_eq!(Condition::like("company", "Acme%").render().unwrap(), "company LIKE 'Acme%'");
        assert_eq!(Condition::starts_with("company", "Acme").render().unwrap(), "company LIKE 'Acme%'");
        assert_eq!(Condition::ends_with("company", "Ltd").render().unwrap(), "company LIKE '%Ltd'");
        assert_eq!(Condition::contains("company", "Ltd").render().unwrap(), "company LIKE '%Ltd%'");
    }

    #[test]
    fn test_in_template() {
        let condition = Condition::in_list("leadstatus", ["Cold", "Hot"]);
        assert_eq!(condition.render().unwrap(), "leadstatus IN ('Cold', 'Hot')");

        let single = Condition::new("leadstatus", ComparisonKind::In, Some("Warm".to_string()));
        assert_eq!(single.render().unwrap(), "leadstatus IN ('Warm')");
    }

    #[test]
    fn test_invalid_conditions_construct_but_fail_to_render() {
        // Construction always succeeds; validation is deferred to rendering
        let contains = Condition::new("company", ComparisonKind::Contains, None);
        let empty_in = Condition::in_list("leadstatus", Vec::<String>::new());
        let no_column = Condition::eq("", "x");

        assert!(matches!(contains.render(), Err(ApiError::InvalidArgument { .. })));
        assert!(matches!(empty_in.render(), Err(ApiError::InvalidArgument { .. })));
        assert!(matches!(no_column.render(), Err(ApiError::InvalidArgument { .. })));
    }

    #[test]
    fn test_values_are_not_escaped() {
        assert_eq!(Condition::eq("lastname", "O'Connor").render().unwrap(), "lastname = 'O'Connor'");
    }
}
