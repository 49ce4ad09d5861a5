//! Query building for the vtiger web-service query language
//!
//! [`Query`] is the reusable value, [`QueryBuilder`] the fluent way to make one and run it.

pub mod builder;
pub mod condition;
pub mod orderby;
pub mod query;
pub mod result;

pub use builder::QueryBuilder;
pub use condition::{ComparisonKind, Condition, ConditionValue};
pub use orderby::{OrderBy, SortDirection};
pub use query::{ConditionGroup, Joiner, Projection, Query};
pub use result::count_from_rows;
