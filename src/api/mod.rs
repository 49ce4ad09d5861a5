//! vtiger CRM web-service client
//!
//! [`VtigerClient`] owns the session and the transport. Queries are built with
//! [`QueryBuilder`], entity and module operations hang off [`Entities`] and [`Modules`].

pub mod auth;
pub mod client;
pub mod constants;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod models;
pub mod modules;
pub mod query;
pub mod record;
pub mod transport;

pub use auth::{AuthManager, salted_access_key};
pub use client::{OperationRequest, VtigerClient};
pub use entities::{Entities, merge_records, numeric_id};
pub use envelope::{OperationEnvelope, ResponseEnvelope};
pub use error::{ApiError, ApiResult};
pub use metadata::{FieldInfo, FieldType, ModuleInfo, ModuleList};
pub use models::{AuthMode, Credentials, ServiceSession, ServiceVersion, UserIdentity};
pub use modules::Modules;
pub use query::{ComparisonKind, Condition, ConditionGroup, Joiner, OrderBy, Projection, Query, QueryBuilder};
pub use record::Record;
pub use transport::{HttpMethod, ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
