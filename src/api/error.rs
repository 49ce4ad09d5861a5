//! Error taxonomy for the vtiger web-service client
//!
//! Every failure a library call can produce maps onto exactly one variant, so callers
//! can tell a bug in their own arguments apart from a refused login, a dead network
//! or a server that answered with something unexpected.

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the `api` module
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller-supplied data violates a precondition (empty strings, empty condition
    /// groups, a LIKE-family or IN condition without a value)
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The challenge or login step failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure or a non-success HTTP status
    #[error("Failed to execute {method} request on '{url}': {message}")]
    Transmission {
        method: String,
        url: String,
        message: String,
    },

    /// Well-formed HTTP response whose body matches neither envelope shape
    #[error("Unexpected response from server: {message}")]
    Protocol { message: String, body: String },

    /// Response body is not valid JSON
    #[error("Failed to parse the server response '{body}': {reason}")]
    UnknownServer { body: String, reason: String },

    /// The server reported `{"error": {"code", "message"}}`
    #[error("Remote service error {code}: {message}")]
    RemoteService { code: String, message: String },

    /// The `result` payload does not convert to the requested type
    #[error("Result does not match the requested shape: {reason}")]
    ResponseShape { reason: String, result: Value },
}

impl ApiError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn protocol(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Short class name, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Authentication(_) => "authentication",
            Self::Transmission { .. } => "transmission",
            Self::Protocol { .. } => "protocol",
            Self::UnknownServer { .. } => "unknown_server",
            Self::RemoteService { .. } => "remote_service",
            Self::ResponseShape { .. } => "response_shape",
        }
    }
}

/// Fails with [`ApiError::InvalidArgument`] when `value` is empty or whitespace
pub(crate) fn require_non_blank(name: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_argument(name, "must be a non-empty string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_service_message() {
        let err = ApiError::RemoteService {
            code: "ACCESS_DENIED".to_string(),
            message: "Permission to perform the operation is denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote service error ACCESS_DENIED: Permission to perform the operation is denied"
        );
        assert_eq!(err.kind(), "remote_service");
    }

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank("module", "Leads").is_ok());
        assert!(matches!(
            require_non_blank("module", "   "),
            Err(ApiError::InvalidArgument { name, .. }) if name == "module"
        ));
    }
}
