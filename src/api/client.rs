use super::auth::AuthManager;
use super::constants::{fields, operations, webservice_endpoint};
use super::entities::Entities;
use super::envelope::{OperationEnvelope, ResponseEnvelope, decode_result};
use super::error::{ApiError, ApiResult};
use super::models::ServiceSession;
use super::modules::Modules;
use super::query::QueryBuilder;
use super::transport::{HttpMethod, ReqwestTransport, Transport, TransportRequest};
use crate::config::ClientOptions;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// vtiger web-service client.
///
/// Owns the session and the transport; every operation goes through
/// [`VtigerClient::dispatch`], which renews the session when needed and maps the
/// response envelope onto a typed result or an [`ApiError`].
pub struct VtigerClient {
    endpoint: String,
    transport: Arc<dyn Transport>,
    auth: AuthManager,
}

impl VtigerClient {
    /// Client talking HTTP through `reqwest` with the configured timeout
    pub fn new(options: ClientOptions) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(options.request_timeout_secs))?;
        Self::with_transport(options, Arc::new(transport))
    }

    /// Client using a caller-provided transport.
    ///
    /// Fails with [`ApiError::InvalidArgument`] when the configured username or secret is blank.
    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> ApiResult<Self> {
        let endpoint = webservice_endpoint(&options.base_url, &options.webservice_path);
        let credentials = options.credentials()?;
        Ok(Self {
            endpoint,
            transport,
            auth: AuthManager::new(Some(credentials), options.auth_mode),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Arc<ServiceSession> {
        self.auth.session()
    }

    /// Resume a previously established session
    pub fn restore_session(&self, session: ServiceSession) {
        self.auth.replace_session(session);
    }

    pub fn query(&self, module: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(module)
    }

    pub fn entities(&self) -> Entities<'_> {
        Entities::new(self)
    }

    pub fn modules(&self) -> Modules<'_> {
        Modules::new(self)
    }

    /// Start building a call to any web-service operation
    pub fn invoke(&self, operation: impl Into<String>) -> OperationRequest<'_> {
        OperationRequest {
            client: self,
            envelope: OperationEnvelope::new(operation),
        }
    }

    /// Send an operation and decode its result into `T`.
    ///
    /// Pass `serde_json::Value` as `T` to get the raw result.
    pub async fn dispatch<T: DeserializeOwned>(&self, envelope: OperationEnvelope, method: HttpMethod) -> ApiResult<T> {
        let operation = match envelope.operation() {
            Some(operation) if !operation.trim().is_empty() => operation.to_string(),
            _ => {
                return Err(ApiError::invalid_argument(
                    fields::OPERATION,
                    "please specify a valid operation",
                ));
            }
        };

        let result = if operation == operations::GET_CHALLENGE {
            self.transmit(envelope, method).await?
        } else {
            self.ensure_authenticated().await?;
            self.transmit_with_session(envelope, method).await?
        };

        decode_result(result)
    }

    /// Inject the current session name, then transmit
    pub(crate) async fn transmit_with_session(&self, mut envelope: OperationEnvelope, method: HttpMethod) -> ApiResult<Value> {
        let session_name = self.session().session_name.clone().unwrap_or_default();
        envelope.insert(fields::SESSION_NAME, session_name);
        self.transmit(envelope, method).await
    }

    /// Send an envelope as-is and unwrap the response envelope
    pub(crate) async fn transmit(&self, envelope: OperationEnvelope, method: HttpMethod) -> ApiResult<Value> {
        let correlation_id = uuid::Uuid::new_v4();
        let operation = envelope.operation().unwrap_or_default().to_string();
        let request = self.build_request(&envelope, method);

        log::debug!(
            "[{}] {} {} {}",
            correlation_id,
            method,
            operation,
            envelope.redacted()
        );

        let url = request.url.clone();
        let response = self.transport.send(request).await.map_err(|e| {
            log::warn!("[{}] {} {} failed: {}", correlation_id, method, operation, e);
            ApiError::Transmission {
                method: method.to_string(),
                url: url.clone(),
                message: e.message,
            }
        })?;

        log::debug!("[{}] {} answered with HTTP {}", correlation_id, operation, response.status);

        if response.status > 399 {
            return Err(ApiError::Transmission {
                method: method.to_string(),
                url,
                message: format!("server responded with HTTP {}: {}", response.status, response.body),
            });
        }

        let outcome = ResponseEnvelope::parse(&response.body).and_then(ResponseEnvelope::into_result);
        if let Err(e) = &outcome {
            log::warn!("[{}] {} failed ({}): {}", correlation_id, operation, e.kind(), e);
        }
        outcome
    }

    fn build_request(&self, envelope: &OperationEnvelope, method: HttpMethod) -> TransportRequest {
        let encoded = envelope.to_urlencoded();
        match method {
            HttpMethod::Get => TransportRequest {
                method,
                url: format!("{}?{}", self.endpoint, encoded),
                body: None,
            },
            HttpMethod::Post => TransportRequest {
                method,
                url: self.endpoint.clone(),
                body: Some(encoded),
            },
        }
    }
}

/// Fluent call to an arbitrary operation
pub struct OperationRequest<'a> {
    client: &'a VtigerClient,
    envelope: OperationEnvelope,
}

impl<'a> OperationRequest<'a> {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envelope.insert(key, value);
        self
    }

    pub fn envelope(&self) -> &OperationEnvelope {
        &self.envelope
    }

    pub async fn send<T: DeserializeOwned>(self, method: HttpMethod) -> ApiResult<T> {
        self.client.dispatch(self.envelope, method).await
    }
}
