//! Network seam between the client and the web-service endpoint
//!
//! The client hands a fully encoded request to a [`Transport`] and gets back the raw
//! status and body text. [`ReqwestTransport`] is the production implementation; tests
//! plug in scripted fakes.

use super::constants::USER_AGENT;
use super::error::{ApiError, ApiResult};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to go on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Full URL; for GET it already carries the encoded payload
    pub url: String,
    /// `application/x-www-form-urlencoded` body for POST
    pub body: Option<String>,
}

impl TransportRequest {
    /// Decoded value of a payload field, looked up in the query string or form body
    pub fn param(&self, key: &str) -> Option<String> {
        let encoded = match self.method {
            HttpMethod::Get => self.url.split_once('?').map(|(_, query)| query)?,
            HttpMethod::Post => self.body.as_deref()?,
        };
        encoded.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = urlencoding::decode(k).ok()?;
            if k != key {
                return None;
            }
            urlencoding::decode(v).ok().map(|v| v.into_owned())
        })
    }
}

/// Raw HTTP outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Connection refused, timeout, DNS failure and the like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Sends one request and returns the raw response or fails
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport with a single uniform timeout
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::invalid_argument("request_timeout", format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Wrap an already configured HTTP client
    pub fn with_custom_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.http_client.get(&request.url),
            HttpMethod::Post => self
                .http_client
                .post(&request.url)
                .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.body.unwrap_or_default()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_reads_query_string() {
        let request = TransportRequest {
            method: HttpMethod::Get,
            url: "http://vtiger.local/webservice.php?operation=query&query=SELECT%20%2A%20FROM%20Leads%3B".to_string(),
            body: None,
        };
        assert_eq!(request.param("operation").as_deref(), Some("query"));
        assert_eq!(request.param("query").as_deref(), Some("SELECT * FROM Leads;"));
        assert_eq!(request.param("sessionName"), None);
    }

    #[test]
    fn test_param_reads_form_body() {
        let request = TransportRequest {
            method: HttpMethod::Post,
            url: "http://vtiger.local/webservice.php".to_string(),
            body: Some("accessKey=abc&operation=login&sessionName=".to_string()),
        };
        assert_eq!(request.param("operation").as_deref(), Some("login"));
        assert_eq!(request.param("sessionName").as_deref(), Some(""));
    }
}
