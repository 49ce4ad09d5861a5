use super::error::{ApiError, ApiResult, require_non_blank};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How the configured secret is turned into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// The secret is the user's web-service access key
    #[default]
    AccessKey,
    /// The secret is the user's password, exchanged through `login_pwd`
    Password,
}

/// Username plus access key or password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> ApiResult<Self> {
        let username = username.into();
        let secret = secret.into();
        require_non_blank("username", &username)?;
        require_non_blank("secret", &secret)?;
        Ok(Self { username, secret })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// The user a session was opened for
#[derive(Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Server-assigned typed id of the user record, e.g. `19x1`
    pub id: String,
    pub username: String,
    /// Access key used for the login, kept for re-authentication
    pub secret: String,
}

impl UserIdentity {
    pub fn credentials(&self) -> ApiResult<Credentials> {
        Credentials::new(self.username.clone(), self.secret.clone())
    }
}

impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// Dotted numeric version as reported by the server (`0.22`, `7.1.0`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceVersion {
    components: Vec<u32>,
}

impl ServiceVersion {
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl Default for ServiceVersion {
    fn default() -> Self {
        Self {
            components: vec![0, 0],
        }
    }
}

impl FromStr for ServiceVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ApiError::invalid_argument("version", format!("'{}' is not a dotted version", s)))?;
        Ok(Self { components })
    }
}

impl Ord for ServiceVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ServiceVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ServiceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Authentication state of one logical connection.
///
/// Only ever replaced as a whole record by the auth manager, so a reader never sees a
/// fresh token paired with a stale expiration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSession {
    pub session_name: Option<String>,
    pub service_token: Option<String>,
    pub token_expiration: DateTime<Utc>,
    pub current_user: Option<UserIdentity>,
    pub api_version: ServiceVersion,
    pub crm_version: ServiceVersion,
}

impl ServiceSession {
    /// A session that has never talked to the server; already expired
    pub fn unauthenticated() -> Self {
        Self {
            session_name: None,
            service_token: None,
            token_expiration: DateTime::<Utc>::UNIX_EPOCH,
            current_user: None,
            api_version: ServiceVersion::default(),
            crm_version: ServiceVersion::default(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.token_expiration
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.as_ref().is_some_and(|user| !user.id.is_empty())
    }
}

impl Default for ServiceSession {
    fn default() -> Self {
        Self::unauthenticated()
    }
}
