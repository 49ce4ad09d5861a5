//! Session authentication for the vtiger web-service API
//!
//! Login is a two-step handshake: `getchallenge` hands out a short-lived token, and
//! `login` proves knowledge of the access key by sending `md5(token + access_key)`.
//! The resulting session expires with the token; [`VtigerClient::ensure_authenticated`]
//! runs the handshake again before any call made after that point.

use super::client::VtigerClient;
use super::constants::{fields, operations};
use super::envelope::OperationEnvelope;
use super::error::{ApiError, ApiResult, require_non_blank};
use super::models::{AuthMode, Credentials, ServiceSession, ServiceVersion, UserIdentity};
use super::transport::HttpMethod;
use chrono::{DateTime, TimeZone, Utc};
use md5::{Digest, Md5};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Owns the session record and the credentials used to renew it
pub struct AuthManager {
    session: RwLock<Arc<ServiceSession>>,
    reauth_lock: tokio::sync::Mutex<()>,
    credentials: Option<Credentials>,
    mode: AuthMode,
}

impl AuthManager {
    pub fn new(credentials: Option<Credentials>, mode: AuthMode) -> Self {
        Self {
            session: RwLock::new(Arc::new(ServiceSession::unauthenticated())),
            reauth_lock: tokio::sync::Mutex::new(()),
            credentials,
            mode,
        }
    }

    /// Snapshot of the current session record
    pub fn session(&self) -> Arc<ServiceSession> {
        let guard = self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new session record as a single unit
    pub fn replace_session(&self, session: ServiceSession) {
        self.update_session(|_| session);
    }

    /// Derive the next session record from the current one under a single write lock
    pub fn update_session(&self, next: impl FnOnce(&ServiceSession) -> ServiceSession) {
        let mut guard = self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(next(&guard));
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn configured_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn needs_reauthentication(&self, now: DateTime<Utc>) -> bool {
        self.session().is_expired(now)
    }

    /// Store the outcome of a challenge; true when a usable token came back
    fn apply_challenge(&self, result: &Value) -> bool {
        let token = result
            .get("token")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty());
        let expire_time = epoch_seconds(result, "expireTime").unwrap_or(0);
        let expiration = Utc
            .timestamp_opt(expire_time, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        self.update_session(|current| ServiceSession {
            service_token: token.clone(),
            token_expiration: expiration,
            ..current.clone()
        });

        token.is_some() && expire_time > 0
    }

    /// Store the outcome of a login; true when the server assigned a user id
    fn apply_login(&self, result: &Value, credentials: &Credentials) -> ApiResult<bool> {
        if !result.is_object() {
            return Err(ApiError::Authentication(format!(
                "failed to log in as '{}': unexpected login result {}",
                credentials.username(),
                result
            )));
        }

        let user = UserIdentity {
            id: string_value(result, "userId"),
            username: credentials.username().to_string(),
            secret: credentials.secret().to_string(),
        };
        let logged_in = !user.id.trim().is_empty();

        self.update_session(|current| ServiceSession {
            session_name: Some(string_value(result, "sessionName")).filter(|s| !s.is_empty()),
            service_token: current.service_token.clone(),
            token_expiration: current.token_expiration,
            current_user: Some(user),
            api_version: parse_version(result, "version"),
            crm_version: parse_version(result, "vtigerVersion"),
        });

        Ok(logged_in)
    }

    /// Credentials for a transparent re-login: whoever is logged in, else the configured ones
    fn renewal_credentials(&self) -> ApiResult<(Credentials, AuthMode)> {
        if let Some(user) = self.session().current_user.as_ref() {
            return Ok((user.credentials()?, AuthMode::AccessKey));
        }
        self.credentials
            .clone()
            .map(|credentials| (credentials, self.mode))
            .ok_or_else(|| ApiError::Authentication("no credentials available to log in".to_string()))
    }
}

/// `lowercase_hex(md5(token + secret))`
pub fn salted_access_key(service_token: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(service_token.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl VtigerClient {
    /// Fetch a challenge token for `username` and store it with its expiration.
    ///
    /// Returns false when the server did not hand out a token or a positive expiration.
    pub async fn request_challenge(&self, username: &str) -> ApiResult<bool> {
        require_non_blank("username", username)?;

        let envelope = OperationEnvelope::new(operations::GET_CHALLENGE).with(fields::USERNAME, username);
        let result = self.transmit(envelope, HttpMethod::Get).await?;

        let passed = self.auth().apply_challenge(&result);
        if passed {
            log::debug!(
                "Challenge passed for {}, token valid until {}",
                username,
                self.session().token_expiration
            );
        } else {
            log::warn!("Challenge for {} returned no usable token", username);
        }
        Ok(passed)
    }

    /// Log in with a previously obtained challenge token
    pub async fn login_after_challenge(&self, credentials: &Credentials) -> ApiResult<bool> {
        let token = self
            .session()
            .service_token
            .clone()
            .ok_or_else(|| ApiError::Authentication("no challenge token, request a challenge first".to_string()))?;

        let envelope = OperationEnvelope::new(operations::LOGIN)
            .with(fields::USERNAME, credentials.username())
            .with(fields::ACCESS_KEY, salted_access_key(&token, credentials.secret()));

        let result = self
            .transmit_with_session(envelope, HttpMethod::Post)
            .await
            .map_err(|e| login_error(credentials, e))?;

        let logged_in = self.auth().apply_login(&result, credentials)?;
        if logged_in {
            let session = self.session();
            log::info!(
                "Logged in as {} (api {}, crm {})",
                credentials.username(),
                session.api_version,
                session.crm_version
            );
        }
        Ok(logged_in)
    }

    /// Challenge plus login with an access key
    pub async fn login_with_credentials(&self, credentials: &Credentials) -> ApiResult<bool> {
        let _guard = self.auth().reauth_lock.lock().await;
        self.challenge_and_login(credentials).await
    }

    /// Exchange a password for the user's access key, then log in with it
    pub async fn login_with_password(&self, username: &str, password: &str) -> ApiResult<bool> {
        let _guard = self.auth().reauth_lock.lock().await;
        self.password_login(username, password).await
    }

    /// Log in with the configured credentials and authentication mode
    pub async fn login(&self) -> ApiResult<bool> {
        let credentials = self
            .auth()
            .configured_credentials()
            .cloned()
            .ok_or_else(|| ApiError::Authentication("no credentials configured".to_string()))?;

        let _guard = self.auth().reauth_lock.lock().await;
        self.login_as(&credentials, self.auth().mode()).await
    }

    // The handshakes below assume the caller holds `reauth_lock`, so the challenge
    // token cannot be swapped out between the challenge and the login.

    async fn challenge_and_login(&self, credentials: &Credentials) -> ApiResult<bool> {
        if !self.request_challenge(credentials.username()).await? {
            return Ok(false);
        }
        self.login_after_challenge(credentials).await
    }

    async fn password_login(&self, username: &str, password: &str) -> ApiResult<bool> {
        let password_credentials = Credentials::new(username, password)?;
        if !self.request_challenge(username).await? {
            return Ok(false);
        }

        let envelope = OperationEnvelope::new(operations::LOGIN_PASSWORD)
            .with(fields::USERNAME, username)
            .with(fields::PASSWORD, password);

        let result = self
            .transmit_with_session(envelope, HttpMethod::Post)
            .await
            .map_err(|e| login_error(&password_credentials, e))?;

        let access_key = extract_access_key(&result).ok_or_else(|| {
            ApiError::Authentication(format!("no access key returned for '{}'", username))
        })?;

        self.challenge_and_login(&Credentials::new(username, access_key)?)
            .await
    }

    async fn login_as(&self, credentials: &Credentials, mode: AuthMode) -> ApiResult<bool> {
        match mode {
            AuthMode::AccessKey => self.challenge_and_login(credentials).await,
            AuthMode::Password => {
                self.password_login(credentials.username(), credentials.secret())
                    .await
            }
        }
    }

    /// Re-run the login handshake when the service token has expired.
    ///
    /// No-op while the token is valid. Failure surfaces from the call that triggered it.
    pub async fn ensure_authenticated(&self) -> ApiResult<()> {
        if !self.auth().needs_reauthentication(Utc::now()) {
            return Ok(());
        }

        let _guard = self.auth().reauth_lock.lock().await;
        if !self.auth().needs_reauthentication(Utc::now()) {
            return Ok(());
        }

        let (credentials, mode) = self.auth().renewal_credentials()?;
        log::info!("Service token expired, logging in again as {}", credentials.username());

        if self.login_as(&credentials, mode).await? {
            Ok(())
        } else {
            Err(ApiError::Authentication(format!(
                "failed to log in again as '{}'",
                credentials.username()
            )))
        }
    }
}

fn login_error(credentials: &Credentials, error: ApiError) -> ApiError {
    match error {
        ApiError::Protocol { .. } | ApiError::UnknownServer { .. } => ApiError::Authentication(format!(
            "failed to log in as '{}': {}",
            credentials.username(),
            error
        )),
        other => other,
    }
}

fn extract_access_key(result: &Value) -> Option<String> {
    let key = match result {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::Object(_) => result.get("accesskey").and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    };
    key.map(|s| s.to_string()).filter(|s| !s.trim().is_empty())
}

fn epoch_seconds(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_value(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_version(value: &Value, key: &str) -> ServiceVersion {
    let raw = string_value(value, key);
    raw.parse().unwrap_or_else(|_| {
        if !raw.is_empty() {
            log::warn!("Ignoring unparseable {} '{}'", key, raw);
        }
        ServiceVersion::default()
    })
}
