use crate::api::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_WEBSERVICE_PATH};
use crate::api::error::ApiResult;
use crate::api::models::{AuthMode, Credentials};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Everything needed to reach and log in to one CRM instance
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub base_url: String,
    pub username: String,
    /// Access key, or password when `auth_mode` is `password`
    pub secret: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_webservice_path")]
    pub webservice_path: String,
    #[serde(default)]
    pub auth_mode: AuthMode,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_webservice_path() -> String {
    DEFAULT_WEBSERVICE_PATH.to_string()
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            username: credentials.username().to_string(),
            secret: credentials.secret().to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            webservice_path: default_webservice_path(),
            auth_mode: AuthMode::AccessKey,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    pub fn with_webservice_path(mut self, path: impl Into<String>) -> Self {
        self.webservice_path = path.into();
        self
    }

    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    pub fn credentials(&self) -> ApiResult<Credentials> {
        Credentials::new(self.username.clone(), self.secret.clone())
    }

    /// Read options from `VTIGER_*` variables, loading a `.env` file first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        info!("Reading client options from environment variables");

        let base_url = std::env::var("VTIGER_URL").context("VTIGER_URL environment variable not set")?;
        let username = std::env::var("VTIGER_USERNAME").context("VTIGER_USERNAME environment variable not set")?;

        let (secret, auth_mode) = match std::env::var("VTIGER_ACCESS_KEY") {
            Ok(key) => (key, AuthMode::AccessKey),
            Err(_) => {
                let password = std::env::var("VTIGER_PASSWORD")
                    .context("Neither VTIGER_ACCESS_KEY nor VTIGER_PASSWORD environment variable is set")?;
                (password, AuthMode::Password)
            }
        };

        let credentials = Credentials::new(username, secret).context("Invalid credentials in environment")?;
        let mut options = Self::new(base_url, credentials).with_auth_mode(auth_mode);

        if let Ok(timeout) = std::env::var("VTIGER_TIMEOUT") {
            options.request_timeout_secs = timeout
                .parse()
                .with_context(|| format!("VTIGER_TIMEOUT must be a number of seconds, got '{}'", timeout))?;
        }
        if let Ok(path) = std::env::var("VTIGER_WEBSERVICE_PATH") {
            options.webservice_path = path;
        }

        debug!("Using {} as {}", options.base_url, options.username);
        Ok(options)
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("secret", &"***")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("webservice_path", &self.webservice_path)
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}

/// Persistent CLI configuration: named environments plus the current selection
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, ClientOptions>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("vtiger-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".vtiger-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using default config");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config = Self::from_toml(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded config with {} environments", config.environments.len());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Add or replace an environment; the first one added becomes current
    pub fn add_environment(&mut self, name: String, options: ClientOptions) {
        info!("Adding environment: {}", name);
        self.environments.insert(name.clone(), options);

        if self.current_environment.is_none() {
            info!("Set {} as current environment", name);
            self.current_environment = Some(name);
        }
    }

    pub fn set_current_environment(&mut self, name: &str) -> Result<()> {
        if !self.environments.contains_key(name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Setting current environment to: {}", name);
        self.current_environment = Some(name.to_string());
        Ok(())
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        if self.environments.remove(name).is_none() {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Removing environment: {}", name);
        if self.current_environment.as_deref() == Some(name) {
            warn!("Removed current environment, clearing current selection");
            self.current_environment = None;
        }
        Ok(())
    }

    pub fn list_environments(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.environments.keys().collect();
        names.sort();
        names
    }

    /// Options for `name`, or for the current environment when `name` is `None`
    pub fn resolve(&self, name: Option<&str>) -> Option<&ClientOptions> {
        let name = name.or(self.current_environment.as_deref())?;
        self.environments.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(url: &str) -> ClientOptions {
        ClientOptions::new(url, Credentials::new("admin", "key").unwrap())
    }

    #[test]
    fn test_defaults() {
        let options = options("http://vtiger.local/");
        assert_eq!(options.webservice_path, "webservice.php");
        assert_eq!(options.request_timeout_secs, 30);
        assert_eq!(options.auth_mode, AuthMode::AccessKey);

        let secretive = ClientOptions::new("http://vtiger.local/", Credentials::new("admin", "topsecret").unwrap());
        assert!(!format!("{:?}", secretive).contains("topsecret"));
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = Config::from_toml(
            r#"
current_environment = "prod"

[environments.prod]
base_url = "https://crm.example.com"
username = "admin"
secret = "s3cret"

[environments.staging]
base_url = "https://staging.example.com"
username = "admin"
secret = "pw"
auth_mode = "password"
request_timeout_secs = 10
"#,
        )
        .unwrap();

        let prod = config.resolve(None).unwrap();
        assert_eq!(prod.base_url, "https://crm.example.com");
        assert_eq!(prod.webservice_path, "webservice.php");

        let staging = config.resolve(Some("staging")).unwrap();
        assert_eq!(staging.auth_mode, AuthMode::Password);
        assert_eq!(staging.request_timeout_secs, 10);
        assert!(config.resolve(Some("missing")).is_none());
    }

    #[test]
    fn test_environment_management() {
        let mut config = Config::default();
        config.add_environment("prod".to_string(), options("https://crm.example.com"));
        config.add_environment("dev".to_string(), options("http://localhost"));
        assert_eq!(config.current_environment.as_deref(), Some("prod"));
        assert_eq!(config.list_environments(), vec!["dev", "prod"]);

        config.set_current_environment("dev").unwrap();
        assert!(config.set_current_environment("nope").is_err());

        config.remove_environment("dev").unwrap();
        assert_eq!(config.current_environment, None);
        assert!(config.remove_environment("dev").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.add_environment("prod".to_string(), options("https://crm.example.com").with_timeout(5));
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
