use crate::error::{DeskError, Result};
use crate::session::RefreshSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

pub const ENV_COLLECTION: &str = "CONTENTCHECK_COLLECTION";
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_EMULATOR_HOST: &str = "FIRESTORE_EMULATOR_HOST";
pub const ENV_ACCESS_TOKEN: &str = "FIRESTORE_ACCESS_TOKEN";

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RefreshConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_refresh_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    RefreshSettings::DEFAULT_INTERVAL_SECS
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: default_refresh_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Document copied by the "add a team member" admin action.
    #[serde(default = "default_template_id")]
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bearer token; only ever read from the environment.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

fn default_collection() -> String {
    "workerstatus".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("firebase_key.json")
}

fn default_template_id() -> String {
    "workerstatus".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            credentials_path: default_credentials_path(),
            template_id: default_template_id(),
            endpoint: None,
            access_token: None,
            request_timeout_secs: default_timeout_secs(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    /// Load the YAML file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    /// File (if any) then process environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Ok(Self::load(path)?.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply environment overrides through `lookup`, which keeps this testable
    /// without touching the real process environment.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(collection) = non_empty(ENV_COLLECTION) {
            self.collection = collection;
        }
        if let Some(path) = non_empty(ENV_CREDENTIALS) {
            self.credentials_path = PathBuf::from(path);
        }
        if let Some(host) = non_empty(ENV_EMULATOR_HOST) {
            self.endpoint = Some(if host.contains("://") {
                host
            } else {
                format!("http://{host}")
            });
        }
        if let Some(token) = non_empty(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Initial refresh settings for a new session.
    pub fn refresh_settings(&self) -> Result<RefreshSettings> {
        RefreshSettings::new(self.refresh.enabled, self.refresh.interval_secs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.collection.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "collection name is empty".to_string(),
            });
        }

        if self.template_id.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "template_id is empty; adding team members will fail".to_string(),
            });
        }

        if RefreshSettings::new(true, self.refresh.interval_secs).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "refresh.interval_secs={} is outside {}..={}",
                    self.refresh.interval_secs,
                    RefreshSettings::MIN_INTERVAL_SECS,
                    RefreshSettings::MAX_INTERVAL_SECS
                ),
            });
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("endpoint '{endpoint}' is not an http(s) URL"),
                });
            }
        }

        if !self.credentials_path.exists() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "credentials file '{}' not found; the dashboard will show a store error",
                    self.credentials_path.display()
                ),
            });
        }

        if self.request_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "request_timeout_secs is 0; store requests will never time out"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The parts of a credentials file the REST backend needs. Service-account
/// files are accepted as-is; unrelated keys are ignored.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("has_private_key", &self.private_key.is_some())
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            DeskError::StoreUnavailable(format!(
                "cannot read credentials file '{}': {e}",
                path.display()
            ))
        })?;
        let creds: Credentials = serde_json::from_str(&data).map_err(|e| {
            DeskError::StoreUnavailable(format!(
                "credentials file '{}' is not valid: {e}",
                path.display()
            ))
        })?;
        if creds.project_id.trim().is_empty() {
            return Err(DeskError::StoreUnavailable(format!(
                "credentials file '{}' has an empty project_id",
                path.display()
            )));
        }
        Ok(creds)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
