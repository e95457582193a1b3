use crate::core::auth::TokenSet;
use crate::core::catalog::CatalogFormat;
use crate::domain::endpoint::{ApiBase, DEFAULT_API_BASE, DEFAULT_IDENTITY_BASE};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ConnectorError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_SCOPE: &str = "address badge birthdate cars driversLicense dealers email mileage mbb nationalIdentifier openid phone profession profile vin";
pub const DEFAULT_USER_AGENT: &str = concat!("myskoda-connect/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Allow calling endpoints that are documented but disabled (vehicle wake-up).
    pub allow_disabled_endpoints: bool,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub vehicles: VehiclesConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub identity_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            identity_url: DEFAULT_IDENTITY_BASE.to_string(),
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            client_id: None,
            redirect_uri: None,
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehiclesConfig {
    pub vins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: CatalogFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./snapshots".to_string(),
            format: CatalogFormat::Markdown,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
    pub show_extra_keys: bool,
}

/// A value still shaped like `${VAR}` after substitution was never set.
fn is_unresolved(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

impl ConnectorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConnectorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConnectorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConnectorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_url("api.identity_url", &self.api.identity_url)?;
        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 300)?;
        validation::validate_non_empty_string("api.user_agent", &self.api.user_agent)?;
        validation::validate_path("output.path", &self.output.path)?;

        for vin in &self.vehicles.vins {
            validation::validate_vin("vehicles.vins", vin)?;
        }

        if let Some(redirect_uri) = &self.auth.redirect_uri {
            if !is_unresolved(redirect_uri) {
                validation::validate_non_empty_string("auth.redirect_uri", redirect_uri)?;
            }
        }

        Ok(())
    }

    pub fn api_base(&self) -> ApiBase {
        ApiBase::new(self.api.base_url.clone(), self.api.identity_url.clone())
    }

    /// The configured access token, ignoring empty or unresolved `${VAR}` values.
    pub fn access_token(&self) -> Option<&str> {
        self.auth
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !is_unresolved(t))
    }

    pub fn require_access_token(&self) -> Result<&str> {
        self.access_token()
            .ok_or_else(|| ConnectorError::MissingConfigError {
                field: "auth.access_token".to_string(),
            })
    }

    pub fn token_set(&self) -> Option<TokenSet> {
        let access_token = self.access_token()?;
        let refresh_token = self
            .auth
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty() && !is_unresolved(t));
        Some(TokenSet::new(
            access_token.to_string(),
            refresh_token.map(str::to_string),
            self.auth.expires_at,
        ))
    }

    pub fn default_vin(&self) -> Option<&str> {
        self.vehicles.vins.first().map(String::as_str)
    }
}

impl ConfigProvider for ConnectorConfig {
    fn api_base(&self) -> ApiBase {
        ConnectorConfig::api_base(self)
    }

    fn access_token(&self) -> Option<&str> {
        ConnectorConfig::access_token(self)
    }

    fn timeout_seconds(&self) -> u64 {
        self.api.timeout_seconds
    }

    fn user_agent(&self) -> &str {
        &self.api.user_agent
    }

    fn allow_disabled_endpoints(&self) -> bool {
        self.allow_disabled_endpoints
    }
}

impl Validate for ConnectorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
