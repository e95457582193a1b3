use crate::config::toml_config::ConnectorConfig;
use crate::core::catalog::CatalogFormat;
use crate::domain::endpoint::Endpoint;
use crate::utils::error::{ConnectorError, Result};
use crate::utils::extra_keys::remove_credentials;
use crate::utils::validation::{validate_url, validate_vin, Validate};
use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[command(name = "myskoda-connect")]
#[command(about = "Endpoint catalog and client for the MySkoda cloud API", version)]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub json_logs: bool,

    /// Override the API base URL (e.g. a local proxy)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer access token
    #[arg(long, global = true, env = "MYSKODA_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the endpoint catalog
    Endpoints {
        #[arg(long, value_enum)]
        format: Option<CatalogFormat>,
        /// Only verify the catalog is consistent
        #[arg(long)]
        check: bool,
    },
    /// Print the URL of one endpoint
    Url {
        endpoint: Endpoint,
        #[arg(long)]
        vin: Option<String>,
    },
    /// Print the OIDC login URL to open in a browser
    AuthorizeUrl {
        #[arg(long)]
        state: String,
    },
    /// GET an endpoint and print the raw JSON
    Fetch {
        endpoint: Endpoint,
        #[arg(long)]
        vin: Option<String>,
    },
    /// Send a vehicle command without waiting for it to complete
    Command {
        endpoint: Endpoint,
        #[arg(long)]
        vin: Option<String>,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
    /// Read every vehicle endpoint and store the responses
    Snapshot {
        #[arg(long)]
        vin: Option<String>,
        /// Output directory, overrides output.path
        #[arg(long)]
        output: Option<String>,
    },
    /// List vehicles on the account
    Garage,
}

impl CliConfig {
    /// File configuration (or defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<ConnectorConfig> {
        let mut config = match &self.config {
            Some(path) => ConnectorConfig::from_file(path)?,
            None => ConnectorConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            // Expiry and refresh token in the file belong to the old token.
            config.auth.access_token = Some(token.clone());
            config.auth.refresh_token = None;
            config.auth.expires_at = None;
        }
        if let Commands::Snapshot {
            output: Some(output),
            ..
        } = &self.command
        {
            config.output.path = output.clone();
        }
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.json_logs;

        Ok(config)
    }

    /// VIN given on the command line, else the first configured one.
    pub fn vin_or_default(&self, vin: Option<&str>, config: &ConnectorConfig) -> Result<String> {
        vin.or_else(|| config.default_vin())
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::MissingConfigError {
                field: "vin".to_string(),
            })
    }
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut command = self.command.clone();
        if let Commands::Command {
            body: Some(body), ..
        } = &mut command
        {
            *body = match serde_json::from_str(body) {
                Ok(value) => remove_credentials(&value).to_string(),
                Err(_) => "***".to_string(),
            };
        }
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("json_logs", &self.json_logs)
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("command", &command)
            .finish()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_url("--base-url", base_url)?;
        }
        let vin = match &self.command {
            Commands::Url { vin, .. }
            | Commands::Fetch { vin, .. }
            | Commands::Command { vin, .. }
            | Commands::Snapshot { vin, .. } => vin.as_deref(),
            _ => None,
        };
        if let Some(vin) = vin {
            validate_vin("--vin", vin)?;
        }
        if let Commands::Command {
            body: Some(body), ..
        } = &self.command
        {
            serde_json::from_str::<serde_json::Value>(body).map_err(|e| {
                ConnectorError::InvalidConfigValueError {
                    field: "--body".to_string(),
                    value: body.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }
}
