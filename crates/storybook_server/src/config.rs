//! Layered server configuration.
//!
//! Settings resolve in order: the bundled `storybook.toml` defaults, then an
//! optional file, then `STORYBOOK__SECTION__KEY` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use storybook_error::{ConfigError, StorybookResult};
use storybook_generator::StageModels;
use storybook_models::Endpoint;

const DEFAULT_CONFIG: &str = include_str!("../storybook.toml");

/// Listening address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl ServerSettings {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Record store connection.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum pooled connections
    pub pool_size: u32,
}

/// Bearer token verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Identity provider domain, e.g. `clerk.example.com`
    pub clerk_domain: String,
    /// Required `aud` claim
    pub audience: String,
    /// Override for the key set location
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// Clock skew tolerated on `exp`
    pub leeway_seconds: u64,
}

impl AuthSettings {
    /// Expected `iss` claim.
    pub fn issuer(&self) -> String {
        format!("https://{}", self.clerk_domain)
    }

    /// Where signing keys are published.
    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("{}/.well-known/jwks.json", self.issuer()))
    }
}

/// One provider endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSettings {
    /// API base URL
    pub base_url: String,
    /// Bearer key, if the endpoint needs one
    #[serde(default)]
    pub api_key: Option<String>,
}

impl EndpointSettings {
    /// Client endpoint for these settings.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.base_url, self.api_key.clone())
    }
}

/// Text generation endpoints per provider. Only OpenAI is required.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    /// OpenAI-compatible endpoint
    pub openai: EndpointSettings,
    /// Google endpoint (OpenAI-compatible surface)
    #[serde(default)]
    pub google: Option<EndpointSettings>,
    /// Anthropic endpoint (OpenAI-compatible surface)
    #[serde(default)]
    pub claude: Option<EndpointSettings>,
}

/// Generated media storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory files are written under
    pub root: PathBuf,
    /// URL prefix the directory is served from
    pub public_base_url: String,
}

/// Log output and span export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Service name attached to exported spans
    pub service_name: String,
    /// Filter directives used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON lines instead of plain text
    pub json_logs: bool,
    /// Export spans to stdout through OpenTelemetry
    pub export_spans: bool,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            service_name: "storybook-server".to_string(),
            log_filter: "info".to_string(),
            json_logs: false,
            export_spans: false,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listening address
    pub server: ServerSettings,
    /// Record store
    pub database: DatabaseSettings,
    /// Token verification
    pub auth: AuthSettings,
    /// Text generation endpoints
    pub oracle: OracleSettings,
    /// Image generation endpoint
    pub image: EndpointSettings,
    /// Media storage
    pub storage: StorageSettings,
    /// Model per pipeline stage
    #[serde(default)]
    pub models: StageModels,
    /// Logging
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

impl AppConfig {
    /// Load configuration from defaults, `path` (or `./storybook.toml` when
    /// present) and the environment.
    pub fn load(path: Option<&Path>) -> StorybookResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        builder = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name("storybook").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("STORYBOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?;

        Self::finish(config)
    }

    /// Defaults overlaid with a TOML document. Ignores the environment.
    pub fn from_toml(overrides: &str) -> StorybookResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?;

        Self::finish(config)
    }

    fn finish(config: Config) -> StorybookResult<Self> {
        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to deserialize configuration: {}", e)))?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> StorybookResult<()> {
        if self.database.pool_size == 0 {
            return Err(ConfigError::new("database.pool_size must be at least 1").into());
        }
        if self.auth.audience.trim().is_empty() {
            return Err(ConfigError::new("auth.audience must not be blank").into());
        }
        Ok(())
    }
}
