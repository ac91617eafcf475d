//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested
//! sections use `__` as separator, e.g. `TOKEN__SECRET`.

use factnotes_cache::CacheConfig;
use factnotes_moderation::SummarizationConfig;
use factnotes_platform_access::TokenConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Session credential signing and lifetime.
    pub token: TokenConfig,

    /// Facebook login.
    pub facebook: FacebookConfig,

    /// Cache lifetimes and capacity.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Background summarization.
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Facebook OAuth application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where Facebook sends the user back with the authorization code.
    pub redirect_uri: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Graph API profile endpoint.
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

fn default_auth_url() -> String {
    "https://www.facebook.com/v16.0/dialog/oauth".to_string()
}

fn default_token_url() -> String {
    "https://graph.facebook.com/v16.0/oauth/access_token".to_string()
}

fn default_graph_url() -> String {
    "https://graph.facebook.com/me".to_string()
}

/// Summarizer endpoint plus worker pool settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizerConfig {
    /// HTTP endpoint of the summarizer. Without one, summaries stay
    /// pending until a moderator acts.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(flatten)]
    pub pool: SummarizationConfig,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
