//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// REST service settings
    #[serde(default)]
    pub server: RawServerConfig,

    /// Token issuance and login throttling
    #[serde(default)]
    pub auth: RawAuthConfig,

    /// Desktop client settings
    #[serde(default)]
    pub client: RawClientConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServerConfig {
    /// Socket address to bind (default: 127.0.0.1:5000)
    pub listen_addr: Option<String>,

    /// Data directory for the service store
    pub data_dir: Option<PathBuf>,

    /// Origins allowed by CORS
    pub cors_allow_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAuthConfig {
    /// HMAC secret for bearer tokens. May instead come from the environment.
    pub jwt_secret: Option<String>,

    /// Token validity in days (default: 7)
    pub token_ttl_days: Option<u64>,

    /// Login attempts allowed per email per minute (default: 10)
    pub login_attempts_per_minute: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawClientConfig {
    /// Base URL of the REST service
    pub api_url: Option<String>,

    /// Data directory for local client state
    pub data_dir: Option<PathBuf>,
}
