//! Validated settings

use crate::schema::{RawAuthConfig, RawClientConfig, RawConfig, RawServerConfig};
use crate::validation::MAX_TOKEN_TTL_DAYS;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;
use studytimer_util::default_data_dir;

pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5000));
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_TOKEN_TTL_DAYS: u64 = 7;
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Validated configuration for the service and the client
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// None means the service has to get one from the environment or generate one
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            server: ServerSettings::from_raw(raw.server),
            auth: AuthSettings::from_raw(raw.auth),
            client: ClientSettings::from_raw(raw.client),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawConfig {
            config_version: crate::CURRENT_CONFIG_VERSION,
            server: RawServerConfig::default(),
            auth: RawAuthConfig::default(),
            client: RawClientConfig::default(),
        })
    }
}

impl ServerSettings {
    fn from_raw(raw: RawServerConfig) -> Self {
        Self {
            listen_addr: raw
                .listen_addr
                .and_then(|a| a.parse().ok())
                .unwrap_or(DEFAULT_LISTEN_ADDR),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            cors_allow_origins: raw
                .cors_allow_origins
                .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]),
        }
    }
}

impl AuthSettings {
    fn from_raw(raw: RawAuthConfig) -> Self {
        let days = raw
            .token_ttl_days
            .unwrap_or(DEFAULT_TOKEN_TTL_DAYS)
            .min(MAX_TOKEN_TTL_DAYS);
        Self {
            jwt_secret: raw.jwt_secret,
            token_ttl: Duration::from_secs(days * SECONDS_PER_DAY),
            login_attempts_per_minute: raw
                .login_attempts_per_minute
                .unwrap_or(DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE),
        }
    }
}

impl ClientSettings {
    fn from_raw(raw: RawClientConfig) -> Self {
        Self {
            api_url: raw
                .api_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
        }
    }
}
