//! Environment Configuration
//!
//! Configuration is read once at startup into an [`AppConfig`] value which is
//! then handed by reference to the gateway client, the generation client and
//! the web state. Nothing reads the environment after that.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use itinera_core::config::{load_environment, AppConfig};
//!
//! load_environment().log();
//! let config = AppConfig::from_env().expect("missing configuration");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `GEMINI_API_KEY` | yes | |
//! | `MCP_SERVER_BASE_URL` | yes | |
//! | `MCP_SERVER_API_KEY` | yes | |
//! | `GEMINI_MODEL` | no | `gemini-2.5-flash` |
//! | `GEMINI_API_URL` | no | `https://generativelanguage.googleapis.com/v1beta` |
//! | `ITINERA_HOST` | no | `0.0.0.0` |
//! | `PORT` | no | `8080` |
//! | `GATEWAY_TIMEOUT_SECS` | no | `15` |
//! | `GENERATION_TIMEOUT_SECS` | no | `60` |
//! | `STREAM_TIMEOUT_SECS` | no | `300` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const MCP_SERVER_BASE_URL: &str = "MCP_SERVER_BASE_URL";
pub const MCP_SERVER_API_KEY: &str = "MCP_SERVER_API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 300;

/// Alternative env file paths to check (in order of priority)
pub const ENV_FILE_PATHS: &[&str] = &["/etc/itinera/environment", ".env"];

/// Configuration errors. Any of these prevents startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable(s) not set: {}", .0.join(", "))]
    MissingVar(Vec<String>),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidVar {
        key: String,
        value: String,
        reason: String,
    },
}

/// Process configuration, built once in `main`.
#[derive(Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub gemini_model: String,
    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub host: String,
    pub port: u16,
    pub gateway_timeout: Duration,
    pub generation_timeout: Duration,
    pub stream_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("gemini_api_key", &"***")
            .field("gemini_api_url", &self.gemini_api_url)
            .field("gemini_model", &self.gemini_model)
            .field("gateway_base_url", &self.gateway_base_url)
            .field("gateway_api_key", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("generation_timeout", &self.generation_timeout)
            .field("stream_timeout", &self.stream_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. All missing required keys are
    /// reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &str| {
            get(key).unwrap_or_else(|| {
                missing.push(key.to_string());
                String::new()
            })
        };

        let gemini_api_key = required(GEMINI_API_KEY);
        let gateway_base_url = required(MCP_SERVER_BASE_URL);
        let gateway_api_key = required(MCP_SERVER_API_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVar(missing));
        }

        Ok(Self {
            gemini_api_key,
            gemini_api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gateway_base_url,
            gateway_api_key,
            host: get("ITINERA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            gateway_timeout: Duration::from_secs(parse_or(
                "GATEWAY_TIMEOUT_SECS",
                get("GATEWAY_TIMEOUT_SECS"),
                DEFAULT_GATEWAY_TIMEOUT_SECS,
            )?),
            generation_timeout: Duration::from_secs(parse_or(
                "GENERATION_TIMEOUT_SECS",
                get("GENERATION_TIMEOUT_SECS"),
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )?),
            stream_timeout: Duration::from_secs(parse_or(
                "STREAM_TIMEOUT_SECS",
                get("STREAM_TIMEOUT_SECS"),
                DEFAULT_STREAM_TIMEOUT_SECS,
            )?),
        })
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Variable naming an env file that takes precedence over [`ENV_FILE_PATHS`].
pub const ENV_FILE_VAR: &str = "ITINERA_ENV_FILE";

/// Result of looking for an env file, reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
    Loaded(PathBuf),
    Unreadable { path: PathBuf, reason: String },
    NotFound,
}

impl EnvFileStatus {
    pub fn log(&self) {
        match self {
            EnvFileStatus::Loaded(path) => info!("Loaded environment from {}", path.display()),
            EnvFileStatus::Unreadable { path, reason } => {
                warn!("Failed to read environment file {}: {}", path.display(), reason)
            }
            EnvFileStatus::NotFound => debug!("No environment file found, using existing environment"),
        }
    }
}

/// Load the first env file found: `$ITINERA_ENV_FILE`, then
/// [`ENV_FILE_PATHS`]. Variables already set are never overridden.
///
/// Mutates the process environment, so call it before starting any threads.
pub fn load_environment() -> EnvFileStatus {
    let custom = std::env::var_os(ENV_FILE_VAR).map(PathBuf::from);
    load_first(custom.into_iter().chain(ENV_FILE_PATHS.iter().map(PathBuf::from)))
}

/// Load the first existing file among `candidates`.
pub fn load_first<I>(candidates: I) -> EnvFileStatus
where
    I: IntoIterator<Item = PathBuf>,
{
    for path in candidates {
        match dotenvy::from_path(&path) {
            Ok(()) => return EnvFileStatus::Loaded(path),
            Err(e) if e.not_found() => continue,
            Err(e) => {
                return EnvFileStatus::Unreadable {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }
    EnvFileStatus::NotFound
}
