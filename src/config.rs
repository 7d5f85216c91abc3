//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Console configuration, loaded from `COWORK_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the client-data service, without a trailing slash.
    pub api_base_url: String,
    /// Bearer token sent with every client-data request.
    pub api_token: Option<SecretString>,
    /// Per-request timeout for the client-data service.
    pub http_timeout: Duration,
    /// libSQL file backing the staged-context store.
    pub context_db_path: PathBuf,
    /// Port for the decision REST routes.
    pub listen_port: u16,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".to_string(),
            api_token: None,
            http_timeout: Duration::from_secs(10),
            context_db_path: PathBuf::from("./data/staged-context.db"),
            listen_port: 8080,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("COWORK_API_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("COWORK_API_BASE_URL".to_string()))?;

        let api_token = lookup("COWORK_API_TOKEN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        let http_timeout = match lookup("COWORK_HTTP_TIMEOUT_SECS") {
            Some(raw) => match parse_number::<u64>("COWORK_HTTP_TIMEOUT_SECS", &raw)? {
                // A zero timeout would fail every request before it is sent.
                0 => {
                    return Err(ConfigError::InvalidValue {
                        key: "COWORK_HTTP_TIMEOUT_SECS".to_string(),
                        message: "must be at least 1 second".to_string(),
                    });
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.http_timeout,
        };

        let context_db_path = lookup("COWORK_CONTEXT_DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.context_db_path);

        let listen_port = match lookup("COWORK_LISTEN_PORT") {
            Some(raw) => parse_number("COWORK_LISTEN_PORT", &raw)?,
            None => defaults.listen_port,
        };

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout,
            context_db_path,
            listen_port,
        })
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}
