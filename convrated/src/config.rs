//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use convrate_telemetry::{LogFormat, TelemetryConfig};
use std::env;

/// Default API port
const DEFAULT_API_PORT: u16 = 5001;

/// Default sink queue capacity
const DEFAULT_TELEMETRY_BUFFER: usize = 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Telemetry configuration
    pub telemetry: TelemetryConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Allow cross-origin requests from any origin
    pub cors_permissive: bool,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::load(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn load<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::load_environment(&lookup)?;
        let api = Self::load_api_config(&lookup)?;
        let telemetry = Self::load_telemetry_config(&lookup, environment)?;

        Ok(Self {
            api,
            telemetry,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_permissive: true,
            },
            telemetry: TelemetryConfig {
                environment: Environment::Test.to_string(),
                buffer: 64,
                ..TelemetryConfig::default()
            },
            environment: Environment::Test,
        }
    }

    fn load_environment<F>(lookup: &F) -> DaemonResult<Environment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("CONVRATE_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid CONVRATE_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config<F>(lookup: &F) -> DaemonResult<ApiConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("CONVRATE_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("CONVRATE_API_PORT").or_else(|| lookup("PORT")) {
            Some(port_str) => port_str.parse::<u16>().map_err(|_| {
                DaemonError::Config(format!("Invalid CONVRATE_API_PORT: {}", port_str))
            })?,
            None => DEFAULT_API_PORT,
        };

        let cors_permissive = Self::load_bool(lookup, "CONVRATE_CORS_PERMISSIVE", true)?;

        Ok(ApiConfig {
            host,
            port,
            cors_permissive,
        })
    }

    fn load_telemetry_config<F>(
        lookup: &F,
        environment: Environment,
    ) -> DaemonResult<TelemetryConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = match lookup("CONVRATE_TELEMETRY") {
            None => true,
            Some(val) => match val.to_lowercase().as_str() {
                "log" | "on" => true,
                "off" | "none" => false,
                other => {
                    return Err(DaemonError::Config(format!(
                        "Invalid CONVRATE_TELEMETRY: {}. Expected: log, off",
                        other
                    )))
                }
            },
        };

        let log_format = match lookup("CONVRATE_LOG_FORMAT") {
            Some(val) => val
                .parse::<LogFormat>()
                .map_err(|e| DaemonError::Config(e.to_string()))?,
            None => LogFormat::Pretty,
        };

        let buffer = match lookup("CONVRATE_TELEMETRY_BUFFER") {
            Some(val) => val.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                DaemonError::Config(format!("Invalid CONVRATE_TELEMETRY_BUFFER: {}", val))
            })?,
            None => DEFAULT_TELEMETRY_BUFFER,
        };

        Ok(TelemetryConfig {
            enabled,
            environment: environment.to_string(),
            log_format,
            buffer,
            default_directive: "convrated=info".to_string(),
        })
    }

    fn load_bool<F>(lookup: &F, key: &str, default: bool) -> DaemonResult<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(val) => match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            },
            None => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_API_PORT,
                cors_permissive: true,
            },
            telemetry: TelemetryConfig::default(),
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
