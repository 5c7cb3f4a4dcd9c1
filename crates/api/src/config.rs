//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - payment processor secret key
//! - `EMAIL_USER` - SMTP username, also the sender address
//! - `EMAIL_PASSWORD` - SMTP password
//!
//! ## Optional
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 3000)
//! - `RUST_LOG` - tracing filter directive (default: info)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `DATABASE_URL` - Postgres connection string; in-memory store when unset
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 5)
//! - `STRIPE_API_BASE` - processor base URL (default: https://api.stripe.com)
//! - `EMAIL_HOST` - SMTP host (default: smtp.gmail.com)
//! - `EMAIL_PORT` - SMTP port (default: 587)
//! - `EMAIL_SECURE` - `true` for implicit TLS (default: false)
//! - `OPERATOR_EMAIL` - recipient of new-order notices

use checkout::services::email::DEFAULT_OPERATOR_EMAIL;
use checkout::services::stripe::DEFAULT_API_BASE;
use checkout::{EmailSettings, StripeSettings};
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Database settings. Implements `Debug` manually to redact the URL.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    /// `None` runs against the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub stripe: StripeSettings,
    pub email: EmailSettings,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let port = env.parsed("PORT", 3000u16)?;
        let log_format = match env.or_default("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected text or json, got {other}"),
                ));
            }
        };

        let database = match env.optional("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url: SecretString::from(url),
                max_connections: env.parsed("DATABASE_MAX_CONNECTIONS", 5u32)?,
            }),
            None => None,
        };

        let stripe = StripeSettings {
            secret_key: SecretString::from(env.required("STRIPE_SECRET_KEY")?),
            api_base: env.or_default("STRIPE_API_BASE", DEFAULT_API_BASE),
        };

        let email = EmailSettings {
            host: env.or_default("EMAIL_HOST", "smtp.gmail.com"),
            port: env.parsed("EMAIL_PORT", 587u16)?,
            secure: env.parsed("EMAIL_SECURE", false)?,
            username: env.required("EMAIL_USER")?,
            password: SecretString::from(env.required("EMAIL_PASSWORD")?),
            operator_email: env.or_default("OPERATOR_EMAIL", DEFAULT_OPERATOR_EMAIL),
        };

        Ok(Self {
            host: env.or_default("HOST", "0.0.0.0"),
            port,
            log_level: env.or_default("RUST_LOG", "info"),
            log_format,
            database,
            stripe,
            email,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => Ok(default),
        }
    }
}
