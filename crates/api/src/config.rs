//! Application configuration loaded from environment variables.

use thiserror::Error;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("{0} is required")]
    Missing(&'static str),
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Which payment gateway captures checkout payments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaymentProvider {
    /// Always succeeds; for local runs and tests.
    #[default]
    Memory,
    Stripe { secret_key: String, api_base: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json`
/// - `DATABASE_URL`: Postgres connection string; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default `10`)
/// - `PAYMENT_PROVIDER`: `memory` or `stripe`, with `STRIPE_SECRET_KEY` and `STRIPE_API_BASE`
/// - `CURRENCY`: ISO currency code sent to the gateway (default `usd`)
/// - `SEED_DEMO_DATA`: load the demo catalog at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub payment_provider: PaymentProvider,
    pub currency: String,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => parse(&raw, "PORT")?,
            None => defaults.port,
        };
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse(&raw, "DATABASE_MAX_CONNECTIONS")?,
            None => defaults.database_max_connections,
        };
        let log_format = match var("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Text,
            Some(f) if f == "text" => LogFormat::Text,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other,
                });
            }
        };
        let payment_provider = match var("PAYMENT_PROVIDER").as_deref().map(str::to_ascii_lowercase)
        {
            None => PaymentProvider::Memory,
            Some(p) if p == "memory" => PaymentProvider::Memory,
            Some(p) if p == "stripe" => PaymentProvider::Stripe {
                secret_key: var("STRIPE_SECRET_KEY")
                    .ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?,
                api_base: var("STRIPE_API_BASE")
                    .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "PAYMENT_PROVIDER",
                    value: other,
                });
            }
        };
        let seed_demo_data = match var("SEED_DEMO_DATA").as_deref().map(str::to_ascii_lowercase) {
            None => false,
            Some(v) => matches!(v.as_str(), "1" | "true" | "yes"),
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            payment_provider,
            currency: var("CURRENCY")
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or(defaults.currency),
            seed_demo_data,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(raw: &str, name: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            payment_provider: PaymentProvider::Memory,
            currency: "usd".to_string(),
            seed_demo_data: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.currency, "usd");
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("CURRENCY", "EUR"),
            ("SEED_DEMO_DATA", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.currency, "eur");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_stripe_requires_secret_key() {
        assert_eq!(
            load(&[("PAYMENT_PROVIDER", "stripe")]),
            Err(ConfigError::Missing("STRIPE_SECRET_KEY"))
        );

        let config = load(&[
            ("PAYMENT_PROVIDER", "stripe"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
        ])
        .unwrap();
        assert_eq!(
            config.payment_provider,
            PaymentProvider::Stripe {
                secret_key: "sk_test_123".to_string(),
                api_base: "https://api.stripe.com".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("PAYMENT_PROVIDER", "paypal")]),
            Err(ConfigError::Invalid {
                name: "PAYMENT_PROVIDER",
                ..
            })
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                ..
            })
        ));
    }
}
