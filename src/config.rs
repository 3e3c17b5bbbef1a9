use std::path::PathBuf;

use thiserror::Error;

/// Fallback signing secret for local development. Any real deployment must
/// set `JWT_SECRET`; startup logs a warning when this value is in use.
pub const DEV_JWT_SECRET: &str = "insecure-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Token signing. One process-wide secret, tokens never expire; rotate
    // the secret to invalidate outstanding tokens.
    pub jwt_secret: String,

    // CORS allow-list (comma-separated origins)
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/blog.sqlite")),
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 4000)?,
            jwt_secret: env_or_default("JWT_SECRET", DEV_JWT_SECRET),
            cors_allowed_origins: parse_origin_list(&env_or_default(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000,http://localhost:5173",
            )),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "JWT_SECRET".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.web_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "WEB_HOST".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the signing secret is the development fallback.
    #[must_use]
    pub fn using_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_origin_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin_list() {
        let origins = parse_origin_list("http://a.test, http://b.test ,,http://c.test");
        assert_eq!(origins, vec!["http://a.test", "http://b.test", "http://c.test"]);
        assert!(parse_origin_list("").is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let config = Config {
            database_path: PathBuf::from("./data/blog.sqlite"),
            web_host: "0.0.0.0".to_string(),
            web_port: 4000,
            jwt_secret: String::new(),
            cors_allowed_origins: vec![],
        };
        assert!(config.validate().is_err());
    }
}
