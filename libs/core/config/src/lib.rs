//! Environment-driven configuration shared by notification host processes.
//!
//! Configuration is read once at startup through [`FromEnv`] and then passed
//! around by value; nothing in here keeps global mutable state.

pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },
}

/// Deployment environment. Only affects log formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read `key`, falling back to `default` when unset.
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read `key` or fail with [`ConfigError::MissingEnvVar`].
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read an optional variable. Empty strings count as unset.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env_optional(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a boolean", other),
        }),
    }
}

/// Read and parse `key`, using `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("CFG_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("CFG_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("CFG_TEST_VAR", || {
            assert_eq!(env_or_default("CFG_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("CFG_MISSING_REQUIRED", || {
            let err = env_required("CFG_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("CFG_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("CFG_BLANK", Some("   "), || {
            assert_eq!(env_optional("CFG_BLANK"), None);
        });
    }

    #[test]
    fn test_env_flag_variants() {
        for (raw, expected) in [("true", true), ("1", true), ("On", true), ("no", false), ("0", false)] {
            temp_env::with_var("CFG_FLAG", Some(raw), || {
                assert_eq!(env_flag("CFG_FLAG", !expected).unwrap(), expected, "raw = {raw}");
            });
        }
    }

    #[test]
    fn test_env_flag_default_and_invalid() {
        temp_env::with_var_unset("CFG_FLAG_UNSET", || {
            assert!(env_flag("CFG_FLAG_UNSET", true).unwrap());
        });
        temp_env::with_var("CFG_FLAG_BAD", Some("maybe"), || {
            let err = env_flag("CFG_FLAG_BAD", false).unwrap_err();
            assert!(err.to_string().contains("CFG_FLAG_BAD"));
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var("CFG_PORT", Some("2525"), || {
            assert_eq!(env_parse::<u16>("CFG_PORT", 25).unwrap(), 2525);
        });
        temp_env::with_var_unset("CFG_PORT", || {
            assert_eq!(env_parse::<u16>("CFG_PORT", 25).unwrap(), 25);
        });
        temp_env::with_var("CFG_PORT", Some("99999"), || {
            assert!(env_parse::<u16>("CFG_PORT", 25).is_err());
        });
    }
}
