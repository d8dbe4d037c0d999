//! Loaders that populate an [`AppConfig`] from the process environment or
//! from a TOML file with named profiles.
//!
//! A TOML config keeps shared settings at the top level and per-deployment
//! overrides under `[profiles.<name>]`:
//!
//! ```toml
//! FLYWHEEL_DATABASE_HOST = "localhost"
//! FLYWHEEL_DATABASE_PORT = 8000
//! FLYWHEEL_SECURE = false
//!
//! [profiles.dev]
//! FLYWHEEL_ENGINE_NAMESPACE = "dev"
//!
//! [profiles.prod]
//! FLYWHEEL_ENGINE_NAMESPACE = ["app", "prod"]
//! ```

use std::path::Path;

use tracing::debug;

use crate::{AppConfig, ConfigError, ConfigValue};

const PROFILES_TABLE: &str = "profiles";

/// Interpret a raw environment value.
///
/// An empty value becomes `Null`; anything else stays a string and is
/// converted by the typed getters on [`AppConfig`].
pub fn parse_env_value(raw: &str) -> ConfigValue {
    if raw.trim().is_empty() {
        ConfigValue::Null
    } else {
        ConfigValue::Str(raw.to_string())
    }
}

impl AppConfig {
    /// Collect every environment variable whose name starts with one of
    /// `prefixes`.
    pub fn from_env_prefixed(prefixes: &[&str]) -> Self {
        let config: AppConfig = std::env::vars()
            .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p)))
            .map(|(key, value)| (key, parse_env_value(&value)))
            .collect();

        debug!(
            keys = config.len(),
            ?prefixes,
            "Loaded configuration from environment"
        );
        config
    }

    /// Parse a TOML document, overlaying `profile` on the base keys
    pub fn from_toml_str(src: &str, profile: Option<&str>) -> Result<Self, ConfigError> {
        let mut table: toml::Table = src.parse()?;
        let profiles = table.remove(PROFILES_TABLE);

        let mut config = AppConfig::new();
        for (key, value) in table {
            let value = convert(&key, value)?;
            config.insert(key, value);
        }

        let Some(name) = profile else {
            return Ok(config);
        };

        let overlay = match profiles {
            Some(toml::Value::Table(mut profiles)) => profiles
                .remove(name)
                .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?,
            Some(other) => {
                return Err(ConfigError::TypeMismatch {
                    key: PROFILES_TABLE.to_string(),
                    expected: "a table",
                    found: toml_kind(&other),
                });
            }
            None => return Err(ConfigError::UnknownProfile(name.to_string())),
        };

        let overlay = match overlay {
            toml::Value::Table(overlay) => overlay,
            other => {
                return Err(ConfigError::TypeMismatch {
                    key: format!("{}.{}", PROFILES_TABLE, name),
                    expected: "a table",
                    found: toml_kind(&other),
                });
            }
        };

        for (key, value) in overlay {
            let value = convert(&key, value)?;
            config.insert(key, value);
        }

        debug!(profile = name, keys = config.len(), "Applied configuration profile");
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>, profile: Option<&str>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src, profile)
    }
}

fn convert(key: &str, value: toml::Value) -> Result<ConfigValue, ConfigError> {
    match value {
        toml::Value::String(s) if s.is_empty() => Ok(ConfigValue::Null),
        toml::Value::String(s) => Ok(ConfigValue::Str(s)),
        toml::Value::Integer(i) => Ok(ConfigValue::Int(i)),
        toml::Value::Boolean(b) => Ok(ConfigValue::Bool(b)),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s),
                other => Err(ConfigError::TypeMismatch {
                    key: key.to_string(),
                    expected: "a list of strings",
                    found: toml_kind(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ConfigValue::List),
        other => Err(ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: "a string, integer, boolean or list of strings",
            found: toml_kind(&other),
        }),
    }
}

fn toml_kind(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "a string",
        toml::Value::Integer(_) => "an integer",
        toml::Value::Float(_) => "a float",
        toml::Value::Boolean(_) => "a boolean",
        toml::Value::Datetime(_) => "a datetime",
        toml::Value::Array(_) => "an array",
        toml::Value::Table(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI_ENV: &str = r#"
FLYWHEEL_DATABASE_HOST = "localhost"
FLYWHEEL_DATABASE_PORT = 8000
FLYWHEEL_SECURE = false

[profiles.dev]
FLYWHEEL_ENGINE_NAMESPACE = "dev"

[profiles.prod]
FLYWHEEL_ENGINE_NAMESPACE = ["app", "prod"]
FLYWHEEL_SECURE = true
"#;

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("8000"), ConfigValue::Str("8000".to_string()));
        assert_eq!(parse_env_value("false"), ConfigValue::Str("false".to_string()));
        assert_eq!(parse_env_value(""), ConfigValue::Null);
        assert_eq!(parse_env_value("  "), ConfigValue::Null);
        assert_eq!(
            parse_env_value("eu-west-1"),
            ConfigValue::Str("eu-west-1".to_string())
        );
    }

    #[test]
    fn test_from_env_prefixed() {
        temp_env::with_vars(
            [
                ("FLYWHEEL_LOADER_REGION", Some("eu-west-1")),
                ("FLYWHEEL_LOADER_SECURE", Some("false")),
                ("UNRELATED_LOADER_KEY", Some("ignored")),
            ],
            || {
                let config = AppConfig::from_env_prefixed(&["FLYWHEEL_LOADER_"]);
                assert_eq!(config.get_str("FLYWHEEL_LOADER_REGION").unwrap(), "eu-west-1");
                assert!(!config.get_bool("FLYWHEEL_LOADER_SECURE").unwrap());
                assert!(!config.contains_key("UNRELATED_LOADER_KEY"));
            },
        );
    }

    #[test]
    fn test_from_env_keeps_numeric_strings() {
        temp_env::with_vars(
            [
                ("FLYWHEEL_NUMERIC_SECRET", Some("12345678")),
                ("FLYWHEEL_NUMERIC_NAMESPACE", Some("2024")),
                ("FLYWHEEL_NUMERIC_PORT", Some("8000")),
            ],
            || {
                let config = AppConfig::from_env_prefixed(&["FLYWHEEL_NUMERIC_"]);
                assert_eq!(config.get_str("FLYWHEEL_NUMERIC_SECRET").unwrap(), "12345678");
                assert_eq!(
                    config.get_str_list("FLYWHEEL_NUMERIC_NAMESPACE").unwrap(),
                    vec!["2024"]
                );
                assert_eq!(config.get_opt_u16("FLYWHEEL_NUMERIC_PORT").unwrap(), Some(8000));
            },
        );
    }

    #[test]
    fn test_toml_empty_string_is_null() {
        let config = AppConfig::from_toml_str(
            "FLYWHEEL_DATABASE_HOST = \"localhost\"\n[profiles.prod]\nFLYWHEEL_DATABASE_HOST = \"\"\n",
            Some("prod"),
        )
        .unwrap();
        assert_eq!(config.get("FLYWHEEL_DATABASE_HOST"), Some(&ConfigValue::Null));
    }

    #[test]
    fn test_toml_base_only() {
        let config = AppConfig::from_toml_str(MULTI_ENV, None).unwrap();
        assert_eq!(config.get_str("FLYWHEEL_DATABASE_HOST").unwrap(), "localhost");
        assert_eq!(config.get_opt_u16("FLYWHEEL_DATABASE_PORT").unwrap(), Some(8000));
        assert!(!config.contains_key("FLYWHEEL_ENGINE_NAMESPACE"));
        assert!(!config.contains_key("profiles"));
    }

    #[test]
    fn test_toml_profile_overlay() {
        let dev = AppConfig::from_toml_str(MULTI_ENV, Some("dev")).unwrap();
        assert_eq!(dev.get_str("FLYWHEEL_ENGINE_NAMESPACE").unwrap(), "dev");
        assert!(!dev.get_bool("FLYWHEEL_SECURE").unwrap());

        let prod = AppConfig::from_toml_str(MULTI_ENV, Some("prod")).unwrap();
        assert_eq!(
            prod.get_str_list("FLYWHEEL_ENGINE_NAMESPACE").unwrap(),
            vec!["app", "prod"]
        );
        assert!(prod.get_bool("FLYWHEEL_SECURE").unwrap());
    }

    #[test]
    fn test_toml_unknown_profile() {
        let err = AppConfig::from_toml_str(MULTI_ENV, Some("staging")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(name) if name == "staging"));
    }

    #[test]
    fn test_toml_rejects_floats() {
        let err = AppConfig::from_toml_str("FLYWHEEL_DATABASE_PORT = 80.5", None).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { found: "a float", .. }));
    }

    #[test]
    fn test_toml_rejects_mixed_arrays() {
        let err =
            AppConfig::from_toml_str("FLYWHEEL_ENGINE_NAMESPACE = [\"a\", 1]", None).unwrap_err();
        assert!(err.to_string().contains("FLYWHEEL_ENGINE_NAMESPACE"));
    }

    #[test]
    fn test_toml_invalid_syntax() {
        let err = AppConfig::from_toml_str("FLYWHEEL_REGION = ", None).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_toml_file_missing() {
        let err = AppConfig::from_toml_file("/nonexistent/flywheel.toml", None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
