use std::collections::BTreeMap;
use std::fmt;

use crate::ConfigError;

/// A single configuration value.
///
/// Mirrors the primitive values a host application keeps in its config:
/// `Null` marks a key that is known but deliberately unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ConfigValue {
    /// Human readable name of the variant, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "a boolean",
            ConfigValue::Int(_) => "an integer",
            ConfigValue::Str(_) => "a string",
            ConfigValue::List(_) => "a list of strings",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Str(s) => write!(f, "{}", s),
            ConfigValue::List(parts) => write!(f, "[{}]", parts.join(", ")),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::List(value)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ConfigValue::Null, Into::into)
    }
}

/// Application configuration container.
///
/// Keys are kept in sorted order so dumps and logs are stable.
///
/// # Example
///
/// ```
/// use core_config::{AppConfig, ConfigValue};
///
/// let mut config = AppConfig::new();
/// config.insert("FLYWHEEL_SECURE", false);
///
/// // set_default never overwrites a key that is already present
/// config.set_default("FLYWHEEL_SECURE", true);
/// assert_eq!(config.get("FLYWHEEL_SECURE"), Some(&ConfigValue::Bool(false)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert a value, returning the previous one if any
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Insert `value` only if `key` is absent and return the stored value
    pub fn set_default(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> &ConfigValue {
        self.values.entry(key.into()).or_insert_with(|| value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.remove(key)
    }

    /// Copy every entry of `other` into `self`, overwriting on conflict
    pub fn merge(&mut self, other: AppConfig) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String value; missing, null and empty keys read as `None`.
    /// Integers and booleans read as their text.
    pub fn get_opt_str(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.get(key) {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(ConfigValue::Str(s)) if s.is_empty() => Ok(None),
            Some(ConfigValue::Str(s)) => Ok(Some(s.clone())),
            Some(ConfigValue::Int(i)) => Ok(Some(i.to_string())),
            Some(ConfigValue::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(mismatch(key, "a string", other)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ConfigError> {
        self.get_opt_str(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Boolean value. `true`/`false` strings in any case are accepted.
    pub fn get_opt_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(ConfigValue::Bool(b)) => Ok(Some(*b)),
            Some(ConfigValue::Str(s)) => match s.trim() {
                "" => Ok(None),
                t if t.eq_ignore_ascii_case("true") => Ok(Some(true)),
                t if t.eq_ignore_ascii_case("false") => Ok(Some(false)),
                _ => Err(ConfigError::ParseError {
                    key: key.to_string(),
                    details: format!("'{}' is not a boolean", s),
                }),
            },
            Some(other) => Err(mismatch(key, "a boolean", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get_opt_bool(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Port-sized integer. Numeric strings are accepted.
    pub fn get_opt_u16(&self, key: &str) -> Result<Option<u16>, ConfigError> {
        match self.get(key) {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(ConfigValue::Int(i)) => u16::try_from(*i)
                .map(Some)
                .map_err(|e| ConfigError::ParseError {
                    key: key.to_string(),
                    details: format!("{} is out of range: {}", i, e),
                }),
            Some(ConfigValue::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(ConfigValue::Str(s)) => {
                s.trim()
                    .parse()
                    .map(Some)
                    .map_err(|e| ConfigError::ParseError {
                        key: key.to_string(),
                        details: format!("{}", e),
                    })
            }
            Some(other) => Err(mismatch(key, "an integer", other)),
        }
    }

    /// List of strings. A plain string reads as a one-element list, and
    /// missing, null or empty values read as an empty list.
    pub fn get_str_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.get(key) {
            None | Some(ConfigValue::Null) => Ok(Vec::new()),
            Some(ConfigValue::Str(s)) if s.is_empty() => Ok(Vec::new()),
            Some(ConfigValue::Str(s)) => Ok(vec![s.clone()]),
            Some(ConfigValue::List(parts)) => Ok(parts.clone()),
            Some(ConfigValue::Int(i)) => Ok(vec![i.to_string()]),
            Some(other) => Err(mismatch(key, "a string or list of strings", other)),
        }
    }
}

impl FromIterator<(String, ConfigValue)> for AppConfig {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn mismatch(key: &str, expected: &'static str, found: &ConfigValue) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
