//! Flywheel configuration keys, defaults and their typed view.

use std::fmt;
use std::str::FromStr;

use core_config::{AppConfig, ConfigValue};

use crate::common::{FlywheelError, FlywheelResult};

/// DynamoDB host. Set (e.g. `"localhost"`) to use a local instance.
pub const DATABASE_HOST: &str = "FLYWHEEL_DATABASE_HOST";
/// DynamoDB port, used together with the host.
pub const DATABASE_PORT: &str = "FLYWHEEL_DATABASE_PORT";
/// AWS region. Still used for request signing against a local instance.
pub const REGION: &str = "FLYWHEEL_REGION";
/// Whether the connection uses HTTPS.
pub const SECURE: &str = "FLYWHEEL_SECURE";
/// Table name prefix: a string or list of parts joined by `-`.
pub const ENGINE_NAMESPACE: &str = "FLYWHEEL_ENGINE_NAMESPACE";
/// Default conflict mode for saves: `update`, `overwrite` or `raise`.
pub const ENGINE_DEFAULT_CONFLICT: &str = "FLYWHEEL_ENGINE_DEFAULT_CONFLICT";
pub const ACCESS_KEY: &str = "AWS_ACCESS_KEY";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Fill every missing Flywheel key with its default.
///
/// Keys that are already present, including explicit nulls, are left alone.
pub fn apply_defaults(config: &mut AppConfig) {
    config.set_default(DATABASE_HOST, ConfigValue::Null);
    config.set_default(DATABASE_PORT, ConfigValue::Null);
    config.set_default(REGION, DEFAULT_REGION);
    config.set_default(SECURE, true);
    config.set_default(ENGINE_NAMESPACE, ConfigValue::List(Vec::new()));
    config.set_default(ENGINE_DEFAULT_CONFLICT, ConflictMode::default().as_str());
    config.set_default(ACCESS_KEY, ConfigValue::Null);
    config.set_default(SECRET_ACCESS_KEY, ConfigValue::Null);
}

/// How a save treats an item that already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConflictMode {
    /// Update the stored item's attributes in place
    #[default]
    Update,
    /// Replace the stored item
    Overwrite,
    /// Fail with `FlywheelError::ItemExists`
    Raise,
}

impl ConflictMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictMode::Update => "update",
            ConflictMode::Overwrite => "overwrite",
            ConflictMode::Raise => "raise",
        }
    }
}

impl FromStr for ConflictMode {
    type Err = FlywheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(ConflictMode::Update),
            "overwrite" => Ok(ConflictMode::Overwrite),
            "raise" => Ok(ConflictMode::Raise),
            other => Err(FlywheelError::InvalidConflictMode(other.to_string())),
        }
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered prefix parts applied to every table name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace(Vec<String>);

impl Namespace {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `parts-...-name`, or just `name` for an empty namespace
    pub fn qualify(&self, name: &str) -> String {
        if self.0.is_empty() {
            return name.to_string();
        }
        let mut qualified = self.0.join("-");
        qualified.push('-');
        qualified.push_str(name);
        qualified
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::default()
        } else {
            Self(vec![value.to_string()])
        }
    }
}

/// Typed view of the Flywheel keys in an [`AppConfig`]
#[derive(Clone, PartialEq, Eq)]
pub struct FlywheelConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub region: String,
    pub secure: bool,
    pub namespace: Namespace,
    pub default_conflict: ConflictMode,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl FlywheelConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Read the Flywheel keys. Absent keys fall back to their defaults.
    pub fn from_app_config(config: &AppConfig) -> FlywheelResult<Self> {
        let region = config
            .get_opt_str(REGION)?
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let secure = config.get_opt_bool(SECURE)?.unwrap_or(true);

        let default_conflict = match config.get_opt_str(ENGINE_DEFAULT_CONFLICT)? {
            Some(mode) => mode.parse()?,
            None => ConflictMode::default(),
        };

        Ok(Self {
            host: config.get_opt_str(DATABASE_HOST)?,
            port: config.get_opt_u16(DATABASE_PORT)?,
            region,
            secure,
            namespace: Namespace(config.get_str_list(ENGINE_NAMESPACE)?),
            default_conflict,
            access_key: config.get_opt_str(ACCESS_KEY)?,
            secret_key: config.get_opt_str(SECRET_ACCESS_KEY)?,
        })
    }

    /// Point at a specific DynamoDB endpoint, e.g. DynamoDB Local
    pub fn with_endpoint(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_default_conflict(mut self, mode: ConflictMode) -> Self {
        self.default_conflict = mode;
        self
    }

    /// Explicit endpoint URL, `None` when the regional endpoint applies
    pub fn endpoint_url(&self) -> Option<String> {
        endpoint_url(self.host.as_deref(), self.port, self.secure)
    }

    /// Write these settings back as config keys
    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::new();
        config.insert(DATABASE_HOST, self.host.clone());
        config.insert(DATABASE_PORT, self.port);
        config.insert(REGION, self.region.clone());
        config.insert(SECURE, self.secure);
        config.insert(ENGINE_NAMESPACE, self.namespace.parts().to_vec());
        config.insert(ENGINE_DEFAULT_CONFLICT, self.default_conflict.as_str());
        config.insert(ACCESS_KEY, self.access_key.clone());
        config.insert(SECRET_ACCESS_KEY, self.secret_key.clone());
        config
    }
}

pub(crate) fn endpoint_url(host: Option<&str>, port: Option<u16>, secure: bool) -> Option<String> {
    let host = host?;
    let scheme = if secure { "https" } else { "http" };
    Some(match port {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    })
}

impl Default for FlywheelConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            region: DEFAULT_REGION.to_string(),
            secure: true,
            namespace: Namespace::default(),
            default_conflict: ConflictMode::default(),
            access_key: None,
            secret_key: None,
        }
    }
}

impl fmt::Debug for FlywheelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlywheelConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("region", &self.region)
            .field("secure", &self.secure)
            .field("namespace", &self.namespace)
            .field("default_conflict", &self.default_conflict)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
