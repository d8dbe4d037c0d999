use core_config::{AppConfig, ConfigError, Environment, FromEnv, env_or_default};
use std::net::Ipv4Addr;
use tracing::info;

/// Environment prefixes copied into the application config
const CONFIG_ENV_PREFIXES: &[&str] = &["FLYWHEEL_", "AWS_"];

/// HTTP listener settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// `HOST` (default 0.0.0.0) and `PORT` (default 8080)
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_or_default("PORT", "8080")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "PORT".to_string(),
                details: format!("{}", e),
            })?;

        Ok(Self { host, port })
    }
}

/// Service configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    /// Handed to the `Application`; Flywheel reads its keys from here
    pub app: AppConfig,
}

impl Config {
    /// Load from `FLYWHEEL_CONFIG` (TOML, profile from `APP_PROFILE`) when
    /// set, then overlay `FLYWHEEL_*` and `AWS_*` environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;

        let mut app = match std::env::var("FLYWHEEL_CONFIG") {
            Ok(path) => {
                let profile = std::env::var("APP_PROFILE").ok();
                info!(%path, ?profile, "Loading configuration file");
                AppConfig::from_toml_file(&path, profile.as_deref())?
            }
            Err(_) => AppConfig::new(),
        };
        // FLYWHEEL_CONFIG itself is not a Flywheel setting
        let mut overrides = AppConfig::from_env_prefixed(CONFIG_ENV_PREFIXES);
        overrides.remove("FLYWHEEL_CONFIG");
        app.merge(overrides);

        Ok(Self {
            environment,
            server,
            app,
        })
    }
}
