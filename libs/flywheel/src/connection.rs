use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Credentials;
use tracing::{info, instrument, warn};

use crate::common::FlywheelResult;
use crate::config::{FlywheelConfig, endpoint_url};

/// Provider name attached to statically configured credentials
const STATIC_CREDENTIALS_PROVIDER: &str = "flywheel-config";

/// Options for [`DynamoConnection::connect`] besides the region
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub is_secure: bool,
}

impl ConnectOptions {
    pub fn from_config(config: &FlywheelConfig) -> Self {
        Self {
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            host: config.host.clone(),
            port: config.port,
            is_secure: config.secure,
        }
    }
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("is_secure", &self.is_secure)
            .finish()
    }
}

/// DynamoDB client bound to a region and, optionally, a fixed endpoint
#[derive(Clone, Debug)]
pub struct DynamoConnection {
    client: Client,
    region: String,
    endpoint: Option<String>,
}

impl DynamoConnection {
    /// Build a DynamoDB client for `region`.
    ///
    /// Static credentials are used when both keys are set; otherwise the SDK
    /// default chain (environment, profile, web identity, instance metadata)
    /// resolves them on first request. Setting a host overrides the regional
    /// endpoint, which is how DynamoDB Local is reached.
    ///
    /// No request is sent here.
    ///
    /// # Example
    /// ```ignore
    /// use flywheel::connection::{ConnectOptions, DynamoConnection};
    ///
    /// let options = ConnectOptions {
    ///     host: Some("localhost".into()),
    ///     port: Some(8000),
    ///     ..Default::default()
    /// };
    /// let conn = DynamoConnection::connect("us-east-1", options).await?;
    /// ```
    #[instrument(skip(options), fields(host = ?options.host, port = ?options.port))]
    pub async fn connect(region: &str, options: ConnectOptions) -> FlywheelResult<Self> {
        if options.host.is_none() && options.port.is_some() {
            warn!("Database port is set without a host; using the regional endpoint");
        }
        let endpoint = endpoint_url(options.host.as_deref(), options.port, options.is_secure);

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        match (options.access_key, options.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    STATIC_CREDENTIALS_PROVIDER,
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of the AWS access/secret keys is set; using the default credential chain");
            }
            (None, None) => {}
        }

        if let Some(url) = &endpoint {
            loader = loader.endpoint_url(url);
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        info!(
            region,
            endpoint = endpoint.as_deref().unwrap_or("regional"),
            "DynamoDB client configured"
        );

        Ok(Self {
            client,
            region: region.to_string(),
            endpoint,
        })
    }

    pub async fn connect_from_config(config: &FlywheelConfig) -> FlywheelResult<Self> {
        Self::connect(&config.region, ConnectOptions::from_config(config)).await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Endpoint override, `None` for the regional endpoint
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_options() -> ConnectOptions {
        ConnectOptions {
            access_key: Some("local".to_string()),
            secret_key: Some("local".to_string()),
            host: Some("localhost".to_string()),
            port: Some(8000),
            is_secure: false,
        }
    }

    #[tokio::test]
    async fn test_connect_local_endpoint() {
        let conn = DynamoConnection::connect("us-west-2", local_options())
            .await
            .unwrap();
        assert_eq!(conn.region(), "us-west-2");
        assert_eq!(conn.endpoint(), Some("http://localhost:8000"));
    }

    #[tokio::test]
    async fn test_connect_ignores_port_without_host() {
        let options = ConnectOptions {
            host: None,
            ..local_options()
        };
        let conn = DynamoConnection::connect("us-east-1", options).await.unwrap();
        assert_eq!(conn.endpoint(), None);
    }

    #[test]
    fn test_options_from_config() {
        let config = FlywheelConfig::new("eu-west-1")
            .with_endpoint("localhost", Some(8000))
            .with_secure(false)
            .with_credentials("ak", "sk");
        let options = ConnectOptions::from_config(&config);
        assert_eq!(options, local_like("ak", "sk"));
    }

    #[test]
    fn test_options_debug_redacts_secret() {
        let debug = format!("{:?}", local_like("ak", "very-secret"));
        assert!(!debug.contains("very-secret"));
    }

    fn local_like(access_key: &str, secret_key: &str) -> ConnectOptions {
        ConnectOptions {
            access_key: Some(access_key.to_string()),
            secret_key: Some(secret_key.to_string()),
            ..local_options()
        }
    }

    #[tokio::test]
    #[ignore] // Requires DynamoDB Local on localhost:8000
    async fn test_connect_and_list_tables() {
        let conn = DynamoConnection::connect("us-east-1", local_options())
            .await
            .unwrap();
        let result = conn.client().list_tables().limit(1).send().await;
        assert!(result.is_ok());
    }
}
