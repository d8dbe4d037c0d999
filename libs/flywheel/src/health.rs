use std::time::Instant;

use crate::connection::DynamoConnection;

/// Health check status for DynamoDB
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the database is reachable with the configured credentials
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Check DynamoDB health with a one-table `ListTables` call
///
/// # Example
/// ```ignore
/// use flywheel::health::check_health;
///
/// let engine = flywheel.engine().await?;
/// let healthy = check_health(engine.dynamo()?).await;
/// ```
pub async fn check_health(conn: &DynamoConnection) -> bool {
    check_health_detailed(conn).await.healthy
}

/// Check DynamoDB health with timing and error details
pub async fn check_health_detailed(conn: &DynamoConnection) -> HealthStatus {
    let start = Instant::now();
    let result = conn.client().list_tables().limit(1).send().await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(aws_sdk_dynamodb::Error::from(e).to_string()),
            response_time_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectOptions;

    #[tokio::test]
    #[ignore] // Requires DynamoDB Local on localhost:8000
    async fn test_check_health_detailed() {
        let options = ConnectOptions {
            access_key: Some("local".to_string()),
            secret_key: Some("local".to_string()),
            host: Some("localhost".to_string()),
            port: Some(8000),
            is_secure: false,
        };
        let conn = DynamoConnection::connect("us-east-1", options).await.unwrap();
        let status = check_health_detailed(&conn).await;
        assert!(status.healthy);
        assert!(status.message.is_none());
    }
}
