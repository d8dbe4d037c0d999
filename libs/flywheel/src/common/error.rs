use core_config::ConfigError;

/// Error type for every Flywheel operation
#[derive(Debug, thiserror::Error)]
pub enum FlywheelError {
    /// The engine was requested before any application was bound
    #[error(
        "application not registered on flywheel instance and no application bound to current context"
    )]
    NotRegistered,

    /// A Flywheel configuration key holds an unusable value
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `FLYWHEEL_ENGINE_DEFAULT_CONFLICT` is not one of update/overwrite/raise
    #[error("Invalid conflict mode '{0}': expected one of 'update', 'overwrite', 'raise'")]
    InvalidConflictMode(String),

    /// An engine operation ran before `Engine::connect`
    #[error("Engine is not connected to DynamoDB")]
    NotConnected,

    /// The table was never passed to `Engine::register`
    #[error("Table '{0}' is not registered with the engine")]
    UnknownTable(String),

    /// The item lacks one of the table's key attributes
    #[error("Item for table '{table}' is missing key attribute '{attribute}'")]
    MissingKeyAttribute { table: String, attribute: String },

    /// A save in `raise` mode hit an existing item
    #[error("Item already exists in table '{0}'")]
    ItemExists(String),

    /// Request builder rejected its input
    #[error("Invalid DynamoDB request: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),

    /// Service or transport failure reported by the DynamoDB client
    #[error("DynamoDB error: {0}")]
    Dynamo(#[from] aws_sdk_dynamodb::Error),
}

/// Result type alias for Flywheel operations
pub type FlywheelResult<T> = Result<T, FlywheelError>;
