//! Flywheel: DynamoDB engine integration for host applications
//!
//! The [`Flywheel`] extension binds to an [`Application`], fills in its
//! DynamoDB settings and hands out a lazily built, cached [`Engine`].
//!
//! # Configuration
//!
//! | key                                | default       |
//! |------------------------------------|---------------|
//! | `FLYWHEEL_DATABASE_HOST`           | none          |
//! | `FLYWHEEL_DATABASE_PORT`           | none          |
//! | `FLYWHEEL_REGION`                  | `"us-east-1"` |
//! | `FLYWHEEL_SECURE`                  | `true`        |
//! | `FLYWHEEL_ENGINE_NAMESPACE`        | empty         |
//! | `FLYWHEEL_ENGINE_DEFAULT_CONFLICT` | `"update"`    |
//! | `AWS_ACCESS_KEY`                   | none          |
//! | `AWS_SECRET_ACCESS_KEY`            | none          |
//!
//! # Example
//!
//! ```ignore
//! use flywheel::{Application, Flywheel, TableSpec};
//!
//! let app = Application::new("todos");
//! app.config_mut().insert("FLYWHEEL_DATABASE_HOST", "localhost");
//! app.config_mut().insert("FLYWHEEL_DATABASE_PORT", 8000_i64);
//! app.config_mut().insert("FLYWHEEL_SECURE", false);
//!
//! let db = Flywheel::with_app(&app);
//!
//! let engine = db.engine().await?;
//! engine.register(TableSpec::new("todos", "id"));
//! engine.create_schema().await?;
//! ```

pub mod app;
pub mod common;
pub mod config;
pub mod connection;
pub mod engine;
pub mod extension;
pub mod health;

pub use app::Application;
pub use common::{FlywheelError, FlywheelResult};
pub use config::{ConflictMode, FlywheelConfig, Namespace};
pub use connection::{ConnectOptions, DynamoConnection};
pub use engine::{Engine, Item, KeyAttribute, KeyKind, TableSpec};
pub use extension::{EXTENSION_KEY, Flywheel};

// Re-export DynamoDB types for convenience
pub use aws_sdk_dynamodb::types::AttributeValue;
