//! End-to-end binding scenarios through the public API.
//!
//! None of these talk to DynamoDB: building the engine only configures the
//! client.

use std::sync::Arc;

use core_config::{AppConfig, ConfigValue};
use flywheel::{Application, EXTENSION_KEY, Flywheel, FlywheelError, TableSpec};

fn local_config() -> AppConfig {
    let mut config = AppConfig::new();
    config.insert("FLYWHEEL_DATABASE_HOST", "localhost");
    config.insert("FLYWHEEL_DATABASE_PORT", 8000_i64);
    config.insert("FLYWHEEL_SECURE", false);
    config.insert("AWS_ACCESS_KEY", "local");
    config.insert("AWS_SECRET_ACCESS_KEY", "local");
    config
}

#[test]
fn empty_config_gets_defaults_on_bind() {
    let app = Application::new("scenario");
    let db = Flywheel::new();
    db.init_app(&app);

    let config = app.config();
    assert_eq!(config.get_str("FLYWHEEL_REGION").unwrap(), "us-east-1");
    assert_eq!(config.get("AWS_ACCESS_KEY"), Some(&ConfigValue::Null));
    assert!(config.get_bool("FLYWHEEL_SECURE").unwrap());
}

#[test]
fn explicit_insecure_flag_survives_bind() {
    let mut config = AppConfig::new();
    config.insert("FLYWHEEL_SECURE", false);
    let app = Application::with_config("scenario", config);

    let db = Flywheel::with_app(&app);
    db.init_app(&app);

    assert!(!app.config().get_bool("FLYWHEEL_SECURE").unwrap());
}

#[test]
fn registry_holds_the_same_instance() {
    let app = Application::with_config("scenario", local_config());
    let db = Flywheel::with_app(&app);

    let registered = app.extension::<Flywheel>(EXTENSION_KEY).unwrap();
    assert!(Arc::ptr_eq(&registered, &db));
    assert!(Arc::ptr_eq(&db.app().unwrap(), &app));
}

#[tokio::test]
async fn unbound_then_bound() {
    let db = Flywheel::new();
    assert!(matches!(db.engine().await, Err(FlywheelError::NotRegistered)));

    let app = Application::with_config("scenario", local_config());
    db.init_app(&app);

    let engine = db.engine().await.unwrap();
    assert_eq!(engine.dynamo().unwrap().region(), "us-east-1");
    assert!(std::ptr::eq(engine, db.engine().await.unwrap()));
}

#[tokio::test]
async fn concurrent_first_access_builds_one_engine() {
    let app = Application::with_config("scenario", local_config());
    let db = Flywheel::with_app(&app);

    let (a, b) = tokio::join!(db.engine(), db.engine());
    assert!(std::ptr::eq(a.unwrap(), b.unwrap()));
}

#[tokio::test]
async fn engine_registry_is_shared_through_the_extension() {
    let mut config = local_config();
    config.insert("FLYWHEEL_ENGINE_NAMESPACE", vec!["app".to_string(), "test".to_string()]);
    let app = Application::with_config("scenario", config);
    Flywheel::with_app(&app);

    // Handlers reach the engine through the application only
    let db = Flywheel::from_app(&app).unwrap();
    db.engine().await.unwrap().register(TableSpec::new("todos", "id"));

    let engine = Flywheel::from_app(&app).unwrap();
    let engine = engine.engine().await.unwrap();
    assert_eq!(engine.registered_tables(), vec!["todos"]);
    assert_eq!(engine.table_name("todos"), "app-test-todos");
}
