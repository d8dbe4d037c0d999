//! Binds a Flywheel engine to an [`Application`]'s configuration.
//!
//! Two ways to wire it up, both ending in the same state:
//!
//! ```ignore
//! use flywheel::{Application, Flywheel};
//!
//! // Bound at construction
//! let app = Application::new("todos");
//! let db = Flywheel::with_app(&app);
//!
//! // Or created first and bound from an app factory
//! let db = Flywheel::new();
//! fn create_app(db: &std::sync::Arc<Flywheel>) -> std::sync::Arc<Application> {
//!     let app = Application::new("todos");
//!     db.init_app(&app);
//!     app
//! }
//! ```
//!
//! Binding only touches configuration. The engine, and with it the
//! DynamoDB client, is built on the first [`Flywheel::engine`] call and
//! reused afterwards.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::app::Application;
use crate::common::{FlywheelError, FlywheelResult};
use crate::config::{FlywheelConfig, apply_defaults};
use crate::connection::ConnectOptions;
use crate::engine::Engine;

/// Key under which the extension registers itself on the application
pub const EXTENSION_KEY: &str = "flywheel";

/// Flywheel integration for an [`Application`]
#[derive(Debug, Default)]
pub struct Flywheel {
    app: RwLock<Weak<Application>>,
    engine: OnceCell<Engine>,
}

impl Flywheel {
    /// Unbound extension; call [`Flywheel::init_app`] before using the engine
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Extension bound to `app`
    pub fn with_app(app: &Arc<Application>) -> Arc<Self> {
        let flywheel = Self::new();
        flywheel.init_app(app);
        flywheel
    }

    /// Look up the extension registered on `app`
    pub fn from_app(app: &Application) -> Option<Arc<Self>> {
        app.extension::<Self>(EXTENSION_KEY)
    }

    /// Bind to `app`.
    ///
    /// Fills missing Flywheel config keys with defaults and registers this
    /// extension under [`EXTENSION_KEY`]. The first application bound stays
    /// the one the engine is built from for as long as it is alive; once it
    /// is dropped the next bound application takes its place.
    pub fn init_app(self: &Arc<Self>, app: &Arc<Application>) {
        let first = {
            let mut bound = self.app.write().unwrap_or_else(PoisonError::into_inner);
            let vacant = bound.upgrade().is_none();
            if vacant {
                *bound = Arc::downgrade(app);
            }
            vacant
        };

        apply_defaults(&mut app.config_mut());
        app.register_extension(EXTENSION_KEY, Arc::clone(self));

        debug!(app = app.name(), first, "Flywheel bound to application");
    }

    /// The bound application, if it is still alive
    pub fn app(&self) -> Option<Arc<Application>> {
        self.app
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    /// The engine, built from the bound application's config on first use.
    ///
    /// Fails with [`FlywheelError::NotRegistered`] while no application is
    /// bound. Concurrent first calls wait for a single construction; a
    /// failed construction leaves the cell empty so a later call retries.
    pub async fn engine(&self) -> FlywheelResult<&Engine> {
        self.engine.get_or_try_init(|| self.build_engine()).await
    }

    /// The engine if it has already been built
    pub fn try_engine(&self) -> Option<&Engine> {
        self.engine.get()
    }

    #[instrument(skip(self))]
    async fn build_engine(&self) -> FlywheelResult<Engine> {
        let app = self.app().ok_or(FlywheelError::NotRegistered)?;
        // Guard must not live across the connect await
        let config = FlywheelConfig::from_app_config(&app.config())?;

        let mut engine = Engine::new(config.namespace.clone(), config.default_conflict);
        engine
            .connect(&config.region, ConnectOptions::from_config(&config))
            .await?;

        info!(
            app = app.name(),
            region = %config.region,
            namespace = ?config.namespace.parts(),
            "Flywheel engine ready"
        );
        Ok(engine)
    }
}
