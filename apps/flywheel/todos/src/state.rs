//! Shared state passed to every handler.

use std::sync::Arc;

use flywheel::{Application, Engine, Flywheel, FlywheelResult};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
    flywheel: Arc<Flywheel>,
}

impl AppState {
    /// Requires Flywheel to already be bound to `app`
    pub fn new(app: Arc<Application>) -> eyre::Result<Self> {
        let flywheel = Flywheel::from_app(&app)
            .ok_or_else(|| eyre::eyre!("Flywheel is not registered on '{}'", app.name()))?;
        Ok(Self { app, flywheel })
    }

    pub async fn engine(&self) -> FlywheelResult<&Engine> {
        self.flywheel.engine().await
    }
}
