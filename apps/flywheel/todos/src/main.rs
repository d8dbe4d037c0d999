use core_config::tracing::{init_tracing, install_color_eyre};
use flywheel::{Application, Flywheel};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod error;
mod state;
mod todos;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let app = Application::with_config("flywheel-todos", config.app.clone());
    let db = Flywheel::with_app(&app);

    // First access builds the DynamoDB client
    let engine = db.engine().await?;
    engine.register(todos::table_spec());
    let created = engine.create_schema().await?;
    if !created.is_empty() {
        info!(tables = ?created, "Schema created");
    }

    let state = AppState::new(app)?;
    let router = todos::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM signal, shutting down gracefully"),
    }
}
