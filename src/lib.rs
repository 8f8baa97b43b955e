//! Bookworm application library: feature modules, service wiring, and the
//! server entry point.

use anyhow::Context;
use bookworm_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;
pub mod services;
pub mod utils;

pub use services::Services;

/// Build a registry holding every feature module, wired to `services`.
pub fn registry(services: &Services) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, services);
    registry
}

/// Wire services from configuration and serve HTTP until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let services = Services::from_settings(&settings).context("failed to wire services")?;
    let registry = registry(&services);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!(
        env = ?settings.environment,
        modules = registry.len(),
        "bookworm bootstrap complete"
    );

    let served = bookworm_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_all().await?;
    served
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
