use anyhow::Context;
use bookworm_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookworm settings")?;
    bookworm_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "bookworm starting"
    );

    bookworm_app::run(settings).await
}
