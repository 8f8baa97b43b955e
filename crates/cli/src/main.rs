use std::path::PathBuf;

use anyhow::Context;
use bookworm_authz::TokenService;
use bookworm_db::UserId;
use bookworm_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Operator tooling for the Bookworm backend.
#[derive(Debug, Parser)]
#[command(name = "bookworm-cli", version, about)]
struct Cli {
    /// Read `base.toml` and `<env>.toml` from this directory instead of `./config`.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to apply with `--config-dir`.
    #[arg(long, global = true, default_value = "local")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server until interrupted.
    Serve,
    /// Load configuration and wire services without serving.
    CheckConfig,
    /// Sign a session token for a user id.
    IssueToken {
        #[arg(long)]
        user_id: UserId,
    },
    /// Verify a session token and print the user id it carries.
    VerifyToken { token: String },
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        match &self.config_dir {
            Some(dir) => Settings::load_from(dir, &self.env),
            None => Settings::load(),
        }
        .context("failed to load bookworm settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Command::Serve => {
            bookworm_telemetry::init(&settings.telemetry);
            tracing::info!(
                env = ?settings.environment,
                port = settings.server.port,
                "bookworm starting from cli"
            );
            bookworm_app::run(settings).await
        }
        Command::CheckConfig => check_config(&settings),
        Command::IssueToken { user_id } => {
            let token = token_service(&settings)?
                .issue(&user_id)
                .context("failed to issue token")?;
            println!("{token}");
            Ok(())
        }
        Command::VerifyToken { token } => {
            let user_id = token_service(&settings)?
                .verify(token.trim())
                .context("token rejected")?;
            println!("{user_id}");
            Ok(())
        }
    }
}

fn token_service(settings: &Settings) -> anyhow::Result<TokenService> {
    TokenService::from_settings(&settings.auth).context("invalid auth configuration")
}

fn check_config(settings: &Settings) -> anyhow::Result<()> {
    bookworm_app::Services::from_settings(settings)?;

    println!("environment: {:?}", settings.environment);
    println!(
        "listen: {}:{}",
        settings.server.host, settings.server.port
    );
    println!("token lifetime: {} days", settings.auth.token_ttl_days);
    println!("media provider: {:?}", settings.media.provider);
    println!("log format: {:?}", settings.telemetry.log_format);
    println!("configuration ok");
    Ok(())
}
