use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKWORM_ENV";
const CONFIG_DIR_ENV: &str = "BOOKWORM_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKWORM";

/// Unprefixed variables that deployments already export, mapped onto settings keys.
const CONVENTIONAL_OVERRIDES: &[(&str, &str)] = &[
    ("JWT_SECRET", "auth.jwt_secret"),
    ("PORT", "server.port"),
    ("CLOUDINARY_CLOUD_NAME", "media.cloud_name"),
    ("CLOUDINARY_API_KEY", "media.api_key"),
    ("CLOUDINARY_API_SECRET", "media.api_secret"),
];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and process environment variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit config directory and environment name.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let mut builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (variable, key) in CONVENTIONAL_OVERRIDES {
            builder = builder
                .set_override_option(*key, std::env::var(variable).ok())
                .with_context(|| format!("failed to apply {} override", variable))?;
        }

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Upper bound for request bodies; cover images arrive base64-encoded.
    #[serde(default = "ServerSettings::default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    fn default_body_limit_bytes() -> usize {
        5 * 1024 * 1024
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            body_limit_bytes: Self::default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret for session tokens. Startup fails without it.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "AuthSettings::default_token_ttl_days")]
    pub token_ttl_days: i64,
    #[serde(default = "AuthSettings::default_password_hash_cost")]
    pub password_hash_cost: u32,
}

impl AuthSettings {
    fn default_token_ttl_days() -> i64 {
        15
    }

    fn default_password_hash_cost() -> u32 {
        10
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_days: Self::default_token_ttl_days(),
            password_hash_cost: Self::default_password_hash_cost(),
        }
    }
}

/// Which media host implementation backs image uploads.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaProvider {
    #[default]
    Memory,
    Cloudinary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    #[serde(default)]
    pub provider: MediaProvider,
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default = "MediaSettings::default_api_base")]
    pub api_base: String,
    /// Optional folder uploads are placed in.
    #[serde(default)]
    pub folder: Option<String>,
}

impl MediaSettings {
    fn default_api_base() -> String {
        "https://api.cloudinary.com/v1_1".to_string()
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            provider: MediaProvider::default(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base: Self::default_api_base(),
            folder: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
