use std::sync::Arc;

use anyhow::Context;
use bookworm_authz::{SessionGuard, TokenService};
use bookworm_db::{BookStore, InMemoryBookStore, InMemoryUserStore, UserStore};
use bookworm_kernel::settings::Settings;
use bookworm_media::MediaHost;

/// Collaborators shared by the feature modules, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub media: Arc<dyn MediaHost>,
    pub tokens: Arc<TokenService>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let tokens = TokenService::from_settings(&settings.auth)
            .context("invalid auth configuration")?;
        let media =
            bookworm_media::from_settings(&settings.media).context("invalid media configuration")?;

        Ok(Self {
            users: Arc::new(InMemoryUserStore::with_hash_cost(
                settings.auth.password_hash_cost,
            )),
            books: Arc::new(InMemoryBookStore::new()),
            media,
            tokens: Arc::new(tokens),
        })
    }

    pub fn session_guard(&self) -> SessionGuard {
        SessionGuard::new(self.tokens.clone(), self.users.clone())
    }
}
