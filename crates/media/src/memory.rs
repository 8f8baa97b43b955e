use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{public_id_from_url, MediaError, MediaHost};

const URL_PREFIX: &str = "memory://bookworm/";

/// Keeps uploaded payloads in process memory. For local runs and tests.
#[derive(Default)]
pub struct InMemoryMediaHost {
    assets: RwLock<HashMap<String, String>>,
    fail_deletes: AtomicBool,
}

impl InMemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delete fail as if the host were down.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, url: &str) -> bool {
        match public_id_from_url(url) {
            Some(id) => self.assets.read().await.contains_key(id),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

#[async_trait]
impl MediaHost for InMemoryMediaHost {
    async fn upload(&self, payload: &str) -> Result<String, MediaError> {
        let id = Uuid::now_v7().simple().to_string();
        self.assets
            .write()
            .await
            .insert(id.clone(), payload.to_string());
        Ok(format!("{}{}", URL_PREFIX, id))
    }

    fn hosts(&self, url: &str) -> bool {
        url.starts_with(URL_PREFIX)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected {
                status: 503,
                message: "media host unavailable".to_string(),
            });
        }

        let id = public_id_from_url(url).ok_or_else(|| MediaError::UnknownAsset(url.to_string()))?;
        self.assets.write().await.remove(id);
        Ok(())
    }
}
