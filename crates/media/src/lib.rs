//! Media host: takes uploaded image payloads and hands back durable URLs.

use std::sync::Arc;

use async_trait::async_trait;
use bookworm_kernel::settings::{MediaProvider, MediaSettings};
use thiserror::Error;

pub mod cloudinary;
pub mod memory;

pub use cloudinary::CloudinaryHost;
pub use memory::InMemoryMediaHost;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host is missing configuration: {0}")]
    Misconfigured(&'static str),

    #[error("media host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media host rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("media host returned an unexpected response: {0}")]
    InvalidResponse(String),

    #[error("cannot derive an asset id from '{0}'")]
    UnknownAsset(String),
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Store an image payload (data URI or remote URL) and return its durable URL.
    async fn upload(&self, payload: &str) -> Result<String, MediaError>;

    /// Whether `url` points at an asset this host owns and can delete.
    fn hosts(&self, url: &str) -> bool;

    /// Delete the asset behind `url`.
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

/// Asset id carried by a hosted URL: the last path segment up to its first dot.
///
/// ```
/// use bookworm_media::public_id_from_url;
///
/// let url = "https://res.cloudinary.com/demo/image/upload/v1712/abc123.png";
/// assert_eq!(public_id_from_url(url), Some("abc123"));
/// ```
pub fn public_id_from_url(url: &str) -> Option<&str> {
    let last_segment = url.rsplit('/').next()?;
    let id = last_segment.split(['.', '?', '#']).next()?;
    (!id.is_empty()).then_some(id)
}

/// Build the media host selected by configuration.
pub fn from_settings(settings: &MediaSettings) -> Result<Arc<dyn MediaHost>, MediaError> {
    match settings.provider {
        MediaProvider::Memory => {
            tracing::warn!("using in-memory media host; uploaded images are not served");
            Ok(Arc::new(InMemoryMediaHost::new()))
        }
        MediaProvider::Cloudinary => Ok(Arc::new(CloudinaryHost::from_settings(settings)?)),
    }
}
