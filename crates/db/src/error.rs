use thiserror::Error;

/// Failures surfaced by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field collided with an existing record.
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    /// The backing store could not serve the request.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
