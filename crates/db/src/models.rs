use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh, time-ordered identifier.
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id! {
    /// Identifier of a user account.
    UserId
}

define_id! {
    /// Identifier of a book post.
    BookId
}

/// Stored account. The password hash never leaves the process.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// One-way check of a plain password against the stored hash. Runs on the
    /// blocking pool, like hashing in the store.
    pub async fn verify_password(&self, candidate: &str) -> bool {
        let user_id = self.id;
        let hash = self.password_hash.clone();
        let candidate = candidate.to_string();

        let verified =
            tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash)).await;

        match verified {
            Ok(Ok(matches)) => matches,
            Ok(Err(err)) => {
                tracing::warn!(user_id = %user_id, error = %err, "stored password hash is unreadable");
                false
            }
            Err(err) => {
                tracing::error!(user_id = %user_id, error = %err, "password check task failed");
                false
            }
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// Outward projection of a user: everything but the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile_image: String,
}

/// Registration input; the store hashes `password` before persisting.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile_image: String,
}

/// A reviewed book. `user` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub caption: String,
    pub image: String,
    pub rating: u8,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Replace the owner reference with a populated summary.
    pub fn with_owner(self, owner: Option<OwnerSummary>) -> BookWithOwner {
        BookWithOwner {
            id: self.id,
            title: self.title,
            caption: self.caption,
            image: self.image,
            rating: self.rating,
            user: owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub caption: String,
    pub image: String,
    pub rating: u8,
    pub user: UserId,
}

/// Owner fields shown next to a book in the shared feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub profile_image: String,
}

impl From<&PublicUser> for OwnerSummary {
    fn from(user: &PublicUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Feed entry: a book with its owner populated, or `null` if the owner is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookWithOwner {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub caption: String,
    pub image: String,
    pub rating: u8,
    pub user: Option<OwnerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
