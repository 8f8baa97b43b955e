//! Credential and resource stores.
//!
//! Handlers talk to [`UserStore`] and [`BookStore`] only; the in-memory
//! adapters here are the stores the application ships with.

pub mod books;
pub mod error;
pub mod models;
pub mod users;

pub use books::{BookStore, InMemoryBookStore};
pub use error::StoreError;
pub use models::{
    Book, BookId, BookWithOwner, NewBook, NewUser, OwnerSummary, PublicUser, User, UserId,
};
pub use users::{InMemoryUserStore, UserStore};
