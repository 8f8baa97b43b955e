//! Session tokens and the guard that turns them into a request identity.
//!
//! [`TokenService`] signs and verifies stateless tokens bound to a user id.
//! [`SessionGuard`] reads the `Authorization: Bearer` header, verifies the
//! token, and loads the subject from the credential store. Handlers receive
//! the result through the [`CurrentUser`] extractor, so a request without a
//! valid session never reaches handler code.

pub mod guard;
pub mod token;

pub use guard::{CurrentUser, GuardError, SessionGuard};
pub use token::{Claims, TokenError, TokenService};
