//! Business rules for users and items
//!
//! Everything here is synchronous and talks to the store directly; the HTTP
//! layer runs these calls on the blocking pool.

pub mod error;
pub mod items;
pub mod users;
pub mod validation;

pub use error::{FieldError, ServiceError};
pub use items::{ItemDraft, ItemQuery, ItemSort, ItemView};
pub use users::{Credentials, ProfilePatch, Registration, TokenView, UserLookup, UserView};
