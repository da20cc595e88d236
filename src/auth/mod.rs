pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenService};

/// The acting user, as resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Public user id, compared against item owners
    pub user_id: u64,
    /// Internal user id, used to load the user record
    pub user_ref: String,
}
