//! Accounts: registration, login, and the caller's own profile

use serde::{Deserialize, Serialize};

use super::error::{violations, FieldError, ServiceError};
use super::validation::{
    check_email, check_id, check_name, check_password, check_phone, present,
};
use crate::auth::{password, Identity, TokenService};
use crate::storage::models::User;
use crate::storage::Database;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Registration {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Changes to the caller's profile. Blank fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub current_password: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub new_password: Option<String>,
    pub phone: Option<String>,
}

/// Find a user by public id, or by name and/or email
#[derive(Debug, Default, Deserialize)]
pub struct UserLookup {
    pub email: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Public profile projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub email: String,
    pub id: u64,
    pub name: String,
    pub phone: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            name: user.name.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenView {
    pub token: String,
}

// ============================================================================
// Operations
// ============================================================================

/// Create an account and sign the new user in
pub fn register(
    db: &Database,
    tokens: &TokenService,
    req: Registration,
) -> Result<TokenView, ServiceError> {
    let (name, phone, email, password) = match (
        check_name(req.name.as_deref().unwrap_or_default()),
        check_phone(req.phone.as_deref().unwrap_or_default()),
        check_email(req.email.as_deref().unwrap_or_default()),
        check_password("password", req.password.as_deref().unwrap_or_default()),
    ) {
        (Ok(name), Ok(phone), Ok(email), Ok(password)) => (name, phone, email, password),
        (name, phone, email, password) => {
            return Err(violations([
                name.err(),
                phone.err(),
                email.err(),
                password.err(),
            ]))
        }
    };

    let mut user = User::new(name, phone, email);
    user.set_password(&password)?;
    let user = db.insert_user(user)?;

    tracing::debug!(user_id = user.id, "Registered user");
    issue_token(tokens, &user)
}

/// Exchange email and password for a token
pub fn login(
    db: &Database,
    tokens: &TokenService,
    req: Credentials,
) -> Result<TokenView, ServiceError> {
    let (email, password) = match (
        check_email(req.email.as_deref().unwrap_or_default()),
        check_password("password", req.password.as_deref().unwrap_or_default()),
    ) {
        (Ok(email), Ok(password)) => (email, password),
        (email, password) => return Err(violations([email.err(), password.err()])),
    };

    let Some(user) = db.get_user_by_email(&email)? else {
        password::verify_dummy(&password);
        tracing::debug!("Login rejected: unknown email");
        return Err(ServiceError::unauthenticated("email", "Wrong email"));
    };

    if !user.check_password(&password) {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(ServiceError::unauthenticated("password", "Wrong password"));
    }

    issue_token(tokens, &user)
}

/// The caller's own profile
pub fn current(db: &Database, identity: &Identity) -> Result<UserView, ServiceError> {
    let user = load_identity(db, identity)?;
    Ok(UserView::from(&user))
}

/// Update the caller's profile, optionally rotating the password.
///
/// Every supplied field is checked before anything is written. A password
/// change requires the current password to verify and a non-blank new one.
pub fn update_current(
    db: &Database,
    identity: &Identity,
    patch: ProfilePatch,
) -> Result<UserView, ServiceError> {
    let mut user = load_identity(db, identity)?;

    let (name, email, phone) = match (
        present(patch.name).map(|v| check_name(&v)).transpose(),
        present(patch.email).map(|v| check_email(&v)).transpose(),
        present(patch.phone).map(|v| check_phone(&v)).transpose(),
    ) {
        (Ok(name), Ok(email), Ok(phone)) => (name, email, phone),
        (name, email, phone) => return Err(violations([name.err(), email.err(), phone.err()])),
    };

    let new_password = match present(patch.current_password) {
        Some(current_password) => {
            if !user.check_password(&current_password) {
                return Err(ServiceError::invalid(
                    "current_password",
                    "Wrong current password",
                ));
            }
            let Some(new_password) = present(patch.new_password) else {
                return Err(ServiceError::invalid(
                    "new_password",
                    "New password is required",
                ));
            };
            Some(new_password)
        }
        None => None,
    };

    if let Some(name) = name {
        user.name = name;
    }
    if let Some(email) = email {
        user.email = email;
    }
    if let Some(phone) = phone {
        user.phone = phone;
    }
    if let Some(new_password) = new_password {
        user.set_password(&new_password)?;
    }

    if !db.update_user(&user)? {
        return Err(ServiceError::Auth(None));
    }

    tracing::debug!(user_id = user.id, "Updated profile");
    Ok(UserView::from(&user))
}

/// Look a user up by public id, or by name and/or email
pub fn get_user(db: &Database, lookup: UserLookup) -> Result<UserView, ServiceError> {
    let user = if let Some(raw) = lookup.id {
        let id = check_id("userId", &raw).map_err(|e| ServiceError::Validation(vec![e]))?;
        db.get_user_by_id(id)?
    } else {
        let (name, email) = match (
            present(lookup.name).map(|v| check_name(&v)).transpose(),
            present(lookup.email).map(|v| check_email(&v)).transpose(),
        ) {
            (Ok(name), Ok(email)) => (name, email),
            (name, email) => return Err(violations([name.err(), email.err()])),
        };
        if name.is_none() && email.is_none() {
            return Err(ServiceError::Validation(vec![FieldError::general(
                "Provide a user id, name or email",
            )]));
        }
        db.find_user(name.as_deref(), email.as_deref())?
    };

    user.map(|u| UserView::from(&u)).ok_or(ServiceError::NotFound)
}

// ============================================================================
// Helpers
// ============================================================================

fn load_identity(db: &Database, identity: &Identity) -> Result<User, ServiceError> {
    db.get_user(&identity.user_ref)?.ok_or_else(|| {
        tracing::debug!(user_id = identity.user_id, "Token subject no longer exists");
        ServiceError::Auth(None)
    })
}

fn issue_token(tokens: &TokenService, user: &User) -> Result<TokenView, ServiceError> {
    let token = tokens.issue(&Identity {
        user_id: user.id,
        user_ref: user.internal_id.clone(),
    })?;
    Ok(TokenView { token })
}
