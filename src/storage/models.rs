use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::password::{self, PasswordError};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    /// Public identifier, allocated from the "users" sequence
    pub id: u64,
    /// Storage identity, used for internal relations and token subjects
    pub internal_id: String,
    pub name: String,
    /// Argon2 PHC string; never the plaintext
    pub password_hash: String,
    pub phone: String,
}

impl User {
    /// A user that has not been persisted yet. The public id is assigned on insert.
    pub fn new(name: String, phone: String, email: String) -> Self {
        Self {
            email,
            id: 0,
            internal_id: uuid::Uuid::new_v4().to_string(),
            name,
            password_hash: String::new(),
            phone,
        }
    }

    /// Replace the stored digest with a freshly salted hash of `plaintext`.
    ///
    /// This is the only way the digest changes; saving the user does not
    /// touch it.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), PasswordError> {
        self.password_hash = password::hash_password(plaintext)?;
        Ok(())
    }

    pub fn check_password(&self, plaintext: &str) -> bool {
        password::verify_password(plaintext, &self.password_hash)
    }
}

/// An item listed by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub created_at: DateTime<Utc>,
    /// Public identifier, allocated from the "items" sequence
    pub id: u64,
    /// Image reference under the upload prefix, empty when there is none
    pub image: String,
    /// Public id of the creating user; ownership checks compare against this
    pub owner_id: u64,
    /// Internal id of the owner, used to populate the owner on reads
    pub owner_ref: String,
    pub price: f64,
    pub title: String,
}

impl Item {
    pub fn new(title: String, price: f64, owner: &User) -> Self {
        Self {
            created_at: Utc::now(),
            id: 0,
            image: String::new(),
            owner_id: owner.id,
            owner_ref: owner.internal_id.clone(),
            price,
            title,
        }
    }
}
