//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use std::sync::Arc;

use tempfile::TempDir;

use crate::auth::{Identity, TokenService};
use crate::config::{AuthConfig, Config, ServerConfig, UploadConfig};
use crate::storage::models::{Item, User};
use crate::storage::{Database, Uploads};
use crate::AppState;

/// Password given to every user made by [`make_user`]
pub const TEST_PASSWORD: &str = "secret123";

const TEST_SECRET: &str = "test-secret-test-secret";

/// Open a fresh database in a temporary directory.
///
/// Returns both the `Database` and the `TempDir` guard; the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// An upload root in a temporary directory, with the default "/uploads" prefix.
pub fn setup_uploads() -> (Uploads, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let uploads = Uploads::open(&UploadConfig {
        root: temp_dir.path().join("uploads"),
        ..Default::default()
    })
    .unwrap();
    (uploads, temp_dir)
}

/// A minimal `Config` suitable for unit tests.
pub fn test_config() -> Config {
    Config {
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
            token_ttl_seconds: 86400,
        },
        server: ServerConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            data_dir: "/tmp/test".to_string(),
        },
        uploads: UploadConfig::default(),
    }
}

pub fn test_tokens() -> TokenService {
    TokenService::from_config(&test_config().auth)
}

/// Build a full `Arc<AppState>` around the given database and uploads.
pub fn test_state(db: Database, uploads: Uploads) -> Arc<AppState> {
    let config = test_config();
    let tokens = TokenService::from_config(&config.auth);
    Arc::new(AppState {
        config,
        db,
        tokens,
        uploads,
    })
}

/// Insert a user with a valid phone and [`TEST_PASSWORD`].
pub fn make_user(db: &Database, name: &str, email: &str) -> User {
    let mut user = User::new(name.to_string(), "89161234567".to_string(), email.to_string());
    user.set_password(TEST_PASSWORD).unwrap();
    db.insert_user(user).unwrap()
}

/// Insert an item owned by `owner`.
pub fn make_item(db: &Database, owner: &User, title: &str, price: f64) -> Item {
    db.insert_item(Item::new(title.to_string(), price, owner))
        .unwrap()
}

pub fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        user_ref: user.internal_id.clone(),
    }
}
