//! item-market - A small marketplace backend
//!
//! This crate provides user accounts and owner-scoped item listings with:
//! - Registration and login with Argon2 password hashes
//! - Signed, time-limited bearer tokens (HS256 JWT)
//! - Atomic per-name sequences for public ids
//! - Item CRUD with ownership checks, filtering and sorting
//! - Item images stored as files under an upload root
//! - redb embedded database (ACID, MVCC, crash-safe)
//! - REST API with JSend envelopes

pub mod api;
pub mod auth;
pub mod config;
pub mod registry;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use auth::TokenService;
use config::Config;
use storage::{Database, Uploads};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: TokenService,
    pub uploads: Uploads,
}
