//! Signed bearer tokens
//!
//! Tokens are HS256 JWTs carrying only the claims needed to identify the
//! bearer. They are self-contained: verification needs the signing secret
//! and the clock, never the store.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Identity;
use crate::config::AuthConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token could not be signed: {0}")]
    Encoding(String),
    #[error("Token expired")]
    Expired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token is malformed: {0}")]
    Malformed(String),
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Internal user id
    pub sub: String,
    /// Public user id
    pub uid: u64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.uid,
            user_ref: self.sub.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    decoding: DecodingKey,
    encoding: EncodingKey,
    ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            ttl,
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl = i64::try_from(config.token_ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(1));
        Self::new(config.secret.as_bytes(), ttl)
    }

    /// Sign a token for the identity, expiring one TTL from now
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding("token lifetime is out of range".to_string()))?;
        let claims = Claims {
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            sub: identity.user_ref.clone(),
            uid: identity.user_id,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Check signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}
