use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Process-wide signing secret. Changing it invalidates every issued token.
    pub secret: String,
    pub token_ttl_seconds: u64,
}

// Keep the secret out of debug logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted upload body, in bytes
    pub max_bytes: usize,
    /// Public prefix recorded in item image references (e.g. "/uploads")
    pub url_prefix: String,
    /// Directory the uploaded files are written to
    pub root: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024, // 10 MB
            url_prefix: "/uploads".to_string(),
            root: PathBuf::from("./data/uploads"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "JWT_SECRET is not set. Using a random secret; tokens will not survive a restart."
                );
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            }
        };

        let token_ttl_seconds = std::env::var("TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400); // 24 hours

        let url_prefix = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "/uploads".to_string());

        let root = std::env::var("UPLOAD_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&data_dir).join("uploads"));

        let max_bytes = std::env::var("UPLOAD_LIMIT_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        let config = Config {
            auth: AuthConfig {
                secret,
                token_ttl_seconds,
            },
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            uploads: UploadConfig {
                max_bytes,
                url_prefix,
                root,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT_SECRET cannot be empty".to_string(),
            ));
        }

        if self.auth.token_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "TOKEN_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }

        if !self.uploads.url_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "UPLOAD_DIR must start with '/'".to_string(),
            ));
        }

        if self.auth.secret.len() < 16 {
            tracing::warn!(
                "JWT_SECRET is shorter than 16 bytes. Consider using a longer secret."
            );
        }

        Ok(())
    }
}
