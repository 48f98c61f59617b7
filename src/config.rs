use std::env;
use std::path::PathBuf;

use rand_core::{OsRng, RngCore};

/// Which backend holds workout records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "mem" => StorageBackend::Memory,
            _ => StorageBackend::Sqlite,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub upload_dir: PathBuf,
    pub jwt_secret: Vec<u8>,
    pub jwt_expiry_seconds: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:workouts.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            storage: StorageBackend::parse(
                &env::var("STORAGE_BACKEND").unwrap_or_else(|_| "sqlite".to_string()),
            ),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "static/uploads".to_string())
                .into(),
            jwt_secret: match env::var("JWT_SECRET") {
                Ok(secret) if !secret.is_empty() => secret.into_bytes(),
                _ => {
                    tracing::warn!(
                        "JWT_SECRET not set, generating a random secret; tokens will not survive a restart"
                    );
                    random_secret()
                }
            },
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}
