use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::error::Result;

/// Token ids (`jti`) revoked by logout. Rows are only needed until the
/// token would have expired anyway.
#[derive(Clone)]
pub struct RevokedTokenRepository {
    pool: DbPool,
}

impl RevokedTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let pool = self.pool.clone();
        let jti = jti.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)",
                rusqlite::params![jti, expires_at],
            )?;
            Ok(())
        })
        .await?
    }

    pub async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let jti = jti.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let revoked: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?)",
                [&jti],
                |row| row.get(0),
            )?;
            Ok(revoked)
        })
        .await?
    }

    /// Batch delete revocations whose tokens have expired.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let pool = self.pool.clone();
        let now = Utc::now();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM revoked_tokens WHERE expires_at <= ?",
                rusqlite::params![now],
            )?;
            Ok(rows)
        })
        .await?
    }
}
