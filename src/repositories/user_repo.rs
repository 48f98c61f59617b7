use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([id], User::from_row).optional()?;
            Ok(result)
        })
        .await?
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let username = username.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?")?;
            let result = stmt.query_row([&username], User::from_row).optional()?;
            Ok(result)
        })
        .await?
    }

    /// Store a new user with a salted argon2 hash of `password`.
    /// Fails with `Conflict` when the username or email is taken.
    pub async fn create(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        let username = username.trim().to_string();
        let email = email.trim().to_string();
        let now = Utc::now();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;

            let (username_taken, email_taken): (bool, bool) = conn.query_row(
                "SELECT
                    EXISTS(SELECT 1 FROM users WHERE username = ?1),
                    EXISTS(SELECT 1 FROM users WHERE email = ?2)",
                rusqlite::params![username, email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            if username_taken {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
            if email_taken {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }

            conn.execute(
                "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![username, email, password_hash, now],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    AppError::Conflict("Username or email already exists".to_string())
                }
                _ => AppError::Database(e),
            })?;

            Ok(User {
                id: conn.last_insert_rowid(),
                username,
                email,
                password_hash,
                created_at: now,
            })
        })
        .await?
    }

    /// Returns the user only when `password` matches the stored hash.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = self.find_by_username(username.trim()).await?;

        match user {
            Some(user) => {
                if verify_password(password, &user.password_hash)? {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn setup_repo() -> UserRepository {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        UserRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_stores_hash_not_password() {
        let repo = setup_repo();
        let user = repo
            .create("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_ne!(user.password_hash, "password123");
        assert!(user.password_hash.starts_with("$argon2"));

        let found = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_username() {
        let repo = setup_repo();
        repo.create("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let err = repo
            .create("alice", "other@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("Username")));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let repo = setup_repo();
        repo.create("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let err = repo
            .create("bob", "alice@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("Email")));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let repo = setup_repo();
        repo.create("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert!(repo
            .verify_password("alice", "password123")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .verify_password("alice", "wrongpassword")
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .verify_password("nobody", "password123")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("password123", &a).unwrap());
        assert!(verify_password("password123", &b).unwrap());
    }
}
