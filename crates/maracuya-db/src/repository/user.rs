//! # User Repository
//!
//! Users who can open a session with a PIN. PIN verification (bcrypt)
//! happens in the session module; this repository only handles storage.

use sqlx::SqlitePool;

use maracuya_core::User;

use crate::error::{DbError, DbResult};

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lookup by login code. Only active users can open a session.
    pub async fn get_active_by_code(&self, code: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE code = ?1 AND is_active = 1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", code))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn list_all(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO users (id, code, name, pin_hash, role, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.code)
        .bind(&user.name)
        .bind(&user.pin_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces a user's PIN hash (admin reset).
    pub async fn set_pin_hash(&self, id: &str, pin_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET pin_hash = ?1 WHERE id = ?2")
            .bind(pin_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
