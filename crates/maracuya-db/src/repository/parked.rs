//! # Parked Sale Repository
//!
//! Sales that failed to commit, kept aside with their full draft so the
//! recovery module can retry them later.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use maracuya_core::ParkedSale;

use crate::error::{DbError, DbResult};

/// Repository for parked sales.
#[derive(Debug, Clone)]
pub struct ParkedSaleRepository {
    pool: SqlitePool,
}

impl ParkedSaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ParkedSaleRepository { pool }
    }

    /// Parks a failed draft.
    pub async fn park(&self, parked: &ParkedSale) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO parked_sales (id, draft_json, failure_kind, last_error, attempts, \
                 retry_after, parked_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&parked.id)
        .bind(&parked.draft_json)
        .bind(parked.failure_kind)
        .bind(&parked.last_error)
        .bind(parked.attempts)
        .bind(parked.retry_after)
        .bind(&parked.parked_by)
        .bind(parked.created_at)
        .execute(&self.pool)
        .await?;

        warn!(id = %parked.id, kind = ?parked.failure_kind, "Sale parked for recovery");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<ParkedSale> {
        sqlx::query_as::<_, ParkedSale>("SELECT * FROM parked_sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("ParkedSale", id))
    }

    /// Everything parked, oldest first, for the recovery screen.
    pub async fn list_all(&self) -> DbResult<Vec<ParkedSale>> {
        let parked =
            sqlx::query_as::<_, ParkedSale>("SELECT * FROM parked_sales ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(parked)
    }

    /// Parked sales whose backoff has elapsed as of `now`. Validation
    /// failures are excluded: retrying them can never succeed.
    pub async fn list_due(&self, now: DateTime<Utc>) -> DbResult<Vec<ParkedSale>> {
        let parked = sqlx::query_as::<_, ParkedSale>(
            "SELECT * FROM parked_sales \
             WHERE retry_after <= ?1 AND failure_kind != 'validation' \
             ORDER BY created_at",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(parked)
    }

    /// Records one failed retry: bumps the attempt counter, stores the new
    /// error and pushes the backoff out.
    pub async fn record_attempt(
        &self,
        id: &str,
        last_error: &str,
        retry_after: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE parked_sales \
             SET attempts = attempts + 1, last_error = ?1, retry_after = ?2 \
             WHERE id = ?3",
        )
        .bind(last_error)
        .bind(retry_after)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ParkedSale", id));
        }
        Ok(())
    }

    /// Removes a parked sale, after a successful retry or a manual discard.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM parked_sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ParkedSale", id));
        }

        debug!(%id, "Parked sale removed");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parked_sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
