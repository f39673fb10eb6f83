//! # Correlative Counter Repository
//!
//! Allocates sequential document numbers (`V-000101`, `H-000012`,
//! `A-000003`) from the `correlatives` table.
//!
//! ## Atomicity
//! Allocation is a single upsert with `RETURNING`:
//! ```sql
//! INSERT INTO correlatives (category, value) VALUES (?1, 1)
//! ON CONFLICT(category) DO UPDATE SET value = value + 1
//! RETURNING value
//! ```
//! There is no read-then-write window, so two terminals allocating at the
//! same instant always receive distinct values. Inside the sale-commit
//! transaction the same statement runs on the transaction's connection and
//! rolls back with everything else if the commit fails.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use maracuya_core::correlative::{format_correlative, CorrelativeCategory};

use crate::error::DbResult;

const ALLOCATE_SQL: &str = "INSERT INTO correlatives (category, value) VALUES (?1, 1) \
     ON CONFLICT(category) DO UPDATE SET value = value + 1 \
     RETURNING value";

/// Repository for correlative counters.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Allocates the next correlative for a category and formats it
    /// (`V-000101`). Standalone variant for callers outside a transaction
    /// (the lunch portal, tests).
    pub async fn next_correlative(&self, category: CorrelativeCategory) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Self::next_correlative_tx(&mut conn, category).await
    }

    /// Transaction-scoped allocation: runs on the caller's connection so the
    /// increment commits or rolls back with the rest of the sale.
    pub async fn next_correlative_tx(
        conn: &mut SqliteConnection,
        category: CorrelativeCategory,
    ) -> DbResult<String> {
        let value: i64 = sqlx::query_scalar(ALLOCATE_SQL)
            .bind(category.key())
            .fetch_one(conn)
            .await?;

        let correlative = format_correlative(category, value);
        debug!(category = category.key(), %correlative, "Correlative allocated");
        Ok(correlative)
    }

    /// Current counter value without advancing it. Diagnostics only.
    pub async fn current(&self, category: CorrelativeCategory) -> DbResult<i64> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM correlatives WHERE category = ?1")
                .bind(category.key())
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.unwrap_or(0))
    }

    /// Sets a counter to an explicit value. Used when seeding a new
    /// installation from the old ledger (e.g. resume at 100).
    pub async fn set(&self, category: CorrelativeCategory, value: i64) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO correlatives (category, value) VALUES (?1, ?2) \
             ON CONFLICT(category) DO UPDATE SET value = excluded.value",
        )
        .bind(category.key())
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
