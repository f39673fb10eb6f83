//! # Cash Close Repository
//!
//! Persisted drawer reconciliations. The expected/counted/difference math
//! happens in the reports service; this repository just stores the result.

use sqlx::SqlitePool;

use maracuya_core::CashClose;

use crate::error::{DbError, DbResult};

/// Repository for cash closes.
#[derive(Debug, Clone)]
pub struct CashCloseRepository {
    pool: SqlitePool,
}

impl CashCloseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashCloseRepository { pool }
    }

    pub async fn insert(&self, close: &CashClose) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO cash_closes (id, closed_by, period_start, period_end, \
                 expected_cash_centimos, counted_cash_centimos, difference_centimos, \
                 notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&close.id)
        .bind(&close.closed_by)
        .bind(close.period_start)
        .bind(close.period_end)
        .bind(close.expected_cash_centimos)
        .bind(close.counted_cash_centimos)
        .bind(close.difference_centimos)
        .bind(&close.notes)
        .bind(close.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<CashClose> {
        sqlx::query_as::<_, CashClose>("SELECT * FROM cash_closes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("CashClose", id))
    }

    /// The most recent close, if any. Its `period_end` is the next close's
    /// `period_start`.
    pub async fn latest(&self) -> DbResult<Option<CashClose>> {
        let close = sqlx::query_as::<_, CashClose>(
            "SELECT * FROM cash_closes ORDER BY period_end DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(close)
    }

    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<CashClose>> {
        let closes = sqlx::query_as::<_, CashClose>(
            "SELECT * FROM cash_closes ORDER BY period_end DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(closes)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use maracuya_core::CashClose;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    fn close_ending(hours_ago: i64) -> CashClose {
        let end = Utc::now() - Duration::hours(hours_ago);
        CashClose {
            id: Uuid::new_v4().to_string(),
            closed_by: "admin".to_string(),
            period_start: end - Duration::hours(8),
            period_end: end,
            expected_cash_centimos: 15000,
            counted_cash_centimos: 14800,
            difference_centimos: -200,
            notes: Some("faltante de S/ 2.00".to_string()),
            created_at: end,
        }
    }

    #[tokio::test]
    async fn test_latest_returns_most_recent_period() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_closes();

        assert!(repo.latest().await.unwrap().is_none());

        let older = close_ending(24);
        let newer = close_ending(1);
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let latest = repo.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert_eq!(latest.difference_centimos, -200);
    }
}
