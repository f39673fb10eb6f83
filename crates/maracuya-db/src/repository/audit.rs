//! # Audit Log Repository
//!
//! Append-only record of who did what. Commit-critical actions (the sale
//! itself) log inside the checkout transaction via `insert_tx`; everything
//! else logs through `log_action` on the pool.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use maracuya_core::AuditEntry;

use crate::error::DbResult;

/// Repository for the audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Writes an audit row inside a caller-owned transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, entry: &AuditEntry) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, actor, action, entity_type, entity_id, payload, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&entry.id)
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.payload)
        .bind(entry.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Convenience wrapper: builds the entry and writes it on the pool.
    pub async fn log_action(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        payload: serde_json::Value,
    ) -> DbResult<()> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            actor: actor.to_string(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload: payload.to_string(),
            created_at: chrono::Utc::now(),
        };

        let mut conn = self.pool.acquire().await?;
        Self::insert_tx(&mut conn, &entry).await
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// History of a single entity, oldest first.
    pub async fn for_entity(&self, entity_type: &str, entity_id: &str) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY created_at",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_log_and_query_by_entity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let audit = db.audit();

        audit
            .log_action("admin", "product.update", "product", "p1", json!({"price": 900}))
            .await
            .unwrap();
        audit
            .log_action("caja1", "sale.commit", "sale", "s1", json!({"correlative": "V-000001"}))
            .await
            .unwrap();

        let history = audit.for_entity("product", "p1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor, "admin");

        let recent = audit.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
    }
}
