//! # Client Repository
//!
//! CRUD and debt maintenance for registered clients.
//!
//! ## Debt Invariant
//! `debt_centimos` is a running denormalization of the client's pending AR
//! entries. It is only ever moved inside a transaction together with the AR
//! write that justifies it (`adjust_debt_tx`), so the two can't drift.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use maracuya_core::Client;

use crate::error::{DbError, DbResult};

/// Repository for clients.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Lookup by the short code families use in the lunch portal.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Client", code))
    }

    /// Name search for the POS client picker. Case-insensitive substring
    /// match on the precomputed full name; active clients only.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Client>> {
        let pattern = format!("%{}%", query);
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients \
             WHERE is_active = 1 AND (full_name LIKE ?1 COLLATE NOCASE OR code LIKE ?1) \
             ORDER BY full_name LIMIT ?2",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn list_active(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE is_active = 1 ORDER BY full_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    /// Clients with outstanding debt, largest first. Feeds the collections
    /// screen.
    pub async fn list_debtors(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE debt_centimos > 0 ORDER BY debt_centimos DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO clients (id, code, names, last_names, full_name, has_account, \
                 is_active, grade, level, debt_centimos, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&client.id)
        .bind(&client.code)
        .bind(&client.names)
        .bind(&client.last_names)
        .bind(&client.full_name)
        .bind(client.has_account)
        .bind(client.is_active)
        .bind(&client.grade)
        .bind(&client.level)
        .bind(client.debt_centimos)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(code = %client.code, "Client inserted");
        Ok(())
    }

    /// Updates editable fields. Debt is deliberately excluded: it only moves
    /// through `adjust_debt_tx`.
    pub async fn update(&self, client: &Client) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE clients SET code = ?1, names = ?2, last_names = ?3, full_name = ?4, \
                 has_account = ?5, is_active = ?6, grade = ?7, level = ?8, updated_at = ?9 \
             WHERE id = ?10",
        )
        .bind(&client.code)
        .bind(&client.names)
        .bind(&client.last_names)
        .bind(&client.full_name)
        .bind(client.has_account)
        .bind(client.is_active)
        .bind(&client.grade)
        .bind(&client.level)
        .bind(client.updated_at)
        .bind(&client.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }
        Ok(())
    }

    /// Soft delete / reactivate.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }

    /// Moves the running debt by `delta_centimos` (positive on credit sale,
    /// negative on collection). Transaction-scoped: always paired with the
    /// AR insert or status flip that explains the movement.
    pub async fn adjust_debt_tx(
        conn: &mut SqliteConnection,
        client_id: &str,
        delta_centimos: i64,
    ) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE clients SET debt_centimos = debt_centimos + ?1 WHERE id = ?2")
                .bind(delta_centimos)
                .bind(client_id)
                .execute(conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", client_id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maracuya_core::Client;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    fn sample_client(code: &str, names: &str, last_names: &str) -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            names: names.to_string(),
            last_names: last_names.to_string(),
            full_name: format!("{} {}", names, last_names),
            has_account: true,
            is_active: true,
            grade: Some("3B".to_string()),
            level: Some("Primaria".to_string()),
            debt_centimos: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clients = db.clients();

        let client = sample_client("C001", "Ana", "Quispe");
        clients.insert(&client).await.unwrap();

        let found = clients.get_by_code("C001").await.unwrap();
        assert_eq!(found.id, client.id);
        assert_eq!(found.full_name, "Ana Quispe");
        assert!(found.has_account);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clients = db.clients();

        clients.insert(&sample_client("C001", "Ana", "Quispe")).await.unwrap();
        let err = clients.insert(&sample_client("C001", "Bruno", "Díaz")).await.unwrap_err();
        assert!(err.is_unique_violation_on("clients.code"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clients = db.clients();

        clients.insert(&sample_client("C001", "Ana", "Quispe")).await.unwrap();
        clients.insert(&sample_client("C002", "Bruno", "Díaz")).await.unwrap();

        let hits = clients.search("quispe", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "C001");
    }

    #[tokio::test]
    async fn test_adjust_debt_in_transaction() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clients = db.clients();

        let client = sample_client("C001", "Ana", "Quispe");
        clients.insert(&client).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        super::ClientRepository::adjust_debt_tx(&mut *tx, &client.id, 600).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(clients.get_by_id(&client.id).await.unwrap().debt_centimos, 600);

        // Rolled-back adjustments leave no trace
        let mut tx = db.pool().begin().await.unwrap();
        super::ClientRepository::adjust_debt_tx(&mut *tx, &client.id, 1000).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(clients.get_by_id(&client.id).await.unwrap().debt_centimos, 600);
    }
}
