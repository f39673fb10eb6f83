//! # Accounts Receivable Repository
//!
//! Money owed by clients for credit sales.
//!
//! ## Canonical Key
//! An entry lives at exactly one place: `(client_id, sale_id)`. The commit
//! transaction writes it once; there is no mirror to keep in sync. The
//! PRIMARY KEY makes a second entry for the same sale impossible.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use maracuya_core::ArEntry;

use crate::error::{DbError, DbResult};
use crate::repository::client::ClientRepository;

/// Repository for accounts receivable.
#[derive(Debug, Clone)]
pub struct ReceivableRepository {
    pool: SqlitePool,
}

impl ReceivableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableRepository { pool }
    }

    /// Inserts the AR entry inside the checkout transaction.
    pub async fn insert_entry_tx(conn: &mut SqliteConnection, entry: &ArEntry) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO accounts_receivable (client_id, sale_id, status, amount_centimos, \
                 correlative, client_name, items_json, created_at, collected_at, collected_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&entry.client_id)
        .bind(&entry.sale_id)
        .bind(entry.status)
        .bind(entry.amount_centimos)
        .bind(&entry.correlative)
        .bind(&entry.client_name)
        .bind(&entry.items_json)
        .bind(entry.created_at)
        .bind(entry.collected_at)
        .bind(&entry.collected_by)
        .execute(conn)
        .await?;

        debug!(correlative = %entry.correlative, "AR entry inserted");
        Ok(())
    }

    pub async fn get(&self, client_id: &str, sale_id: &str) -> DbResult<ArEntry> {
        sqlx::query_as::<_, ArEntry>(
            "SELECT * FROM accounts_receivable WHERE client_id = ?1 AND sale_id = ?2",
        )
        .bind(client_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("ArEntry", sale_id))
    }

    /// Pending entries for a client, oldest first (collections screen).
    pub async fn list_pending_for_client(&self, client_id: &str) -> DbResult<Vec<ArEntry>> {
        let entries = sqlx::query_as::<_, ArEntry>(
            "SELECT * FROM accounts_receivable \
             WHERE client_id = ?1 AND status = 'pending' ORDER BY created_at",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// All pending entries across clients, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<ArEntry>> {
        let entries = sqlx::query_as::<_, ArEntry>(
            "SELECT * FROM accounts_receivable WHERE status = 'pending' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Sum of all pending entries in céntimos, across clients.
    pub async fn total_pending(&self) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_centimos) FROM accounts_receivable WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0))
    }

    /// Sum of a client's pending entries in céntimos. Should always equal
    /// the client's `debt_centimos` denormalization.
    pub async fn total_pending_for_client(&self, client_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_centimos) FROM accounts_receivable \
             WHERE client_id = ?1 AND status = 'pending'",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0))
    }

    /// Marks an entry collected and decreases the client's debt, in one
    /// transaction. The `status = 'pending'` guard makes a double collect a
    /// no-op at the data level: the second call affects zero rows and fails
    /// with NotFound instead of decrementing the debt twice.
    pub async fn collect(
        &self,
        client_id: &str,
        sale_id: &str,
        collected_by: &str,
    ) -> DbResult<ArEntry> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE accounts_receivable \
             SET status = 'collected', collected_at = ?1, collected_by = ?2 \
             WHERE client_id = ?3 AND sale_id = ?4 AND status = 'pending'",
        )
        .bind(chrono::Utc::now())
        .bind(collected_by)
        .bind(client_id)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending ArEntry", sale_id));
        }

        let entry = sqlx::query_as::<_, ArEntry>(
            "SELECT * FROM accounts_receivable WHERE client_id = ?1 AND sale_id = ?2",
        )
        .bind(client_id)
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        ClientRepository::adjust_debt_tx(&mut *tx, client_id, -entry.amount_centimos).await?;

        tx.commit().await?;

        debug!(correlative = %entry.correlative, %collected_by, "AR entry collected");
        Ok(entry)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maracuya_core::{ArEntry, ArStatus, Client};
    use uuid::Uuid;

    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn seed_client(db: &Database) -> Client {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            code: "C001".to_string(),
            names: "Ana".to_string(),
            last_names: "Quispe".to_string(),
            full_name: "Ana Quispe".to_string(),
            has_account: true,
            is_active: true,
            grade: None,
            level: None,
            debt_centimos: 0,
            created_at: now,
            updated_at: now,
        };
        db.clients().insert(&client).await.unwrap();
        client
    }

    /// Inserts a sale header directly so the AR foreign key holds.
    async fn seed_sale(db: &Database, client: &Client, correlative: &str) -> String {
        use maracuya_core::{PaymentMethod, Sale, SaleOrigin, SaleStatus, SaleType};

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            correlative: correlative.to_string(),
            sale_date: now,
            cashier_id: "caja1".to_string(),
            client_id: client.id.clone(),
            client_name: client.full_name.clone(),
            subtotal_centimos: 508,
            tax_centimos: 92,
            total_centimos: 600,
            paid_centimos: 0,
            payment_method: PaymentMethod::Credito,
            sale_type: SaleType::Normal,
            status: SaleStatus::Completed,
            origin: SaleOrigin::Pos,
            request_id: Uuid::new_v4().to_string(),
            created_by: "caja1".to_string(),
            created_at: now,
        };

        let mut tx = db.pool().begin().await.unwrap();
        crate::repository::sale::SaleRepository::insert_sale_tx(&mut *tx, &sale).await.unwrap();
        tx.commit().await.unwrap();
        sale.id
    }

    fn entry_for(client: &Client, sale_id: &str, correlative: &str, amount: i64) -> ArEntry {
        ArEntry {
            client_id: client.id.clone(),
            sale_id: sale_id.to_string(),
            status: ArStatus::Pending,
            amount_centimos: amount,
            correlative: correlative.to_string(),
            client_name: client.full_name.clone(),
            items_json: "[]".to_string(),
            created_at: Utc::now(),
            collected_at: None,
            collected_by: None,
        }
    }

    #[tokio::test]
    async fn test_entry_round_trip_and_pending_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_client(&db).await;
        let sale_id = seed_sale(&db, &client, "V-000001").await;

        let mut tx = db.pool().begin().await.unwrap();
        super::ReceivableRepository::insert_entry_tx(
            &mut *tx,
            &entry_for(&client, &sale_id, "V-000001", 600),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let pending = db.receivables().list_pending_for_client(&client.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].amount_centimos, 600);
        assert_eq!(
            db.receivables().total_pending_for_client(&client.id).await.unwrap(),
            600
        );
    }

    #[tokio::test]
    async fn test_duplicate_entry_for_same_sale_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_client(&db).await;
        let sale_id = seed_sale(&db, &client, "V-000001").await;
        let entry = entry_for(&client, &sale_id, "V-000001", 600);

        let mut tx = db.pool().begin().await.unwrap();
        super::ReceivableRepository::insert_entry_tx(&mut *tx, &entry).await.unwrap();
        let err = super::ReceivableRepository::insert_entry_tx(&mut *tx, &entry)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_collect_flips_status_and_decreases_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_client(&db).await;
        let sale_id = seed_sale(&db, &client, "V-000001").await;

        let mut tx = db.pool().begin().await.unwrap();
        super::ReceivableRepository::insert_entry_tx(
            &mut *tx,
            &entry_for(&client, &sale_id, "V-000001", 600),
        )
        .await
        .unwrap();
        crate::repository::client::ClientRepository::adjust_debt_tx(&mut *tx, &client.id, 600)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let collected = db.receivables().collect(&client.id, &sale_id, "admin").await.unwrap();
        assert_eq!(collected.status, maracuya_core::ArStatus::Collected);
        assert_eq!(collected.collected_by.as_deref(), Some("admin"));

        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 0);

        // Second collect must not decrement the debt again
        let err = db.receivables().collect(&client.id, &sale_id, "admin").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 0);
    }
}
