//! # Lunch Order Repository
//!
//! Family-portal lunch orders. Orders are written with their `A-` series
//! correlative in one transaction; per-client lookup rides the
//! `(client_code, serve_date)` index rather than a second copy of the rows.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use maracuya_core::correlative::CorrelativeCategory;
use maracuya_core::{LunchOrder, LunchOrderStatus};

use crate::error::{DbError, DbResult};
use crate::repository::counter::CounterRepository;

/// Repository for lunch orders.
#[derive(Debug, Clone)]
pub struct LunchOrderRepository {
    pool: SqlitePool,
}

/// Everything needed to place an order except the correlative, which the
/// repository allocates inside the insert transaction.
#[derive(Debug, Clone)]
pub struct NewLunchOrder {
    pub id: String,
    pub client_id: String,
    pub client_code: String,
    pub client_name: String,
    pub serve_date: DateTime<Utc>,
    pub items_json: String,
    pub total_centimos: i64,
    pub notes: Option<String>,
}

impl LunchOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LunchOrderRepository { pool }
    }

    /// Places an order: allocates the next `A-` correlative and inserts the
    /// row in one transaction, so an insert failure never burns a number.
    pub async fn place(&self, order: NewLunchOrder) -> DbResult<LunchOrder> {
        let mut tx = self.pool.begin().await?;

        let correlative =
            CounterRepository::next_correlative_tx(&mut *tx, CorrelativeCategory::Lunch).await?;

        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO lunch_orders (id, correlative, client_id, client_code, client_name, \
                 serve_date, items_json, total_centimos, status, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&order.id)
        .bind(&correlative)
        .bind(&order.client_id)
        .bind(&order.client_code)
        .bind(&order.client_name)
        .bind(order.serve_date)
        .bind(&order.items_json)
        .bind(order.total_centimos)
        .bind(LunchOrderStatus::Ordered)
        .bind(&order.notes)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(%correlative, client = %order.client_code, "Lunch order placed");
        Ok(LunchOrder {
            id: order.id,
            correlative,
            client_id: order.client_id,
            client_code: order.client_code,
            client_name: order.client_name,
            serve_date: order.serve_date,
            items_json: order.items_json,
            total_centimos: order.total_centimos,
            status: LunchOrderStatus::Ordered,
            notes: order.notes,
            created_at,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<LunchOrder> {
        sqlx::query_as::<_, LunchOrder>("SELECT * FROM lunch_orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("LunchOrder", id))
    }

    /// A family's orders, newest serve date first. This is the portal's
    /// "my orders" view; it hits the `(client_code, serve_date)` index.
    pub async fn list_by_client_code(&self, client_code: &str) -> DbResult<Vec<LunchOrder>> {
        let orders = sqlx::query_as::<_, LunchOrder>(
            "SELECT * FROM lunch_orders WHERE client_code = ?1 ORDER BY serve_date DESC",
        )
        .bind(client_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// All orders to serve on a given day. This is the kitchen's prep list.
    pub async fn list_for_day(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> DbResult<Vec<LunchOrder>> {
        let orders = sqlx::query_as::<_, LunchOrder>(
            "SELECT * FROM lunch_orders \
             WHERE serve_date >= ?1 AND serve_date < ?2 AND status != 'cancelled' \
             ORDER BY client_name",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn set_status(&self, id: &str, status: LunchOrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE lunch_orders SET status = ?1 WHERE id = ?2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LunchOrder", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use maracuya_core::LunchOrderStatus;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    use super::NewLunchOrder;

    async fn seed_client(db: &Database, code: &str) -> String {
        use maracuya_core::Client;
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
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
        client.id
    }

    fn order_for(client_id: &str, code: &str, serve_date: chrono::DateTime<Utc>) -> NewLunchOrder {
        NewLunchOrder {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            client_code: code.to_string(),
            client_name: "Ana Quispe".to_string(),
            serve_date,
            items_json: r#"[{"name":"Menú del día","quantity":1}]"#.to_string(),
            total_centimos: 850,
            notes: Some("sin ají".to_string()),
        }
    }

    #[tokio::test]
    async fn test_place_assigns_sequential_lunch_correlatives() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client_id = seed_client(&db, "C001").await;
        let repo = db.lunch_orders();

        let day = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let first = repo.place(order_for(&client_id, "C001", day)).await.unwrap();
        let second = repo.place(order_for(&client_id, "C001", day)).await.unwrap();

        assert_eq!(first.correlative, "A-000001");
        assert_eq!(second.correlative, "A-000002");
        assert_eq!(first.status, LunchOrderStatus::Ordered);
    }

    #[tokio::test]
    async fn test_list_by_client_code_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client_id = seed_client(&db, "C001").await;
        let repo = db.lunch_orders();

        let monday = Utc.with_ymd_and_hms(2026, 9, 7, 0, 0, 0).unwrap();
        repo.place(order_for(&client_id, "C001", monday)).await.unwrap();
        repo.place(order_for(&client_id, "C001", monday + Duration::days(1))).await.unwrap();

        let orders = repo.list_by_client_code("C001").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].serve_date > orders[1].serve_date);
    }

    #[tokio::test]
    async fn test_kitchen_day_list_excludes_cancelled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client_id = seed_client(&db, "C001").await;
        let repo = db.lunch_orders();

        let day = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let kept = repo.place(order_for(&client_id, "C001", day)).await.unwrap();
        let cancelled = repo.place(order_for(&client_id, "C001", day)).await.unwrap();
        repo.set_status(&cancelled.id, LunchOrderStatus::Cancelled).await.unwrap();

        let prep = repo.list_for_day(day, day + Duration::days(1)).await.unwrap();
        assert_eq!(prep.len(), 1);
        assert_eq!(prep[0].id, kept.id);
    }
}
