//! # Sale Repository
//!
//! Persistence for committed sales and their line items.
//!
//! ## Write Path
//! Sales are only ever written inside the checkout transaction, through the
//! `*_tx` functions. A sale row, its items, the correlative increment and
//! the AR entry (for credit) commit or roll back together; there is no way
//! to insert a sale through this repository outside a transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use maracuya_core::{PaymentMethod, Sale, SaleItem, SaleStatus};

use crate::error::{DbError, DbResult};

/// Per-payment-method totals for a period, used by cash close and the
/// dashboard.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MethodTotal {
    pub payment_method: PaymentMethod,
    pub sale_count: i64,
    pub total_centimos: i64,
    pub paid_centimos: i64,
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Transactional writes (checkout only)
    // =========================================================================

    /// Inserts the sale header. Runs on the checkout transaction's
    /// connection; a UNIQUE violation on `request_id` means this draft was
    /// already committed and the caller should fetch the existing sale.
    pub async fn insert_sale_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sales (id, correlative, sale_date, cashier_id, client_id, \
                 client_name, subtotal_centimos, tax_centimos, total_centimos, \
                 paid_centimos, payment_method, sale_type, status, origin, request_id, \
                 created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(&sale.id)
        .bind(&sale.correlative)
        .bind(sale.sale_date)
        .bind(&sale.cashier_id)
        .bind(&sale.client_id)
        .bind(&sale.client_name)
        .bind(sale.subtotal_centimos)
        .bind(sale.tax_centimos)
        .bind(sale.total_centimos)
        .bind(sale.paid_centimos)
        .bind(sale.payment_method)
        .bind(sale.sale_type)
        .bind(sale.status)
        .bind(sale.origin)
        .bind(&sale.request_id)
        .bind(&sale.created_by)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        debug!(correlative = %sale.correlative, "Sale header inserted");
        Ok(())
    }

    /// Inserts one line item of a sale inside the checkout transaction.
    pub async fn insert_item_tx(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, name_snapshot, \
                 unit_price_centimos, quantity, line_total_centimos, is_kitchen, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_centimos)
        .bind(item.quantity)
        .bind(item.line_total_centimos)
        .bind(item.is_kitchen)
        .bind(&item.notes)
        .execute(conn)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Looks a sale up by its idempotency key. Returns `None` when the
    /// draft has never been committed.
    pub async fn get_by_request_id(&self, request_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE request_id = ?1")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn get_by_correlative(&self, correlative: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE correlative = ?1")
            .bind(correlative)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", correlative))
    }

    /// Line items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items =
            sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY rowid")
                .bind(sale_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(items)
    }

    /// Sales in a period, newest first. Drives the dashboard and reports.
    pub async fn list_in_period(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE sale_date >= ?1 AND sale_date < ?2 \
             ORDER BY sale_date DESC",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// A client's purchase history, newest first.
    pub async fn list_for_client(&self, client_id: &str, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE client_id = ?1 ORDER BY sale_date DESC LIMIT ?2",
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Per-payment-method totals for completed sales in a period. Void and
    /// pending sales are excluded so a voided sale never inflates the
    /// expected cash.
    pub async fn totals_by_method(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<MethodTotal>> {
        let totals = sqlx::query_as::<_, MethodTotal>(
            "SELECT payment_method, COUNT(*) AS sale_count, \
                 SUM(total_centimos) AS total_centimos, SUM(paid_centimos) AS paid_centimos \
             FROM sales \
             WHERE sale_date >= ?1 AND sale_date < ?2 AND status = 'completed' \
             GROUP BY payment_method",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(totals)
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Marks a sale void. Admin-only upstream; the row is kept so the
    /// correlative sequence stays gapless in reports.
    pub async fn set_status(&self, id: &str, status: SaleStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET status = ?1 WHERE id = ?2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }
}
