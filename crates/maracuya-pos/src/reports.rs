//! # Reports & Cash Close
//!
//! Period summaries for the dashboard and the end-of-day drawer
//! reconciliation.
//!
//! ## Cash Close Semantics
//! Expected cash counts only **efectivo** collected on completed sales in
//! the period; Yape/Plin/transfers never enter the drawer, credit collects
//! later. The period starts where the previous close ended (or at the given
//! fallback for a first close), so no sale is ever counted twice.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use maracuya_core::{validation, CashClose, CoreError, Money, PaymentMethod, Role};
use maracuya_db::{Database, MethodTotal};

use crate::error::PosResult;
use crate::session::Session;

/// Aggregates for a period, shown on the dashboard.
#[derive(Debug, Clone)]
pub struct PeriodSummary {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub sale_count: i64,
    /// Total sold (all methods, including credit).
    pub total_centimos: i64,
    /// Money actually taken in at sale time.
    pub collected_centimos: i64,
    /// Efectivo portion of `collected` - what should be in the drawer.
    pub cash_centimos: i64,
    pub by_method: Vec<MethodTotal>,
}

/// The dashboard screen's numbers: today so far plus total outstanding debt.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: PeriodSummary,
    /// Pending accounts receivable across all clients.
    pub pending_ar_centimos: i64,
}

/// The reports service.
#[derive(Debug, Clone)]
pub struct Reports {
    db: Database,
}

impl Reports {
    pub fn new(db: Database) -> Self {
        Reports { db }
    }

    /// Summarizes completed sales between `from` (inclusive) and `until`
    /// (exclusive).
    pub async fn period_summary(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> PosResult<PeriodSummary> {
        let by_method = self.db.sales().totals_by_method(from, until).await?;

        let mut summary = PeriodSummary {
            from,
            until,
            sale_count: 0,
            total_centimos: 0,
            collected_centimos: 0,
            cash_centimos: 0,
            by_method: Vec::new(),
        };

        for row in &by_method {
            summary.sale_count += row.sale_count;
            summary.total_centimos += row.total_centimos;
            summary.collected_centimos += row.paid_centimos;
            if row.payment_method == PaymentMethod::Efectivo {
                summary.cash_centimos += row.paid_centimos;
            }
        }
        summary.by_method = by_method;

        Ok(summary)
    }

    /// The dashboard view: today's summary plus everything still owed.
    pub async fn dashboard(&self, day_start: DateTime<Utc>) -> PosResult<Dashboard> {
        let summary = self.period_summary(day_start, Utc::now()).await?;
        let pending_ar_centimos = self.db.receivables().total_pending().await?;
        Ok(Dashboard { summary, pending_ar_centimos })
    }

    /// Closes the drawer: computes expected cash since the previous close
    /// (or `fallback_start` for the first one), records the counted amount
    /// and the difference. Admin only.
    pub async fn close_cash(
        &self,
        session: &Session,
        counted_cash_centimos: i64,
        fallback_start: DateTime<Utc>,
        notes: Option<String>,
    ) -> PosResult<CashClose> {
        session.require("close cash", Role::Admin)?;
        validation::validate_counted_cash(counted_cash_centimos).map_err(CoreError::from)?;

        let period_start = match self.db.cash_closes().latest().await? {
            Some(previous) => previous.period_end,
            None => fallback_start,
        };
        let period_end = Utc::now();

        let summary = self.period_summary(period_start, period_end).await?;
        let expected = summary.cash_centimos;

        let close = CashClose {
            id: Uuid::new_v4().to_string(),
            closed_by: session.user_id.clone(),
            period_start,
            period_end,
            expected_cash_centimos: expected,
            counted_cash_centimos,
            difference_centimos: counted_cash_centimos - expected,
            notes,
            created_at: period_end,
        };

        self.db.cash_closes().insert(&close).await?;
        self.db
            .audit()
            .log_action(
                &session.user_id,
                "cash.close",
                "cash_close",
                &close.id,
                serde_json::json!({
                    "expected_centimos": close.expected_cash_centimos,
                    "counted_centimos": close.counted_cash_centimos,
                    "difference_centimos": close.difference_centimos,
                }),
            )
            .await?;

        info!(
            expected = %Money::from_centimos(close.expected_cash_centimos),
            counted = %Money::from_centimos(close.counted_cash_centimos),
            difference = %Money::from_centimos(close.difference_centimos),
            "Cash closed"
        );
        Ok(close)
    }

    /// Recent closes for the history screen.
    pub async fn recent_closes(&self, limit: i64) -> PosResult<Vec<CashClose>> {
        Ok(self.db.cash_closes().list_recent(limit).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use maracuya_core::{ClientRef, Product, SaleFlow};
    use maracuya_db::DbConfig;

    use crate::checkout::Checkout;
    use crate::config::AppConfig;
    use crate::error::PosError;

    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "user-1".to_string(),
            code: "admin".to_string(),
            name: "Administración".to_string(),
            role,
            logged_in_at: Utc::now(),
        }
    }

    async fn seed_product(db: &Database) -> Product {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Menú del día".to_string(),
            category: None,
            price_centimos: 500,
            is_kitchen: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn commit_sale(db: &Database, product: &Product, method: PaymentMethod) {
        let checkout = Checkout::new(db.clone(), AppConfig::default());
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(product, 1).unwrap();
        flow.advance();
        if method == PaymentMethod::Credito {
            let now = Utc::now();
            let client = maracuya_core::Client {
                id: uuid::Uuid::new_v4().to_string(),
                code: format!("C{}", uuid::Uuid::new_v4().simple()),
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
            flow.select_client(ClientRef::from(&client));
        }
        flow.advance();
        flow.choose_payment(method);
        flow.advance();
        checkout.commit(&flow.draft().unwrap(), &session(Role::Cashier)).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_separates_cash_from_other_methods() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db).await;
        let reports = Reports::new(db.clone());

        commit_sale(&db, &product, PaymentMethod::Efectivo).await;
        commit_sale(&db, &product, PaymentMethod::Efectivo).await;
        commit_sale(&db, &product, PaymentMethod::Yape).await;
        commit_sale(&db, &product, PaymentMethod::Credito).await;

        let from = Utc::now() - Duration::hours(1);
        let until = Utc::now() + Duration::hours(1);
        let summary = reports.period_summary(from, until).await.unwrap();

        assert_eq!(summary.sale_count, 4);
        assert_eq!(summary.total_centimos, 2000);
        // Credit collected nothing at sale time
        assert_eq!(summary.collected_centimos, 1500);
        // Only efectivo goes to the drawer
        assert_eq!(summary.cash_centimos, 1000);
    }

    #[tokio::test]
    async fn test_cash_close_difference_and_chaining() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db).await;
        let reports = Reports::new(db.clone());
        let admin = session(Role::Admin);
        let day_start = Utc::now() - Duration::hours(8);

        commit_sale(&db, &product, PaymentMethod::Efectivo).await;
        commit_sale(&db, &product, PaymentMethod::Efectivo).await;

        // Counted 2 soles short
        let close = reports.close_cash(&admin, 800, day_start, None).await.unwrap();
        assert_eq!(close.expected_cash_centimos, 1000);
        assert_eq!(close.difference_centimos, -200);

        // Sales after the close fall into the next period only
        commit_sale(&db, &product, PaymentMethod::Efectivo).await;
        let second = reports.close_cash(&admin, 500, day_start, None).await.unwrap();
        assert_eq!(second.period_start, close.period_end);
        assert_eq!(second.expected_cash_centimos, 500);
        assert_eq!(second.difference_centimos, 0);
    }

    #[tokio::test]
    async fn test_dashboard_includes_outstanding_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db).await;
        let reports = Reports::new(db.clone());

        commit_sale(&db, &product, PaymentMethod::Efectivo).await;
        commit_sale(&db, &product, PaymentMethod::Credito).await;

        let dashboard = reports.dashboard(Utc::now() - Duration::hours(1)).await.unwrap();
        assert_eq!(dashboard.summary.sale_count, 2);
        assert_eq!(dashboard.pending_ar_centimos, 500);
    }

    #[tokio::test]
    async fn test_cash_close_requires_admin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db.clone());

        let err = reports
            .close_cash(&session(Role::Cashier), 0, Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_negative_counted_cash_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db.clone());

        let err = reports
            .close_cash(&session(Role::Admin), -100, Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));
    }
}
