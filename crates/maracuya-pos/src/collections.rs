//! # Collections
//!
//! Settling accounts-receivable entries: the screen where a family pays off
//! what they owe. The status flip and the debt decrement happen in one
//! storage transaction, and a pending-only guard makes a double collect
//! impossible (see the receivable repository).

use tracing::info;

use maracuya_core::{ArEntry, Client, Money, Role};
use maracuya_db::Database;

use crate::error::PosResult;
use crate::session::Session;

/// The collections service.
#[derive(Debug, Clone)]
pub struct Collections {
    db: Database,
}

impl Collections {
    pub fn new(db: Database) -> Self {
        Collections { db }
    }

    /// Clients with outstanding debt, largest debtor first.
    pub async fn debtors(&self) -> PosResult<Vec<Client>> {
        Ok(self.db.clients().list_debtors().await?)
    }

    /// A client's pending entries, oldest first.
    pub async fn pending_for(&self, client_id: &str) -> PosResult<Vec<ArEntry>> {
        Ok(self.db.receivables().list_pending_for_client(client_id).await?)
    }

    /// Collects one entry. Returns the settled entry.
    pub async fn collect(
        &self,
        session: &Session,
        client_id: &str,
        sale_id: &str,
    ) -> PosResult<ArEntry> {
        session.require("collect payment", Role::Cashier)?;

        let entry = self.db.receivables().collect(client_id, sale_id, &session.user_id).await?;

        self.db
            .audit()
            .log_action(
                &session.user_id,
                "ar.collect",
                "ar_entry",
                &format!("{}:{}", client_id, sale_id),
                serde_json::json!({
                    "correlative": entry.correlative,
                    "amount_centimos": entry.amount_centimos,
                }),
            )
            .await?;

        info!(
            correlative = %entry.correlative,
            amount = %Money::from_centimos(entry.amount_centimos),
            collector = %session.code,
            "Debt collected"
        );
        Ok(entry)
    }

    /// Collects everything a client owes, oldest first. Returns the settled
    /// entries; stops at the first failure.
    pub async fn collect_all(&self, session: &Session, client_id: &str) -> PosResult<Vec<ArEntry>> {
        session.require("collect payment", Role::Cashier)?;

        let pending = self.pending_for(client_id).await?;
        let mut settled = Vec::with_capacity(pending.len());
        for entry in pending {
            settled.push(self.collect(session, client_id, &entry.sale_id).await?);
        }
        Ok(settled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maracuya_core::{ClientRef, PaymentMethod, Product, SaleFlow};
    use maracuya_db::{Database, DbConfig};
    use uuid::Uuid;

    use crate::checkout::Checkout;
    use crate::config::AppConfig;
    use crate::error::PosError;

    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "user-1".to_string(),
            code: "caja1".to_string(),
            name: "Caja Uno".to_string(),
            role,
            logged_in_at: Utc::now(),
        }
    }

    /// Commits `n` credit sales of 600 céntimos each for a fresh client.
    async fn seed_credit_sales(db: &Database, n: usize) -> Client {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Menú del día".to_string(),
            category: None,
            price_centimos: 300,
            is_kitchen: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

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

        let checkout = Checkout::new(db.clone(), AppConfig::default());
        let cashier = session(Role::Cashier);
        for _ in 0..n {
            let mut flow = SaleFlow::pos();
            flow.cart_mut().add_item(&product, 2).unwrap();
            flow.advance();
            flow.select_client(ClientRef::from(&client));
            flow.advance();
            flow.choose_payment(PaymentMethod::Credito);
            flow.advance();
            checkout.commit(&flow.draft().unwrap(), &cashier).await.unwrap();
        }

        client
    }

    #[tokio::test]
    async fn test_collect_settles_entry_and_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_credit_sales(&db, 2).await;
        let collections = Collections::new(db.clone());
        let cashier = session(Role::Cashier);

        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 1200);

        let debtors = collections.debtors().await.unwrap();
        assert_eq!(debtors.len(), 1);

        let pending = collections.pending_for(&client.id).await.unwrap();
        assert_eq!(pending.len(), 2);

        collections.collect(&cashier, &client.id, &pending[0].sale_id).await.unwrap();

        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 600);
        assert_eq!(collections.pending_for(&client.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_collect_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_credit_sales(&db, 1).await;
        let collections = Collections::new(db.clone());
        let cashier = session(Role::Cashier);

        let pending = collections.pending_for(&client.id).await.unwrap();
        collections.collect(&cashier, &client.id, &pending[0].sale_id).await.unwrap();

        let err = collections
            .collect(&cashier, &client.id, &pending[0].sale_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::NotFound { .. }));

        // Debt untouched by the failed second collect
        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 0);
    }

    #[tokio::test]
    async fn test_collect_all_clears_client() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_credit_sales(&db, 3).await;
        let collections = Collections::new(db.clone());

        let settled = collections.collect_all(&session(Role::Cashier), &client.id).await.unwrap();
        assert_eq!(settled.len(), 3);
        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap().debt_centimos, 0);
        assert!(collections.debtors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_family_role_cannot_collect() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = seed_credit_sales(&db, 1).await;
        let collections = Collections::new(db.clone());

        let err = collections
            .collect_all(&session(Role::Family), &client.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::PermissionDenied { .. }));
    }
}
