//! # Family Lunch Portal
//!
//! Families identify themselves with their client code, order lunches for
//! upcoming days, and can cancel while the order hasn't been served. The
//! kitchen pulls a per-day prep list.

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::info;
use uuid::Uuid;

use maracuya_core::{
    cart::CartItem, validation, Client, CoreError, LunchOrder, LunchOrderStatus,
};
use maracuya_db::{Database, NewLunchOrder};

use crate::error::{PosError, PosResult};

/// One requested line of a lunch order.
#[derive(Debug, Clone)]
pub struct LunchRequestItem {
    pub product_id: String,
    pub quantity: i64,
    pub notes: Option<String>,
}

/// The lunch portal service.
#[derive(Debug, Clone)]
pub struct LunchPortal {
    db: Database,
}

impl LunchPortal {
    pub fn new(db: Database) -> Self {
        LunchPortal { db }
    }

    /// Identifies a family by client code. The walk-in sentinel and
    /// deactivated clients cannot use the portal.
    pub async fn identify(&self, client_code: &str) -> PosResult<Client> {
        validation::validate_client_code(client_code).map_err(CoreError::from)?;

        let client = self.db.clients().get_by_code(client_code).await?;
        if !client.is_active || client.is_walk_in() {
            return Err(PosError::not_found("Client", client_code));
        }
        Ok(client)
    }

    /// Places an order for a future serve date.
    ///
    /// Prices are frozen from the current catalog at order time, exactly
    /// like the POS cart; later menu edits don't change placed orders.
    pub async fn place_order(
        &self,
        client_code: &str,
        serve_date: DateTime<Utc>,
        items: Vec<LunchRequestItem>,
        notes: Option<String>,
    ) -> PosResult<LunchOrder> {
        let client = self.identify(client_code).await?;

        if items.is_empty() {
            return Err(PosError::Validation(CoreError::NotReadyToCommit {
                state: "empty lunch order".to_string(),
            }));
        }
        if serve_date < today_start(Utc::now()) {
            return Err(PosError::Validation(CoreError::NotReadyToCommit {
                state: "serve date in the past".to_string(),
            }));
        }
        if let Some(n) = &notes {
            validation::validate_notes(n).map_err(CoreError::from)?;
        }

        let mut snapshot: Vec<CartItem> = Vec::with_capacity(items.len());
        for req in &items {
            validation::validate_quantity(req.quantity).map_err(CoreError::from)?;

            let product = self.db.products().get_by_id(&req.product_id).await?;
            if !product.is_active {
                return Err(PosError::not_found("Product", &req.product_id));
            }

            let mut item = CartItem::from_product(&product, req.quantity);
            item.notes = req.notes.clone();
            snapshot.push(item);
        }

        let total_centimos: i64 = snapshot.iter().map(|i| i.line_total_centimos()).sum();

        let order = self
            .db
            .lunch_orders()
            .place(NewLunchOrder {
                id: Uuid::new_v4().to_string(),
                client_id: client.id.clone(),
                client_code: client.code.clone(),
                client_name: client.full_name.clone(),
                serve_date,
                items_json: serde_json::to_string(&snapshot)?,
                total_centimos,
                notes,
            })
            .await?;

        self.db
            .audit()
            .log_action(
                &client.id,
                "lunch.place",
                "lunch_order",
                &order.id,
                serde_json::json!({
                    "correlative": order.correlative,
                    "serve_date": serve_date,
                    "total_centimos": total_centimos,
                }),
            )
            .await?;

        info!(correlative = %order.correlative, client = %client.code, "Lunch order placed");
        Ok(order)
    }

    /// A family's own orders, newest first.
    pub async fn my_orders(&self, client_code: &str) -> PosResult<Vec<LunchOrder>> {
        let client = self.identify(client_code).await?;
        Ok(self.db.lunch_orders().list_by_client_code(&client.code).await?)
    }

    /// Cancels an order. Families may only cancel their own, still-ordered
    /// orders for days that haven't started.
    pub async fn cancel_order(&self, client_code: &str, order_id: &str) -> PosResult<()> {
        let client = self.identify(client_code).await?;
        let order = self.db.lunch_orders().get_by_id(order_id).await?;

        if order.client_id != client.id {
            return Err(PosError::not_found("LunchOrder", order_id));
        }
        if order.status != LunchOrderStatus::Ordered {
            return Err(PosError::Conflict(format!(
                "order {} is already {:?}",
                order.correlative, order.status
            )));
        }
        if order.serve_date < today_start(Utc::now()) {
            return Err(PosError::Conflict(format!(
                "order {} is for a past day",
                order.correlative
            )));
        }

        self.db.lunch_orders().set_status(order_id, LunchOrderStatus::Cancelled).await?;
        self.db
            .audit()
            .log_action(
                &client.id,
                "lunch.cancel",
                "lunch_order",
                order_id,
                serde_json::json!({ "correlative": order.correlative }),
            )
            .await?;
        Ok(())
    }

    /// The kitchen's prep list for a day (cancelled orders excluded).
    pub async fn kitchen_list(&self, day: DateTime<Utc>) -> PosResult<Vec<LunchOrder>> {
        let start = today_start(day);
        Ok(self.db.lunch_orders().list_for_day(start, start + Duration::days(1)).await?)
    }

    /// Marks an order delivered at the counter.
    pub async fn mark_delivered(&self, order_id: &str) -> PosResult<()> {
        let order = self.db.lunch_orders().get_by_id(order_id).await?;
        if order.status != LunchOrderStatus::Ordered {
            return Err(PosError::Conflict(format!(
                "order {} is already {:?}",
                order.correlative, order.status
            )));
        }
        Ok(self.db.lunch_orders().set_status(order_id, LunchOrderStatus::Delivered).await?)
    }
}

fn today_start(when: DateTime<Utc>) -> DateTime<Utc> {
    when.with_hour(0)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(when)
}

// =============================================================================
// Unit Tests
// =============================================================================
