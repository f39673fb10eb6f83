//! # Checkout
//!
//! Turns a confirmed [`SaleDraft`] into a committed sale.
//!
//! ## The Commit Transaction
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                           │
//! │    1. allocate correlative   (atomic upsert, V- series)          │
//! │    2. insert sale header     (request_id UNIQUE = idempotency)   │
//! │    3. insert line items                                          │
//! │    4. credit only: insert AR entry + bump client debt            │
//! │    5. insert audit row                                           │
//! │  COMMIT                                                          │
//! │                                                                  │
//! │  after COMMIT: kitchen ticket (fire-and-forget, never rolls      │
//! │  anything back)                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//! Everything inside the box happens on one connection; a failure at any
//! step rolls the whole sale back, including the correlative increment, so
//! no number is ever burned by a failed commit.
//!
//! ## Idempotency
//! The draft's `request_id` is UNIQUE in storage. If a commit raced a retry
//! of itself, the loser hits the unique violation and is answered with the
//! sale the winner inserted. Committing the same confirmation twice can
//! never produce two sales.
//!
//! ## Failure Handling
//! The whole storage round trip runs under a timeout. Retryable failures
//! (timeout, connection loss, correlative collision) park the draft for the
//! recovery module; validation failures are returned straight to the
//! cashier.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use maracuya_core::{
    correlative::CorrelativeCategory, ArEntry, ArStatus, CoreError, ParkedSale, Sale, SaleDraft,
    SaleItem, SaleStatus, SaleType,
};
use maracuya_db::{
    AuditRepository, ClientRepository, CounterRepository, Database, ReceivableRepository,
    SaleRepository,
};

use crate::config::AppConfig;
use crate::error::{PosError, PosResult};
use crate::print::{KitchenPrinter, KitchenTicket, LogPrinter};
use crate::session::Session;

/// The checkout service. One per terminal; the in-flight guard serializes
/// commits so a double-tap on "confirmar" can't race itself.
pub struct Checkout {
    db: Database,
    config: AppConfig,
    printer: Arc<dyn KitchenPrinter>,
    in_flight: Mutex<()>,
}

impl Checkout {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Checkout::with_printer(db, config, Arc::new(LogPrinter))
    }

    pub fn with_printer(db: Database, config: AppConfig, printer: Arc<dyn KitchenPrinter>) -> Self {
        Checkout { db, config, printer, in_flight: Mutex::new(()) }
    }

    /// Commits a draft. On a retryable failure the draft is parked for the
    /// recovery module before the error is returned, so the cashier can move
    /// on to the next customer without losing the sale.
    pub async fn commit_or_park(&self, draft: &SaleDraft, session: &Session) -> PosResult<Sale> {
        match self.commit(draft, session).await {
            Ok(sale) => Ok(sale),
            // An in-flight collision is not parked: the draft is still open
            // on screen and the cashier just confirms again.
            Err(PosError::CommitInFlight) => Err(PosError::CommitInFlight),
            Err(err) if err.failure_kind().is_retryable() => {
                self.park(draft, session, &err).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Commits a draft without parking on failure. The recovery module uses
    /// this directly; the POS screen goes through [`commit_or_park`].
    ///
    /// [`commit_or_park`]: Checkout::commit_or_park
    pub async fn commit(&self, draft: &SaleDraft, session: &Session) -> PosResult<Sale> {
        let _guard = self.in_flight.try_lock().map_err(|_| PosError::CommitInFlight)?;

        validate_draft(draft)?;

        let result = timeout(self.config.storage_timeout, self.commit_inner(draft, session)).await;

        let sale = match result {
            Ok(Ok(sale)) => sale,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                warn!(request_id = %draft.request_id, "Sale commit timed out");
                return Err(PosError::StorageUnavailable(format!(
                    "commit exceeded {:?}",
                    self.config.storage_timeout
                )));
            }
        };

        info!(
            correlative = %sale.correlative,
            total = %sale.total(),
            method = ?sale.payment_method,
            cashier = %session.code,
            "Sale committed"
        );

        if self.config.auto_print_kitchen {
            if let Some(ticket) = KitchenTicket::from_draft(&sale.correlative, draft) {
                self.printer.print(&ticket);
            }
        }

        Ok(sale)
    }

    async fn commit_inner(&self, draft: &SaleDraft, session: &Session) -> PosResult<Sale> {
        // A retry of an already-committed confirmation is answered with the
        // existing sale, before touching the counter.
        if let Some(existing) = self.db.sales().get_by_request_id(&draft.request_id).await? {
            info!(correlative = %existing.correlative, "Duplicate commit answered with existing sale");
            return Ok(existing);
        }

        let mut tx = self.db.pool().begin().await.map_err(maracuya_db::DbError::from)?;

        let category = match draft.sale_type {
            SaleType::Historical => CorrelativeCategory::Historical,
            _ => CorrelativeCategory::Sale,
        };
        let correlative = CounterRepository::next_correlative_tx(&mut *tx, category).await?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            correlative: correlative.clone(),
            sale_date: now,
            cashier_id: session.user_id.clone(),
            client_id: draft.client_id.clone(),
            client_name: draft.client_name.clone(),
            subtotal_centimos: draft.subtotal_centimos,
            tax_centimos: draft.tax_centimos,
            total_centimos: draft.total_centimos,
            paid_centimos: draft.paid_centimos,
            payment_method: draft.payment_method,
            sale_type: draft.sale_type,
            status: SaleStatus::Completed,
            origin: draft.origin,
            request_id: draft.request_id.clone(),
            created_by: session.user_id.clone(),
            created_at: now,
        };

        if let Err(err) = SaleRepository::insert_sale_tx(&mut *tx, &sale).await {
            // The race the pre-check can't close: both commits passed the
            // lookup, the loser hits the UNIQUE(request_id) here.
            if err.is_unique_violation_on("sales.request_id") {
                drop(tx);
                if let Some(existing) = self.db.sales().get_by_request_id(&draft.request_id).await? {
                    info!(correlative = %existing.correlative, "Commit race lost, returning winner's sale");
                    return Ok(existing);
                }
            }
            return Err(err.into());
        }

        for item in &draft.items {
            let sale_item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: item.product_id.clone(),
                name_snapshot: item.name.clone(),
                unit_price_centimos: item.unit_price_centimos,
                quantity: item.quantity,
                line_total_centimos: item.line_total_centimos(),
                is_kitchen: item.is_kitchen,
                notes: item.notes.clone(),
            };
            SaleRepository::insert_item_tx(&mut *tx, &sale_item).await?;
        }

        if draft.needs_ar_entry() {
            let entry = ArEntry {
                client_id: draft.client_id.clone(),
                sale_id: sale.id.clone(),
                status: ArStatus::Pending,
                amount_centimos: draft.total_centimos,
                correlative: correlative.clone(),
                client_name: draft.client_name.clone(),
                items_json: serde_json::to_string(&draft.items)?,
                created_at: now,
                collected_at: None,
                collected_by: None,
            };
            ReceivableRepository::insert_entry_tx(&mut *tx, &entry).await?;
            ClientRepository::adjust_debt_tx(&mut *tx, &draft.client_id, draft.total_centimos)
                .await?;
        }

        let audit = maracuya_core::AuditEntry {
            id: Uuid::new_v4().to_string(),
            actor: session.user_id.clone(),
            action: "sale.commit".to_string(),
            entity_type: "sale".to_string(),
            entity_id: sale.id.clone(),
            payload: serde_json::json!({
                "correlative": correlative,
                "total_centimos": draft.total_centimos,
                "payment_method": draft.payment_method,
                "client_id": draft.client_id,
            })
            .to_string(),
            created_at: now,
        };
        AuditRepository::insert_tx(&mut *tx, &audit).await?;

        tx.commit()
            .await
            .map_err(|e| PosError::StorageUnavailable(format!("commit failed: {}", e)))?;

        Ok(sale)
    }

    /// Parks a failed draft. Parking itself can fail when the store is the
    /// problem; that is logged and swallowed, because the original commit
    /// error is what the cashier needs to see.
    async fn park(&self, draft: &SaleDraft, session: &Session, cause: &PosError) {
        let kind = cause.failure_kind();
        let parked = ParkedSale {
            id: Uuid::new_v4().to_string(),
            draft_json: match serde_json::to_string(draft) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Could not serialize draft for parking");
                    return;
                }
            },
            failure_kind: kind,
            last_error: cause.to_string(),
            attempts: 0,
            retry_after: Utc::now() + chrono::Duration::from_std(self.config.retry_backoff)
                .unwrap_or(chrono::Duration::seconds(30)),
            parked_by: session.user_id.clone(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.db.parked_sales().park(&parked).await {
            error!(error = %e, request_id = %draft.request_id, "Could not park failed sale");
        }
    }
}

/// Draft sanity checks at the service boundary. The flow already enforces
/// these; a draft arriving through the recovery path gets them re-checked.
fn validate_draft(draft: &SaleDraft) -> PosResult<()> {
    if draft.items.is_empty() {
        return Err(PosError::Validation(CoreError::NotReadyToCommit {
            state: "empty draft".to_string(),
        }));
    }

    let computed: i64 = draft.items.iter().map(|i| i.line_total_centimos()).sum();
    if computed != draft.total_centimos
        || draft.subtotal_centimos + draft.tax_centimos != draft.total_centimos
    {
        return Err(PosError::Validation(CoreError::NotReadyToCommit {
            state: "inconsistent totals".to_string(),
        }));
    }

    if draft.payment_method.collects_at_sale() {
        if draft.paid_centimos != draft.total_centimos {
            return Err(PosError::Validation(CoreError::NotReadyToCommit {
                state: "paid != total".to_string(),
            }));
        }
    } else if draft.paid_centimos != 0 {
        return Err(PosError::Validation(CoreError::NotReadyToCommit {
            state: "credit sale with payment".to_string(),
        }));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
