//! # Domain Types
//!
//! Core domain types used throughout the Maracuyá POS.
//!
//! ## Closed Enumerations
//! Payment methods, sale types, sale statuses and failure classes are closed
//! enums validated at the system boundary. A string like `"yape"` either
//! deserializes into [`PaymentMethod::Yape`] or the request is rejected;
//! nothing downstream ever matches on raw strings.
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - a business id where one exists (correlative, client code) -
//!   human-readable, shown on receipts and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// `Credito` is the only method that does not collect money at sale time;
/// it produces an accounts-receivable entry instead.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Efectivo,
    /// Bank transfer.
    Transferencia,
    /// On account; collected later by the Collections module.
    Credito,
    /// Yape mobile wallet.
    Yape,
    /// Plin mobile wallet.
    Plin,
}

impl PaymentMethod {
    /// Whether this method collects money at sale time.
    #[inline]
    pub const fn collects_at_sale(&self) -> bool {
        !matches!(self, PaymentMethod::Credito)
    }
}

// =============================================================================
// Sale Type / Status / Origin
// =============================================================================

/// What kind of sale this is.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    /// Regular over-the-counter sale.
    Normal,
    /// Pre-ordered sale fulfilled later.
    Scheduled,
    /// School lunch order.
    Lunch,
    /// Backfilled sale entered through the historical module.
    Historical,
}

/// The status of a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sale committed and final.
    Completed,
    /// Cancelled by an admin after the fact.
    Void,
    /// Awaiting manual resolution.
    Pending,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

/// Where a sale record came from.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleOrigin {
    /// Committed live at the point of sale.
    #[serde(rename = "pos")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pos"))]
    Pos,
    /// Entered through the historical-sales backfill module.
    #[serde(rename = "historical-import")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "historical-import"))]
    HistoricalImport,
}

// =============================================================================
// Sale + Sale Item
// =============================================================================

/// A committed sale.
///
/// ## Invariants
/// - `total_centimos == Σ items.unit_price × quantity` (frozen at commit)
/// - `subtotal_centimos + tax_centimos == total_centimos` (IGV-inclusive)
/// - `paid_centimos == total_centimos` unless `payment_method == Credito`,
///   in which case `paid_centimos == 0` and exactly one AR entry exists
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Human-readable sequential document number, e.g. `V-000101`.
    pub correlative: String,
    pub sale_date: DateTime<Utc>,
    /// Cashier (user id) who rang the sale up.
    pub cashier_id: String,
    /// Registered or walk-in client; never null after commit.
    pub client_id: String,
    /// Client name frozen at commit time.
    pub client_name: String,
    pub subtotal_centimos: i64,
    pub tax_centimos: i64,
    pub total_centimos: i64,
    /// Amount actually collected at sale time (0 for credit sales).
    pub paid_centimos: i64,
    pub payment_method: PaymentMethod,
    pub sale_type: SaleType,
    pub status: SaleStatus,
    pub origin: SaleOrigin,
    /// Client-generated idempotency key; UNIQUE in storage so a double
    /// confirm can never produce two sales.
    pub request_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_centimos(self.total_centimos)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_centimos(self.paid_centimos)
    }
}

/// A line item of a committed sale.
///
/// Uses the snapshot pattern: name and unit price are copied from the
/// product at cart-add time, so later product edits never rewrite history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in céntimos at time of sale (frozen).
    pub unit_price_centimos: i64,
    pub quantity: i64,
    /// `unit_price × quantity`.
    pub line_total_centimos: i64,
    /// Whether this item needs a kitchen ticket.
    pub is_kitchen: bool,
    pub notes: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    /// Display name shown to the cashier and on receipts.
    pub name: String,
    pub category: Option<String>,
    /// Price in céntimos, IGV inclusive.
    pub price_centimos: i64,
    /// Whether the kitchen must prepare this item.
    pub is_kitchen: bool,
    /// Soft delete flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_centimos(self.price_centimos)
    }
}

// =============================================================================
// Client
// =============================================================================

/// A registered client (student family or staff member).
///
/// Created and edited by the admin module; referenced (never owned) by
/// sales and AR entries via `id`.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    /// Short code families use in the lunch portal (e.g. `C001`).
    pub code: String,
    pub names: String,
    pub last_names: String,
    /// Precomputed `names + last_names` for display and search.
    pub full_name: String,
    /// Whether the client may buy on credit.
    pub has_account: bool,
    pub is_active: bool,
    pub grade: Option<String>,
    pub level: Option<String>,
    /// Running accounts-receivable debt in céntimos.
    pub debt_centimos: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn debt(&self) -> Money {
        Money::from_centimos(self.debt_centimos)
    }

    /// Whether this is the walk-in sentinel client.
    #[inline]
    pub fn is_walk_in(&self) -> bool {
        self.id == crate::WALK_IN_CLIENT_ID
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A date-bounded promotional price for a product.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub product_id: String,
    pub promo_price_centimos: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Promotion {
    /// Whether the promotion applies at the given instant.
    pub fn applies_at(&self, when: DateTime<Utc>) -> bool {
        self.is_active && when >= self.valid_from && when <= self.valid_until
    }
}

// =============================================================================
// Accounts Receivable
// =============================================================================

/// Lifecycle status of an accounts-receivable entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArStatus {
    /// Money is owed.
    Pending,
    /// Collected by the Collections module.
    Collected,
}

/// A record of money owed by a client for a credit sale.
///
/// Keyed by `(client_id, sale_id)`: created exactly once per credit sale
/// at its canonical key, never mirrored anywhere else.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArEntry {
    pub client_id: String,
    pub sale_id: String,
    pub status: ArStatus,
    pub amount_centimos: i64,
    pub correlative: String,
    /// Client name frozen at sale time.
    pub client_name: String,
    /// JSON snapshot of the sale's items at commit time.
    pub items_json: String,
    pub created_at: DateTime<Utc>,
    pub collected_at: Option<DateTime<Utc>>,
    pub collected_by: Option<String>,
}

impl ArEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centimos(self.amount_centimos)
    }
}

// =============================================================================
// Parked (unregistered) Sales
// =============================================================================

/// Why a sale commit failed.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Storage unreachable or timed out.
    Network,
    /// Correlative allocation failed.
    Correlative,
    /// Draft failed validation; not retryable.
    Validation,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Whether a parked sale with this classification may be retried.
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::Validation)
    }
}

/// A sale that failed to commit and was parked for later retry.
///
/// The full draft is kept as JSON so the retry path can re-run the commit
/// with a fresh correlative.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkedSale {
    pub id: String,
    /// JSON-serialized [`crate::flow::SaleDraft`].
    pub draft_json: String,
    pub failure_kind: FailureKind,
    pub last_error: String,
    /// Retry attempts so far; capped by the recovery module.
    pub attempts: i64,
    /// Earliest instant the next retry is allowed (exponential backoff).
    pub retry_after: DateTime<Utc>,
    pub parked_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// One audit-log row: who did what to which entity.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    /// User id of the actor.
    pub actor: String,
    /// Action kind, e.g. `sale.commit`, `ar.collect`, `product.update`.
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    /// JSON payload with action-specific details.
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Lunch Orders (family portal)
// =============================================================================

/// Status of a family lunch order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunchOrderStatus {
    Ordered,
    Delivered,
    Cancelled,
}

/// A lunch order placed through the family portal.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunchOrder {
    pub id: String,
    pub correlative: String,
    pub client_id: String,
    /// Client code, the key families log in with.
    pub client_code: String,
    pub client_name: String,
    /// Day the lunch is for (date at UTC midnight).
    pub serve_date: DateTime<Utc>,
    /// JSON snapshot of the ordered items (same shape as cart items).
    pub items_json: String,
    pub total_centimos: i64,
    pub status: LunchOrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Close
// =============================================================================

/// A persisted cash-close reconciliation.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashClose {
    pub id: String,
    pub closed_by: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Cash the register should contain per committed sales.
    pub expected_cash_centimos: i64,
    /// Cash actually counted in the drawer.
    pub counted_cash_centimos: i64,
    /// `counted - expected`; negative means missing money.
    pub difference_centimos: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Role gates which modules a session may use.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access: products, clients, promotions, cash close, voids.
    Admin,
    /// Point of sale, collections, historical entry.
    Cashier,
    /// Lunch portal only.
    Family,
}

/// A system user who can log in with a PIN.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Short login code typed before the PIN (e.g. `caja1`).
    pub code: String,
    pub name: String,
    /// bcrypt hash of the PIN; never the PIN itself.
    pub pin_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
