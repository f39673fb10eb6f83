//! # Sale Flow State Machine
//!
//! The wizard every sale walks through, as a pure state machine.
//!
//! ## States and Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Flow                                        │
//! │                                                                         │
//! │              advance                advance               advance       │
//! │  ┌──────────┐ (cart  ┌──────────┐ (client  ┌──────────┐ (method ┌────┐ │
//! │  │ Products │──────► │  Client  │────────► │ Payment  │───────► │Conf│ │
//! │  └──────────┘ non-   └──────────┘ selected └──────────┘ chosen  └─┬──┘ │
//! │     ▲  ▲      empty)      │                     │                 │    │
//! │     │  │ cancel:          │ cancel              │ cancel          │    │
//! │     │  │ clear cart ◄─────┘◄────────────────────┘◄────────────────┘    │
//! │     │  │                                                               │
//! │     │  │                              commit OK (service layer)        │
//! │     │  └───────────────────────────┐       │                           │
//! │     │            reset             │       ▼                           │
//! │     └──────────────────────────────┴── ┌──────────┐                    │
//! │                                        │ Complete │                    │
//! │                                        └──────────┘                    │
//! │                                                                         │
//! │  Guards: Payment is unreachable without a non-empty cart AND a         │
//! │  selected client; Confirmation additionally needs a payment method.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Client Policies
//! The POS module auto-assigns the walk-in client ("Cliente Varios") when
//! the cashier advances without selecting anyone; the historical-sales
//! module refuses to advance instead, because its credit-only entries need a
//! registered client. Both behaviors are deliberate business policy, kept as
//! two explicitly named [`ClientPolicy`] variants rather than unified.
//!
//! ## Commit Boundary
//! This crate does no I/O. At `Confirmation` the caller takes a
//! [`SaleDraft`] snapshot (`draft()`), runs the commit through the service
//! layer, and on success calls `complete()`. A failed commit leaves the flow
//! sitting at `Confirmation` with the same idempotency key, so a retry can
//! never double-commit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::error::{CoreError, CoreResult};
use crate::types::{Client, PaymentMethod, SaleOrigin, SaleType};
use crate::{WALK_IN_CLIENT_ID, WALK_IN_CLIENT_NAME};

// =============================================================================
// Flow State
// =============================================================================

/// The linear steps of the sale wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowState {
    Products,
    Client,
    Payment,
    Confirmation,
    Complete,
}

impl FlowState {
    fn name(&self) -> &'static str {
        match self {
            FlowState::Products => "products",
            FlowState::Client => "client",
            FlowState::Payment => "payment",
            FlowState::Confirmation => "confirmation",
            FlowState::Complete => "complete",
        }
    }
}

// =============================================================================
// Client Selection
// =============================================================================

/// What to do when the cashier advances past client selection without
/// picking anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientPolicy {
    /// POS behavior: auto-assign the walk-in client.
    WalkInAllowed,
    /// Historical-sales behavior: stay put until a registered client is
    /// selected.
    RegisteredOnly,
}

/// Lightweight reference to the selected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
    /// Whether the client may buy on credit.
    pub has_account: bool,
}

impl ClientRef {
    /// The walk-in sentinel ("Cliente Varios"). Never carries credit.
    pub fn walk_in() -> Self {
        ClientRef {
            id: WALK_IN_CLIENT_ID.to_string(),
            name: WALK_IN_CLIENT_NAME.to_string(),
            has_account: false,
        }
    }

    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_CLIENT_ID
    }
}

impl From<&Client> for ClientRef {
    fn from(c: &Client) -> Self {
        ClientRef {
            id: c.id.clone(),
            name: c.full_name.clone(),
            has_account: c.has_account,
        }
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// Immutable snapshot of everything the commit operation needs.
///
/// Taken at `Confirmation`; totals are computed here, from the frozen cart
/// prices, and nothing downstream recomputes them. Serializable so a failed
/// commit can park the whole draft for the recovery module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    /// Idempotency key, generated when the flow reaches `Confirmation` and
    /// stable across commit retries of the same confirmation.
    pub request_id: String,
    pub sale_type: SaleType,
    pub origin: SaleOrigin,
    pub payment_method: PaymentMethod,
    pub client_id: String,
    pub client_name: String,
    pub items: Vec<CartItem>,
    pub subtotal_centimos: i64,
    pub tax_centimos: i64,
    pub total_centimos: i64,
    /// `total` for methods that collect at sale time, 0 for credito.
    pub paid_centimos: i64,
}

impl SaleDraft {
    /// Whether this draft must produce an accounts-receivable entry.
    pub fn needs_ar_entry(&self) -> bool {
        self.payment_method == PaymentMethod::Credito
    }

    /// Whether any item needs a kitchen ticket.
    pub fn has_kitchen_items(&self) -> bool {
        self.items.iter().any(|i| i.is_kitchen)
    }
}

// =============================================================================
// Sale Flow
// =============================================================================

/// The sale wizard: cart, client selection, payment method, and the state
/// pointer, advanced by `advance()`/`cancel()` signals.
#[derive(Debug, Clone)]
pub struct SaleFlow {
    state: FlowState,
    policy: ClientPolicy,
    sale_type: SaleType,
    origin: SaleOrigin,
    cart: Cart,
    client: Option<ClientRef>,
    payment: Option<PaymentMethod>,
    /// Set on entering `Confirmation`, cleared on reset/complete.
    request_id: Option<String>,
}

impl SaleFlow {
    /// A flow configured for the live POS screen.
    pub fn pos() -> Self {
        SaleFlow::new(ClientPolicy::WalkInAllowed, SaleType::Normal, SaleOrigin::Pos)
    }

    /// A flow configured for historical backfill entry.
    pub fn historical() -> Self {
        SaleFlow::new(
            ClientPolicy::RegisteredOnly,
            SaleType::Historical,
            SaleOrigin::HistoricalImport,
        )
    }

    pub fn new(policy: ClientPolicy, sale_type: SaleType, origin: SaleOrigin) -> Self {
        SaleFlow {
            state: FlowState::Products,
            policy,
            sale_type,
            origin,
            cart: Cart::new(),
            client: None,
            payment: None,
            request_id: None,
        }
    }

    #[inline]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[inline]
    pub fn policy(&self) -> ClientPolicy {
        self.policy
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Mutable cart access. Totals are derived sums, so any mutation is
    /// immediately reflected in `draft()` - there is no stale-total window.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn selected_client(&self) -> Option<&ClientRef> {
        self.client.as_ref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment
    }

    /// Selects a client (valid at the `Client` step or earlier).
    pub fn select_client(&mut self, client: ClientRef) {
        self.client = Some(client);
    }

    pub fn clear_client(&mut self) {
        self.client = None;
    }

    /// Chooses the payment method (valid at the `Payment` step or earlier).
    pub fn choose_payment(&mut self, method: PaymentMethod) {
        self.payment = Some(method);
    }

    /// The "advance" signal (Enter key / next button).
    ///
    /// Guarded per step; an unmet guard is a no-op, not an error, matching
    /// how the wizard ignores Enter on an empty cart.
    pub fn advance(&mut self) -> FlowState {
        self.state = match self.state {
            FlowState::Products => {
                if self.cart.is_empty() {
                    FlowState::Products
                } else {
                    FlowState::Client
                }
            }
            FlowState::Client => {
                if self.client.is_none() {
                    match self.policy {
                        ClientPolicy::WalkInAllowed => {
                            self.client = Some(ClientRef::walk_in());
                            self.enter_payment()
                        }
                        ClientPolicy::RegisteredOnly => FlowState::Client,
                    }
                } else {
                    self.enter_payment()
                }
            }
            FlowState::Payment => {
                if self.payment.is_none() {
                    FlowState::Payment
                } else {
                    // Confirmation gets a fresh idempotency key exactly once
                    self.request_id = Some(Uuid::new_v4().to_string());
                    FlowState::Confirmation
                }
            }
            // Commit is the service layer's job; see `complete()`
            FlowState::Confirmation => FlowState::Confirmation,
            FlowState::Complete => {
                self.reset();
                FlowState::Products
            }
        };
        self.state
    }

    fn enter_payment(&mut self) -> FlowState {
        FlowState::Payment
    }

    /// The "cancel" signal (Escape / back button): one step backward.
    /// At `Products` it clears the cart instead.
    pub fn cancel(&mut self) -> FlowState {
        self.state = match self.state {
            FlowState::Products => {
                self.cart.clear();
                FlowState::Products
            }
            FlowState::Client => FlowState::Products,
            FlowState::Payment => FlowState::Client,
            FlowState::Confirmation => {
                // The key belongs to the abandoned confirmation
                self.request_id = None;
                FlowState::Payment
            }
            FlowState::Complete => {
                self.reset();
                FlowState::Products
            }
        };
        self.state
    }

    /// Full cancel: clears everything and returns to `Products`.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.client = None;
        self.payment = None;
        self.request_id = None;
        self.state = FlowState::Products;
    }

    /// Marks the commit as done. Only meaningful at `Confirmation`.
    pub fn complete(&mut self) -> FlowState {
        if self.state == FlowState::Confirmation {
            self.state = FlowState::Complete;
        }
        self.state
    }

    /// Snapshots the draft the commit operation will persist.
    ///
    /// Fails unless the flow is at `Confirmation` with a coherent selection;
    /// the credit rule (registered client with an account) is enforced here
    /// so no credit draft without a collectible debtor ever reaches storage.
    pub fn draft(&self) -> CoreResult<SaleDraft> {
        if self.state != FlowState::Confirmation {
            return Err(CoreError::NotReadyToCommit { state: self.state.name().to_string() });
        }

        // The guards make these unreachable, but a draft with holes in it
        // must never be committable.
        let client = self.client.as_ref().ok_or(CoreError::NotReadyToCommit {
            state: self.state.name().to_string(),
        })?;
        let payment = self.payment.ok_or(CoreError::NotReadyToCommit {
            state: self.state.name().to_string(),
        })?;
        let request_id = self.request_id.clone().ok_or(CoreError::NotReadyToCommit {
            state: self.state.name().to_string(),
        })?;

        if payment == PaymentMethod::Credito && (!client.has_account || client.is_walk_in()) {
            return Err(CoreError::CreditRequiresAccount { client: client.name.clone() });
        }

        let total = self.cart.total_centimos();
        let tax = self.cart.tax_centimos();
        let paid = if payment.collects_at_sale() { total } else { 0 };

        Ok(SaleDraft {
            request_id,
            sale_type: self.sale_type,
            origin: self.origin,
            payment_method: payment,
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            items: self.cart.items.clone(),
            subtotal_centimos: total - tax,
            tax_centimos: tax,
            total_centimos: total,
            paid_centimos: paid,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use chrono::Utc;

    fn product(id: &str, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Producto {}", id),
            category: None,
            price_centimos: price,
            is_kitchen: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn registered_client() -> ClientRef {
        ClientRef { id: "C001".into(), name: "Ana Quispe".into(), has_account: true }
    }

    #[test]
    fn test_advance_blocked_on_empty_cart() {
        let mut flow = SaleFlow::pos();
        assert_eq!(flow.advance(), FlowState::Products);
    }

    #[test]
    fn test_pos_walk_in_auto_assigned() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 2).unwrap();

        assert_eq!(flow.advance(), FlowState::Client);
        // No client selected: POS policy assigns Cliente Varios
        assert_eq!(flow.advance(), FlowState::Payment);
        assert!(flow.selected_client().unwrap().is_walk_in());
    }

    #[test]
    fn test_historical_requires_registered_client() {
        let mut flow = SaleFlow::historical();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();

        assert_eq!(flow.advance(), FlowState::Client);
        // RegisteredOnly policy: advancing without a selection is a no-op
        assert_eq!(flow.advance(), FlowState::Client);

        flow.select_client(registered_client());
        assert_eq!(flow.advance(), FlowState::Payment);
    }

    #[test]
    fn test_payment_blocked_without_method() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance();
        flow.advance();

        assert_eq!(flow.advance(), FlowState::Payment);

        flow.choose_payment(PaymentMethod::Efectivo);
        assert_eq!(flow.advance(), FlowState::Confirmation);
    }

    #[test]
    fn test_payment_unreachable_without_cart_and_client() {
        // Property: no advance/cancel sequence reaches Payment without a
        // non-empty cart and a selected client.
        let mut flow = SaleFlow::historical();
        for _ in 0..10 {
            flow.advance();
            assert_ne!(flow.state(), FlowState::Payment);
            assert_ne!(flow.state(), FlowState::Confirmation);
        }

        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance(); // -> Client
        for _ in 0..10 {
            flow.advance();
            assert_ne!(flow.state(), FlowState::Payment);
        }
        assert!(flow.selected_client().is_none());
    }

    #[test]
    fn test_cancel_steps_backward() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance();
        flow.select_client(registered_client());
        flow.advance();
        flow.choose_payment(PaymentMethod::Yape);
        flow.advance();
        assert_eq!(flow.state(), FlowState::Confirmation);

        assert_eq!(flow.cancel(), FlowState::Payment);
        assert_eq!(flow.cancel(), FlowState::Client);
        assert_eq!(flow.cancel(), FlowState::Products);

        // At Products, cancel clears the cart
        assert!(!flow.cart().is_empty());
        flow.cancel();
        assert!(flow.cart().is_empty());
    }

    #[test]
    fn test_draft_only_at_confirmation() {
        let mut flow = SaleFlow::pos();
        assert!(flow.draft().is_err());

        flow.cart_mut().add_item(&product("p1", 300), 2).unwrap();
        flow.advance();
        flow.advance();
        flow.choose_payment(PaymentMethod::Efectivo);
        flow.advance();

        let draft = flow.draft().unwrap();
        assert_eq!(draft.total_centimos, 600);
        assert_eq!(draft.paid_centimos, 600);
        assert_eq!(draft.subtotal_centimos + draft.tax_centimos, 600);
        assert!(!draft.needs_ar_entry());
        assert_eq!(draft.client_id, WALK_IN_CLIENT_ID);
    }

    #[test]
    fn test_credit_draft_pays_zero() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 2).unwrap();
        flow.advance();
        flow.select_client(registered_client());
        flow.advance();
        flow.choose_payment(PaymentMethod::Credito);
        flow.advance();

        let draft = flow.draft().unwrap();
        assert_eq!(draft.paid_centimos, 0);
        assert_eq!(draft.total_centimos, 600);
        assert!(draft.needs_ar_entry());
    }

    #[test]
    fn test_credit_rejected_for_walk_in() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance();
        flow.advance(); // walk-in assigned
        flow.choose_payment(PaymentMethod::Credito);
        flow.advance();

        assert!(matches!(flow.draft(), Err(CoreError::CreditRequiresAccount { .. })));
    }

    #[test]
    fn test_request_id_stable_across_retry() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance();
        flow.advance();
        flow.choose_payment(PaymentMethod::Efectivo);
        flow.advance();

        // Two drafts of the same confirmation share the key; a failed
        // commit retried from Confirmation cannot double-insert.
        let a = flow.draft().unwrap();
        let b = flow.draft().unwrap();
        assert_eq!(a.request_id, b.request_id);

        // Backing out and re-confirming is a new intent: new key
        flow.cancel();
        flow.advance();
        let c = flow.draft().unwrap();
        assert_ne!(a.request_id, c.request_id);
    }

    #[test]
    fn test_complete_and_reset() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.advance();
        flow.advance();
        flow.choose_payment(PaymentMethod::Plin);
        flow.advance();

        assert_eq!(flow.complete(), FlowState::Complete);
        assert_eq!(flow.advance(), FlowState::Products);
        assert!(flow.cart().is_empty());
        assert!(flow.selected_client().is_none());
        assert!(flow.payment_method().is_none());
    }

    #[test]
    fn test_total_reflects_cart_mutations_immediately() {
        let mut flow = SaleFlow::pos();
        flow.cart_mut().add_item(&product("p1", 300), 1).unwrap();
        flow.cart_mut().add_item(&product("p2", 450), 2).unwrap();
        flow.advance();
        flow.advance();
        flow.choose_payment(PaymentMethod::Efectivo);
        flow.advance();

        assert_eq!(flow.draft().unwrap().total_centimos, 1200);

        // Mutation after confirmation was reached (cashier backs out,
        // edits, re-confirms): totals never lag
        flow.cancel();
        flow.cancel();
        flow.cancel();
        flow.cart_mut().update_quantity("p2", 1).unwrap();
        flow.advance();
        flow.advance();
        flow.advance();
        assert_eq!(flow.draft().unwrap().total_centimos, 750);
    }
}
