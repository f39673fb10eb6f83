//! # maracuya-core: Pure Business Logic for the Maracuyá POS
//!
//! This crate is the **heart** of the Maracuyá Villa Gratia point-of-sale.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Maracuyá POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 maracuya-pos (Service Layer)                    │   │
//! │  │   checkout, sessions, collections, recovery, lunch portal       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ maracuya-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │   flow    │  │   │
//! │  │   │  Sale     │  │   Money   │  │   Cart    │  │ SaleFlow  │  │   │
//! │  │   │  Client   │  │  IGV calc │  │ CartItem  │  │  states   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 maracuya-db (Storage Layer)                     │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Client, Product, AR entries, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart with frozen price snapshots and eager totals
//! - [`flow`] - The sale-flow state machine (products → client → payment →
//!   confirmation → complete)
//! - [`correlative`] - Correlative (receipt number) categories and formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod correlative;
pub mod error;
pub mod flow;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use correlative::CorrelativeCategory;
pub use error::{CoreError, ValidationError};
pub use flow::{ClientPolicy, ClientRef, FlowState, SaleDraft, SaleFlow};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sentinel client id used when no specific customer is identified.
///
/// The walk-in client ("Cliente Varios") is seeded at migration time with
/// this fixed id so every terminal agrees on it. It can never carry credit.
pub const WALK_IN_CLIENT_ID: &str = "cliente-varios";

/// Display name of the walk-in client.
pub const WALK_IN_CLIENT_NAME: &str = "Cliente Varios";

/// IGV (Peruvian VAT) in basis points. Prices are IGV-inclusive; the tax
/// field on a sale is the extracted portion, so `subtotal + tax == total`.
pub const IGV_BPS: u32 = 1800;

/// Maximum items allowed in a single cart.
///
/// Prevents runaway carts; a canteen ticket never legitimately has more.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// Prevents accidental over-ordering (typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 99;
