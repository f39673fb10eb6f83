//! # maracuya-db: Storage Layer for the Maracuyá POS
//!
//! SQLite persistence for the canteen: connection pool, embedded
//! migrations, and one repository per aggregate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  maracuya-pos service call (Checkout::commit, Collections::collect)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  maracuya-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄──│ sale, client,  │   │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │   │ counter, AR,   │   │ 001_init.sql │   │   │
//! │  │   │  WAL + FK on  │   │ parked, audit  │   │              │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Repository implementations
//!
//! ## Transactions
//! Repositories expose `*_tx` associated functions taking a
//! `&mut SqliteConnection` so the service layer can compose several writes
//! (correlative + sale + items + AR entry + audit) into one transaction.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::audit::AuditRepository;
pub use repository::cash_close::CashCloseRepository;
pub use repository::client::ClientRepository;
pub use repository::counter::CounterRepository;
pub use repository::lunch::{LunchOrderRepository, NewLunchOrder};
pub use repository::parked::ParkedSaleRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;
pub use repository::receivable::ReceivableRepository;
pub use repository::sale::{MethodTotal, SaleRepository};
pub use repository::user::UserRepository;
