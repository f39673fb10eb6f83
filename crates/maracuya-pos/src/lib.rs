//! # maracuya-pos: Service Layer for the Maracuyá Canteen POS
//!
//! Everything the terminal screens call lives here. The crate wires the pure
//! sale logic from `maracuya-core` to the SQLite storage in `maracuya-db`
//! and adds the policies that sit between them: sessions and role gates,
//! the transactional checkout, parked-sale recovery, debt collection, the
//! family lunch portal, and reports.
//!
//! ## Architecture Overview
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Service Layer                            │
//! │                                                                  │
//! │  SessionManager ──► Session (role gate for every other service)  │
//! │                                                                  │
//! │  ┌──────────────┐   commit_or_park   ┌──────────────────────┐    │
//! │  │   Checkout   │◄───────────────────│       Recovery       │    │
//! │  │              │                    │                      │    │
//! │  │ validate     │    retries go      │ list_due / backoff   │    │
//! │  │ one tx:      │    through the     │ retry cap / discard  │    │
//! │  │  correlative │    same commit     └──────────────────────┘    │
//! │  │  sale+items  │                                                │
//! │  │  AR + debt   │    ┌─────────────┐  ┌────────────────────┐     │
//! │  │  audit       │    │ Collections │  │     LunchPortal    │     │
//! │  └──────┬───────┘    │             │  │                    │     │
//! │         │            │ settle AR   │  │ family orders for  │     │
//! │         ▼            │ + debt in   │  │ future days, per-  │     │
//! │  KitchenPrinter      │ one tx      │  │ day kitchen list   │     │
//! │  (after commit)      └─────────────┘  └────────────────────┘     │
//! │                                                                  │
//! │  Reports: period summaries by payment method, chained cash close │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Model
//! Commits either land completely or leave nothing behind. When storage is
//! the problem, the draft is parked and retried with doubling backoff; the
//! draft's `request_id` makes every retry idempotent, so a commit whose
//! response was lost is answered with the sale that already exists.

pub mod admin;
pub mod checkout;
pub mod collections;
pub mod config;
pub mod error;
pub mod lunch;
pub mod print;
pub mod recovery;
pub mod reports;
pub mod session;
pub mod telemetry;

pub use admin::{Admin, ClientInput, ProductInput, PromotionInput};
pub use checkout::Checkout;
pub use collections::Collections;
pub use config::AppConfig;
pub use error::{PosError, PosResult};
pub use lunch::{LunchPortal, LunchRequestItem};
pub use print::{KitchenPrinter, KitchenTicket, KitchenTicketLine, LogPrinter};
pub use recovery::{Recovery, RetryReport};
pub use reports::{Dashboard, PeriodSummary, Reports};
pub use session::{Session, SessionManager};
pub use telemetry::init_tracing;
