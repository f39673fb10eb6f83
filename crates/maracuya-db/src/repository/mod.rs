//! # Repositories
//!
//! One repository per aggregate. Each holds a clone of the pool; methods
//! that must participate in a cross-aggregate transaction are `*_tx`
//! associated functions over a `&mut SqliteConnection`.

pub mod audit;
pub mod cash_close;
pub mod client;
pub mod counter;
pub mod lunch;
pub mod parked;
pub mod product;
pub mod promotion;
pub mod receivable;
pub mod sale;
pub mod user;
