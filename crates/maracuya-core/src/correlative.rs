//! # Correlatives
//!
//! A correlative is the human-readable sequential document number printed on
//! every receipt (`V-000101`). The integer counter behind it lives in
//! storage and is advanced with an atomic increment (see
//! `maracuya-db::repository::counter`); this module owns the categories and
//! the display format, which are pure.
//!
//! ## Guarantees
//! - one independent counter per category
//! - monotonically increasing, never reused
//! - a sale is never committed without one

use serde::{Deserialize, Serialize};
use std::fmt;

/// The independent counter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelativeCategory {
    /// Live point-of-sale sales (`V` for venta).
    Sale,
    /// Backfilled historical sales.
    Historical,
    /// Family-portal lunch orders (`A` for almuerzo).
    Lunch,
}

impl CorrelativeCategory {
    /// Storage key for the counter row.
    pub const fn key(&self) -> &'static str {
        match self {
            CorrelativeCategory::Sale => "sale",
            CorrelativeCategory::Historical => "historical",
            CorrelativeCategory::Lunch => "lunch",
        }
    }

    /// Prefix letter used in the display format.
    pub const fn prefix(&self) -> char {
        match self {
            CorrelativeCategory::Sale => 'V',
            CorrelativeCategory::Historical => 'H',
            CorrelativeCategory::Lunch => 'A',
        }
    }
}

impl fmt::Display for CorrelativeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Formats a counter value as a display correlative.
///
/// ## Example
/// ```rust
/// use maracuya_core::correlative::{format_correlative, CorrelativeCategory};
///
/// assert_eq!(format_correlative(CorrelativeCategory::Sale, 101), "V-000101");
/// ```
pub fn format_correlative(category: CorrelativeCategory, value: i64) -> String {
    format!("{}-{:06}", category.prefix(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_correlative(CorrelativeCategory::Sale, 101), "V-000101");
        assert_eq!(format_correlative(CorrelativeCategory::Historical, 7), "H-000007");
        assert_eq!(format_correlative(CorrelativeCategory::Lunch, 1234567), "A-1234567");
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys = [
            CorrelativeCategory::Sale.key(),
            CorrelativeCategory::Historical.key(),
            CorrelativeCategory::Lunch.key(),
        ];
        assert_eq!(keys.len(), keys.iter().collect::<std::collections::HashSet<_>>().len());
    }
}
