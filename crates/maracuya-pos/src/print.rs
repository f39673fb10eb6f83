//! # Kitchen Printing
//!
//! The checkout module hands kitchen tickets to a [`KitchenPrinter`] after
//! the transaction commits. Printing is fire-and-forget: a printer jam must
//! never roll back a committed sale, so the trait returns nothing and
//! implementations log their own failures.

use chrono::{DateTime, Utc};
use tracing::info;

use maracuya_core::SaleDraft;

/// A ticket for the kitchen: only the items that need preparation.
#[derive(Debug, Clone)]
pub struct KitchenTicket {
    pub correlative: String,
    pub client_name: String,
    pub items: Vec<KitchenTicketLine>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct KitchenTicketLine {
    pub name: String,
    pub quantity: i64,
    pub notes: Option<String>,
}

impl KitchenTicket {
    /// Builds a ticket from a committed draft, keeping kitchen items only.
    /// Returns `None` when nothing needs preparation.
    pub fn from_draft(correlative: &str, draft: &SaleDraft) -> Option<Self> {
        let items: Vec<KitchenTicketLine> = draft
            .items
            .iter()
            .filter(|i| i.is_kitchen)
            .map(|i| KitchenTicketLine {
                name: i.name.clone(),
                quantity: i.quantity,
                notes: i.notes.clone(),
            })
            .collect();

        if items.is_empty() {
            return None;
        }

        Some(KitchenTicket {
            correlative: correlative.to_string(),
            client_name: draft.client_name.clone(),
            items,
            created_at: Utc::now(),
        })
    }
}

/// Seam for the physical printer. Implementations must be infallible from
/// the caller's point of view.
pub trait KitchenPrinter: Send + Sync {
    fn print(&self, ticket: &KitchenTicket);
}

/// Default printer: writes the ticket to the log. Production installs swap
/// in an ESC/POS implementation behind the same trait.
#[derive(Debug, Default)]
pub struct LogPrinter;

impl KitchenPrinter for LogPrinter {
    fn print(&self, ticket: &KitchenTicket) {
        let lines: Vec<String> = ticket
            .items
            .iter()
            .map(|l| match &l.notes {
                Some(notes) => format!("{}x {} ({})", l.quantity, l.name, notes),
                None => format!("{}x {}", l.quantity, l.name),
            })
            .collect();

        info!(
            correlative = %ticket.correlative,
            client = %ticket.client_name,
            items = %lines.join(", "),
            "Kitchen ticket"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maracuya_core::cart::CartItem;
    use maracuya_core::{PaymentMethod, SaleDraft, SaleOrigin, SaleType};

    fn draft_with_items(items: Vec<CartItem>) -> SaleDraft {
        let total: i64 = items.iter().map(|i| i.line_total_centimos()).sum();
        SaleDraft {
            request_id: "req-1".to_string(),
            sale_type: SaleType::Normal,
            origin: SaleOrigin::Pos,
            payment_method: PaymentMethod::Efectivo,
            client_id: "c1".to_string(),
            client_name: "Ana Quispe".to_string(),
            items,
            subtotal_centimos: total,
            tax_centimos: 0,
            total_centimos: total,
            paid_centimos: total,
        }
    }

    fn item(name: &str, is_kitchen: bool) -> CartItem {
        CartItem {
            product_id: name.to_string(),
            name: name.to_string(),
            unit_price_centimos: 300,
            quantity: 1,
            is_kitchen,
            notes: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_ticket_keeps_only_kitchen_items() {
        let draft = draft_with_items(vec![item("Menú del día", true), item("Agua mineral", false)]);

        let ticket = KitchenTicket::from_draft("V-000101", &draft).unwrap();
        assert_eq!(ticket.items.len(), 1);
        assert_eq!(ticket.items[0].name, "Menú del día");
        assert_eq!(ticket.correlative, "V-000101");
    }

    #[test]
    fn test_no_ticket_without_kitchen_items() {
        let draft = draft_with_items(vec![item("Agua mineral", false)]);
        assert!(KitchenTicket::from_draft("V-000101", &draft).is_none());
    }
}
