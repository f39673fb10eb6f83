//! # Cart
//!
//! The in-memory cart that backs the sale flow.
//!
//! ## Price Freezing
//! A cart item copies the product's name and unit price at add time. Later
//! product edits in the admin module never retroactively change an open
//! cart, and the total a cashier confirmed is the total that gets committed.
//!
//! ## Eager Totals
//! Totals are plain sums over the items, recomputed on every read. There is
//! no cached total to go stale between a cart mutation and the confirmation
//! step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;
use crate::{IGV_BPS, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Price in céntimos at time of adding (frozen).
    pub unit_price_centimos: i64,

    pub quantity: i64,

    /// Whether the kitchen must prepare this item.
    pub is_kitchen: bool,

    /// Free-text note for the kitchen ("sin ají").
    pub notes: Option<String>,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart item from a product, freezing name and price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_centimos: product.price_centimos,
            quantity,
            is_kitchen: product.is_kitchen,
            notes: None,
            added_at: Utc::now(),
        }
    }

    /// Line total (`unit price × quantity`).
    pub fn line_total_centimos(&self) -> i64 {
        self.unit_price_centimos * self.quantity
    }
}

/// The cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product again
///   increases its quantity)
/// - Quantity is always > 0 (setting it to 0 removes the item)
/// - At most [`MAX_CART_ITEMS`] distinct items, [`MAX_ITEM_QUANTITY`] each
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a product or increases its quantity if already present.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<(), crate::CoreError> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(crate::CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(crate::CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of an item; 0 removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), crate::CoreError> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        crate::validation::validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(crate::CoreError::ItemNotInCart(product_id.to_string())),
        }
    }

    /// Attaches a kitchen note to an item.
    pub fn set_notes(&mut self, product_id: &str, notes: Option<String>) -> Result<(), crate::CoreError> {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.notes = notes;
                Ok(())
            }
            None => Err(crate::CoreError::ItemNotInCart(product_id.to_string())),
        }
    }

    /// Removes an item by product id.
    pub fn remove_item(&mut self, product_id: &str) -> Result<(), crate::CoreError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == before {
            Err(crate::CoreError::ItemNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Grand total: `Σ unit price × quantity`. Prices are IGV-inclusive.
    pub fn total_centimos(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_centimos()).sum()
    }

    /// IGV portion included in the total.
    pub fn tax_centimos(&self) -> i64 {
        Money::from_centimos(self.total_centimos()).included_tax(IGV_BPS).centimos()
    }

    /// Total minus the included IGV.
    pub fn subtotal_centimos(&self) -> i64 {
        self.total_centimos() - self.tax_centimos()
    }

    /// Whether any item needs a kitchen ticket.
    pub fn has_kitchen_items(&self) -> bool {
        self.items.iter().any(|i| i.is_kitchen)
    }
}
