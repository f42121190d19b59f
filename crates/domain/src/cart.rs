//! Per-user shopping carts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::product::Product;

/// A live cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's cart: entries are unique per product and quantities are at least 1.
///
/// `total` is derived from live catalog prices by [`Cart::reprice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    #[serde(rename = "total_cents")]
    pub total: Money,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Merges `quantity` into the entry for `product_id`, appending it if absent.
    ///
    /// Returns the resulting quantity for that product.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<u32, DomainError> {
        if quantity == 0 {
            return Err(DomainError::invalid("quantity", "must be at least 1"));
        }
        self.updated_at = Utc::now();
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(quantity);
                Ok(item.quantity)
            }
            None => {
                self.items.push(CartItem {
                    product_id,
                    quantity,
                });
                Ok(quantity)
            }
        }
    }

    /// Sets the quantity of an existing entry, removing it when `quantity <= 0`.
    ///
    /// Returns `Ok(false)` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<bool, DomainError> {
        let Some(index) = self.items.iter().position(|i| i.product_id == product_id) else {
            return Ok(false);
        };
        if quantity <= 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = u32::try_from(quantity)
                .map_err(|_| DomainError::invalid("quantity", "is too large"))?;
        }
        self.updated_at = Utc::now();
        Ok(true)
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|i| i.product_id != product_id);
        self.updated_at = Utc::now();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Money::zero();
        self.updated_at = Utc::now();
    }

    /// Recomputes `total` from live prices and returns the joined view.
    ///
    /// Entries whose product no longer exists in `products` are pruned.
    pub fn reprice(&mut self, products: &HashMap<ProductId, Product>) -> CartView {
        self.items.retain(|i| products.contains_key(&i.product_id));

        let lines: Vec<CartLine> = self
            .items
            .iter()
            .filter_map(|item| {
                products
                    .get(&item.product_id)
                    .map(|p| CartLine::new(p, item.quantity))
            })
            .collect();

        self.total = lines.iter().map(|l| l.line_total).sum();

        CartView {
            user_id: self.user_id,
            items: lines,
            total: self.total,
        }
    }
}

/// A cart entry joined with its live product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,
    pub stock: u32,
    pub quantity: u32,
    #[serde(rename = "line_total_cents")]
    pub line_total: Money,
}

impl CartLine {
    fn new(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            stock: product.stock,
            quantity,
            line_total: product.price.multiply(quantity),
        }
    }
}

/// The cart as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    #[serde(rename = "total_cents")]
    pub total: Money,
}
