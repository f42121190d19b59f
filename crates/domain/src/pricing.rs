//! Checkout pricing.
//!
//! All arithmetic is in integer minor units.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::order::OrderLine;

/// Tax charged on the items subtotal.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Shipping is free when the items subtotal is strictly above this amount.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_dollars(100);

/// Flat shipping charge below the threshold.
pub const FLAT_SHIPPING: Money = Money::from_dollars(10);

/// Pricing breakdown recorded on every order.
///
/// `total_price == items_price + tax_price + shipping_price` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    #[serde(rename = "items_price_cents")]
    pub items_price: Money,
    #[serde(rename = "tax_price_cents")]
    pub tax_price: Money,
    #[serde(rename = "shipping_price_cents")]
    pub shipping_price: Money,
    #[serde(rename = "total_price_cents")]
    pub total_price: Money,
}

impl PriceBreakdown {
    pub fn for_items_price(items_price: Money) -> Self {
        let tax_price = items_price.percent(TAX_RATE_PERCENT);
        let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
            Money::zero()
        } else {
            FLAT_SHIPPING
        };
        Self {
            items_price,
            tax_price,
            shipping_price,
            total_price: items_price + tax_price + shipping_price,
        }
    }

    pub fn for_lines(lines: &[OrderLine]) -> Self {
        Self::for_items_price(lines.iter().map(OrderLine::line_total).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn line(price_cents: i64, quantity: u32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(),
            name: "Item".to_string(),
            quantity,
            unit_price: Money::from_cents(price_cents),
        }
    }

    #[test]
    fn test_at_threshold_pays_shipping() {
        let pricing = PriceBreakdown::for_lines(&[line(5000, 2)]);
        assert_eq!(pricing.items_price, Money::from_dollars(100));
        assert_eq!(pricing.tax_price, Money::from_dollars(10));
        assert_eq!(pricing.shipping_price, Money::from_dollars(10));
        assert_eq!(pricing.total_price, Money::from_dollars(120));
    }

    #[test]
    fn test_above_threshold_ships_free() {
        let pricing = PriceBreakdown::for_lines(&[line(6000, 2)]);
        assert_eq!(pricing.items_price, Money::from_dollars(120));
        assert_eq!(pricing.tax_price, Money::from_dollars(12));
        assert_eq!(pricing.shipping_price, Money::zero());
        assert_eq!(pricing.total_price, Money::from_dollars(132));
    }

    #[test]
    fn test_total_is_exact_sum_with_odd_cents() {
        let pricing = PriceBreakdown::for_lines(&[line(1999, 3), line(2499, 1)]);
        assert_eq!(pricing.items_price.cents(), 8496);
        assert_eq!(pricing.tax_price.cents(), 850);
        assert_eq!(
            pricing.total_price,
            pricing.items_price + pricing.tax_price + pricing.shipping_price
        );
    }
}
