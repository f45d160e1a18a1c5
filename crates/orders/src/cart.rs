use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Money, ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
    /// Shipping weight of one unit, in grams.
    #[serde(default)]
    pub unit_weight_g: u32,
}

impl CartLine {
    pub fn line_total(&self) -> DomainResult<Money> {
        if self.quantity == 0 {
            return Err(DomainError::validation(format!(
                "quantity for product {} must be at least 1",
                self.product_id
            )));
        }
        self.unit_price.checked_mul(u64::from(self.quantity))
    }

    pub fn weight_g(&self) -> u64 {
        u64::from(self.unit_weight_g) * u64::from(self.quantity)
    }
}

/// Sum of `unit_price * quantity` over all lines. An empty cart is zero.
pub fn cart_subtotal(lines: &[CartLine]) -> DomainResult<Money> {
    lines
        .iter()
        .try_fold(Money::ZERO, |acc, line| acc.checked_add(line.line_total()?))
}

/// Discount from an applied coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    PercentOff { percent: u8 },
    AmountOff { amount: Money },
    FreeShipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Combine subtotal, discount and a shipping price into totals.
///
/// Percent discounts are capped at 100%; amount discounts at the subtotal.
/// Free shipping zeroes the shipping price.
pub fn compute_totals(
    lines: &[CartLine],
    discount: Option<Discount>,
    shipping_price: Money,
) -> DomainResult<CartTotals> {
    let subtotal = cart_subtotal(lines)?;

    let (discount_amount, shipping) = match discount {
        None => (Money::ZERO, shipping_price),
        Some(Discount::PercentOff { percent }) => (subtotal.percent(percent), shipping_price),
        Some(Discount::AmountOff { amount }) => (amount.min(subtotal), shipping_price),
        Some(Discount::FreeShipping) => (Money::ZERO, Money::ZERO),
    };

    let total = subtotal.checked_sub(discount_amount)?.checked_add(shipping)?;
    Ok(CartTotals {
        subtotal,
        discount: discount_amount,
        shipping,
        total,
    })
}
