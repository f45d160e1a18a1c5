//! Checkout and order fulfilment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, Money, OrderId, TenantId, UserId, VendorId};
use bazaar_loyalty::CouponKind;
use bazaar_orders::{
    CartLine, CartTotals, Discount, Order, OrderStatus, ShippingRate, ShippingRequest, compute_totals,
    default_rates, select_rate,
};

use crate::error::StoreError;
use crate::loyalty::LoyaltyService;
use crate::read_model::{InMemoryTenantStore, TenantStore};
use crate::vendors::VendorService;

#[derive(Debug, Clone, Deserialize)]
pub struct Checkout {
    pub lines: Vec<CartLine>,
    pub region: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub shipping_method: String,
    pub totals: CartTotals,
    pub coupon_code: Option<String>,
}

fn discount_for(kind: CouponKind) -> Discount {
    match kind {
        CouponKind::PercentOff { percent } => Discount::PercentOff { percent },
        CouponKind::AmountOff { amount } => Discount::AmountOff { amount },
        CouponKind::FreeShipping => Discount::FreeShipping,
    }
}

pub struct OrderService {
    orders: Arc<dyn TenantStore<OrderId, Order>>,
    loyalty: Arc<LoyaltyService>,
    vendors: Arc<VendorService>,
    rates: Vec<ShippingRate>,
}

impl OrderService {
    pub fn new(loyalty: Arc<LoyaltyService>, vendors: Arc<VendorService>) -> Self {
        Self {
            orders: Arc::new(InMemoryTenantStore::new()),
            loyalty,
            vendors,
            rates: default_rates(),
        }
    }

    pub fn with_store(mut self, orders: Arc<dyn TenantStore<OrderId, Order>>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_rates(mut self, rates: Vec<ShippingRate>) -> Self {
        self.rates = rates;
        self
    }

    /// Price a cart without placing it or touching the coupon.
    pub fn quote(&self, tenant_id: TenantId, buyer_id: UserId, checkout: &Checkout, now: DateTime<Utc>) -> Result<Quote, StoreError> {
        let subtotal = bazaar_orders::cart_subtotal(&checkout.lines)?;
        let weight_g = checkout.lines.iter().map(CartLine::weight_g).sum();
        let (rate, shipping_price) = select_rate(
            &self.rates,
            &ShippingRequest {
                region: &checkout.region,
                weight_g,
                subtotal,
            },
        )?;

        let discount = match checkout.coupon_code.as_deref() {
            Some(code) => Some(discount_for(self.loyalty.usable_coupon(tenant_id, buyer_id, code, now)?.kind)),
            None => None,
        };

        Ok(Quote {
            shipping_method: rate.name.clone(),
            totals: compute_totals(&checkout.lines, discount, shipping_price)?,
            coupon_code: checkout.coupon_code.clone(),
        })
    }

    pub fn place(&self, tenant_id: TenantId, buyer_id: UserId, checkout: Checkout, now: DateTime<Utc>) -> Result<Order, StoreError> {
        if checkout.lines.is_empty() {
            return Err(DomainError::validation("cannot place an order with an empty cart").into());
        }
        if let Some(vendor_id) = checkout.vendor_id {
            if !self.vendors.get(tenant_id, vendor_id)?.is_verified() {
                return Err(DomainError::validation("vendor is not accepting orders").into());
            }
        }

        let quote = self.quote(tenant_id, buyer_id, &checkout, now)?;
        let order = Order::place(
            tenant_id,
            buyer_id,
            checkout.vendor_id,
            checkout.lines,
            quote.totals,
            quote.shipping_method,
            checkout.region,
            quote.coupon_code,
            now,
        )?;
        self.orders.upsert(tenant_id, order.id, order.clone())?;

        // The coupon is spent only once the order exists; losing the race for
        // it withdraws the order again.
        if let Some(code) = order.coupon_code.as_deref() {
            if let Err(e) = self.loyalty.consume_coupon(tenant_id, buyer_id, code, now) {
                self.orders.remove(tenant_id, &order.id)?;
                return Err(e);
            }
        }

        tracing::info!(
            tenant_id = %tenant_id,
            order_id = %order.id,
            total = %order.totals.total,
            "order placed"
        );
        Ok(order)
    }

    pub fn get(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Order, StoreError> {
        self.orders
            .get(tenant_id, &order_id)?
            .ok_or_else(|| DomainError::NotFound.into())
    }

    pub fn list_for_buyer(&self, tenant_id: TenantId, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .list(tenant_id)?
            .into_iter()
            .filter(|o| o.buyer_id == buyer_id)
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        Ok(orders)
    }

    pub fn list_for_vendor(&self, tenant_id: TenantId, vendor_id: VendorId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .list(tenant_id)?
            .into_iter()
            .filter(|o| o.vendor_id == Some(vendor_id))
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        Ok(orders)
    }

    /// Advance an order. Delivery awards the buyer's points and credits the
    /// vendor; those follow-ups are logged, not rolled back, if they fail.
    pub fn transition(&self, tenant_id: TenantId, order_id: OrderId, next: OrderStatus, now: DateTime<Utc>) -> Result<Order, StoreError> {
        let order = self.orders.modify(tenant_id, &order_id, &mut |o| o.transition(next, now).map(|_| ()))?;
        tracing::info!(tenant_id = %tenant_id, order_id = %order_id, status = next.as_str(), "order status changed");

        if next == OrderStatus::Delivered {
            self.on_delivered(&order, now);
        }
        Ok(order)
    }

    fn on_delivered(&self, order: &Order, now: DateTime<Utc>) {
        if let Err(e) = self
            .loyalty
            .award_order(order.tenant_id, order.buyer_id, order.totals.total, now)
        {
            tracing::error!(order_id = %order.id, error = %e, "failed to award loyalty points");
        }

        if let Some(vendor_id) = order.vendor_id {
            let gross = order
                .totals
                .subtotal
                .checked_sub(order.totals.discount)
                .unwrap_or(Money::ZERO);
            if let Err(e) = self.vendors.credit_sale(order.tenant_id, vendor_id, gross, now) {
                tracing::error!(order_id = %order.id, vendor_id = %vendor_id, error = %e, "failed to credit vendor");
            }
        }
    }
}
