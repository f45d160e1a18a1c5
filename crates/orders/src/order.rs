use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, OrderId, TenantId, UserId, VendorId};

use crate::cart::{CartLine, CartTotals};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// States reachable in one step.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered => &[Refunded],
            Cancelled | Refunded => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub buyer_id: UserId,
    /// Seller fulfilling the order, if it is a vendor listing.
    pub vendor_id: Option<VendorId>,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub shipping_method: String,
    pub region: String,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub history: Vec<StatusChange>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        tenant_id: TenantId,
        buyer_id: UserId,
        vendor_id: Option<VendorId>,
        lines: Vec<CartLine>,
        totals: CartTotals,
        shipping_method: String,
        region: String,
        coupon_code: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("cannot place an order with an empty cart"));
        }
        Ok(Self {
            id: OrderId::new(),
            tenant_id,
            buyer_id,
            vendor_id,
            lines,
            totals,
            shipping_method,
            region,
            coupon_code,
            status: OrderStatus::Pending,
            history: Vec::new(),
            placed_at: now,
            updated_at: now,
        })
    }

    /// Move to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<StatusChange> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot change order status from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        let change = StatusChange {
            from: self.status,
            to: next,
            at: now,
        };
        self.status = next;
        self.updated_at = now;
        self.history.push(change.clone());
        Ok(change)
    }
}
