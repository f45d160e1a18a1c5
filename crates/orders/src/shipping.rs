use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Money};

/// A shipping option with the constraints under which it applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub name: String,
    /// Region codes served; empty means everywhere.
    pub regions: Vec<String>,
    pub min_weight_g: u64,
    pub max_weight_g: u64,
    pub price: Money,
    /// Subtotal at or above which this rate ships free.
    pub free_over: Option<Money>,
}

impl ShippingRate {
    fn serves(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.iter().any(|r| r.eq_ignore_ascii_case(region))
    }

    fn fits(&self, weight_g: u64) -> bool {
        weight_g >= self.min_weight_g && weight_g <= self.max_weight_g
    }

    fn effective_price(&self, subtotal: Money) -> Money {
        match self.free_over {
            Some(threshold) if subtotal >= threshold => Money::ZERO,
            _ => self.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingRequest<'a> {
    pub region: &'a str,
    pub weight_g: u64,
    pub subtotal: Money,
}

/// Cheapest applicable rate and the price it charges for this request.
///
/// Ties keep the first rate in table order.
pub fn select_rate<'r>(rates: &'r [ShippingRate], req: &ShippingRequest<'_>) -> DomainResult<(&'r ShippingRate, Money)> {
    rates
        .iter()
        .filter(|r| r.serves(req.region) && r.fits(req.weight_g))
        .map(|r| (r, r.effective_price(req.subtotal)))
        .fold(None, |best: Option<(&ShippingRate, Money)>, cand| match best {
            Some(b) if b.1 <= cand.1 => Some(b),
            _ => Some(cand),
        })
        .ok_or_else(|| {
            DomainError::validation(format!(
                "no shipping rate for region '{}' at {} g",
                req.region, req.weight_g
            ))
        })
}

/// Built-in rate table used when a storefront has not configured its own.
pub fn default_rates() -> Vec<ShippingRate> {
    vec![
        ShippingRate {
            name: "standard".into(),
            regions: vec![],
            min_weight_g: 0,
            max_weight_g: 20_000,
            price: Money::from_cents(599),
            free_over: Some(Money::from_cents(5_000)),
        },
        ShippingRate {
            name: "express".into(),
            regions: vec![],
            min_weight_g: 0,
            max_weight_g: 10_000,
            price: Money::from_cents(1_499),
            free_over: None,
        },
        ShippingRate {
            name: "freight".into(),
            regions: vec!["US".into(), "CA".into()],
            min_weight_g: 20_001,
            max_weight_g: 500_000,
            price: Money::from_cents(4_999),
            free_over: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(region: &str, weight_g: u64, subtotal: u64) -> ShippingRequest<'_> {
        ShippingRequest {
            region,
            weight_g,
            subtotal: Money::from_cents(subtotal),
        }
    }

    #[test]
    fn picks_cheapest_applicable() {
        let rates = default_rates();
        let (rate, price) = select_rate(&rates, &req("DE", 500, 1_000)).unwrap();
        assert_eq!(rate.name, "standard");
        assert_eq!(price, Money::from_cents(599));
    }

    #[test]
    fn free_over_threshold_zeroes_price() {
        let rates = default_rates();
        let (_, price) = select_rate(&rates, &req("DE", 500, 5_000)).unwrap();
        assert_eq!(price, Money::ZERO);
    }

    #[test]
    fn heavy_parcels_need_regional_freight() {
        let rates = default_rates();
        let (rate, _) = select_rate(&rates, &req("us", 30_000, 1_000)).unwrap();
        assert_eq!(rate.name, "freight");
        assert!(matches!(
            select_rate(&rates, &req("DE", 30_000, 1_000)),
            Err(DomainError::Validation(_))
        ));
    }
}
