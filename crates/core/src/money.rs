//! Money in minor currency units.
//!
//! Amounts are whole cents in a single marketplace currency. Every operation
//! that can overflow or go negative is checked and reports a validation error.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount would become negative"))
    }

    pub fn checked_mul(self, factor: u64) -> DomainResult<Money> {
        self.0
            .checked_mul(factor)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// `percent`% of this amount, rounded down. `percent` is clamped to 100.
    pub fn percent(self, percent: u8) -> Money {
        let p = u128::from(percent.min(100));
        Money(((u128::from(self.0) * p) / 100) as u64)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_formats_cents() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn sub_below_zero_is_rejected() {
        let err = Money::from_cents(100).checked_sub(Money::from_cents(101));
        assert!(matches!(err, Err(DomainError::Validation(_))));
    }

    #[test]
    fn mul_overflow_is_rejected() {
        assert!(Money::from_cents(u64::MAX).checked_mul(2).is_err());
    }

    proptest! {
        #[test]
        fn percent_never_exceeds_amount(cents in any::<u64>(), p in any::<u8>()) {
            let m = Money::from_cents(cents);
            prop_assert!(m.percent(p) <= m);
        }
    }
}
