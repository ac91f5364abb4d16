//! Exact dose arithmetic.
//!
//! Dose quantities are stored as `i64` milli-doses (1/1000 of a dose), the
//! same smallest-unit representation used for money amounts elsewhere.
//! Comparisons against zero are exact integer comparisons; floating point
//! never enters the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Milli-doses per whole dose.
pub const MILLIDOSES_PER_DOSE: i64 = 1_000;

/// Exact dose quantity (value object).
///
/// Covers prescribed doses ("1.5 tablets"), cabinet balances and totals.
/// Quantities held by entities are kept non-negative by the operations that
/// mutate them; the type itself only guarantees exact arithmetic.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DoseQuantity(i64);

impl DoseQuantity {
    pub const ZERO: Self = Self(0);

    pub const fn from_millidoses(raw: i64) -> Self {
        Self(raw)
    }

    /// Whole doses, e.g. `from_whole(2)` = 2 doses.
    pub const fn from_whole(doses: i64) -> Self {
        Self(doses * MILLIDOSES_PER_DOSE)
    }

    pub const fn millidoses(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Scale by an occurrence count (`dose * count`), saturating at the
    /// representable maximum.
    pub fn saturating_mul_count(self, count: u64) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }

    /// Take up to `wanted` out of this quantity.
    ///
    /// Returns `(left, still_owed)`: the balance after the draw and the part
    /// of `wanted` that could not be covered. Exactly one of the two is
    /// non-zero unless both are zero.
    pub fn draw(self, wanted: Self) -> (Self, Self) {
        if wanted.0 >= self.0 {
            (Self::ZERO, Self(wanted.0 - self.0))
        } else {
            (Self(self.0 - wanted.0), Self::ZERO)
        }
    }
}

impl ValueObject for DoseQuantity {}

impl core::fmt::Display for DoseQuantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MILLIDOSES_PER_DOSE as u64;
        let frac = abs % MILLIDOSES_PER_DOSE as u64;
        if frac == 0 {
            write!(f, "{sign}{whole}")
        } else {
            let frac = format!("{frac:03}");
            write!(f, "{sign}{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl FromStr for DoseQuantity {
    type Err = DomainError;

    /// Parse a decimal dose string with up to three fraction digits,
    /// e.g. `"2"`, `"0.5"`, `"1.25"`. Negative doses are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole_str, frac_str) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole_str.starts_with('-') {
            return Err(DomainError::validation("dose cannot be negative"));
        }
        if frac_str.len() > 3 {
            return Err(DomainError::validation(
                "dose precision is limited to 1/1000",
            ));
        }

        let whole: i64 = whole_str
            .parse()
            .map_err(|_| DomainError::validation(format!("malformed dose: {s:?}")))?;

        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{frac_str:0<3}");
            padded
                .parse()
                .map_err(|_| DomainError::validation(format!("malformed dose: {s:?}")))?
        };

        whole
            .checked_mul(MILLIDOSES_PER_DOSE)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("dose out of range: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!("2".parse::<DoseQuantity>().unwrap(), DoseQuantity::from_whole(2));
        assert_eq!(
            "0.5".parse::<DoseQuantity>().unwrap(),
            DoseQuantity::from_millidoses(500)
        );
        assert_eq!(
            "1.25".parse::<DoseQuantity>().unwrap(),
            DoseQuantity::from_millidoses(1_250)
        );
    }

    #[test]
    fn parse_rejects_negative_and_too_precise() {
        assert!("-1".parse::<DoseQuantity>().is_err());
        assert!("0.0005".parse::<DoseQuantity>().is_err());
        assert!("abc".parse::<DoseQuantity>().is_err());
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(DoseQuantity::from_whole(3).to_string(), "3");
        assert_eq!(DoseQuantity::from_millidoses(1_500).to_string(), "1.5");
        assert_eq!(DoseQuantity::from_millidoses(250).to_string(), "0.25");
    }

    #[test]
    fn draw_splits_exactly() {
        let balance = DoseQuantity::from_whole(3);

        let (left, owed) = balance.draw(DoseQuantity::from_whole(2));
        assert_eq!(left, DoseQuantity::from_whole(1));
        assert!(owed.is_zero());

        let (left, owed) = balance.draw(DoseQuantity::from_whole(5));
        assert!(left.is_zero());
        assert_eq!(owed, DoseQuantity::from_whole(2));

        let (left, owed) = balance.draw(DoseQuantity::from_whole(3));
        assert!(left.is_zero());
        assert!(owed.is_zero());
    }

    proptest! {
        /// Property: a draw never creates or destroys doses.
        #[test]
        fn draw_conserves_total(balance in 0i64..1_000_000, wanted in 0i64..1_000_000) {
            let balance = DoseQuantity::from_millidoses(balance);
            let wanted = DoseQuantity::from_millidoses(wanted);

            let (left, owed) = balance.draw(wanted);

            // consumed = balance - left; covered = wanted - owed; both equal.
            prop_assert_eq!(
                balance.millidoses() - left.millidoses(),
                wanted.millidoses() - owed.millidoses()
            );
            prop_assert!(left.millidoses() >= 0);
            prop_assert!(owed.millidoses() >= 0);
        }

        /// Property: parse/display round-trip is exact.
        #[test]
        fn parse_display_round_trip(raw in 0i64..10_000_000) {
            let q = DoseQuantity::from_millidoses(raw);
            let parsed: DoseQuantity = q.to_string().parse().unwrap();
            prop_assert_eq!(parsed, q);
        }
    }
}
