use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Unit price represented as **integer cents**.
///
/// Prices are never negative; the bulk price mutator rounds half away from
/// zero to whole cents.
///
/// ```rust
/// use engine::PriceCents;
///
/// let price: PriceCents = "12,5".parse().unwrap();
/// assert_eq!(price.cents(), 1250);
/// assert_eq!(price.to_string(), "12.50");
/// assert!("-1".parse::<PriceCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PriceCents(i64);

impl PriceCents {
    pub const ZERO: PriceCents = PriceCents(0);

    /// Creates a price from integer cents, rejecting negative values.
    pub fn try_new(cents: i64) -> ResultEngine<Self> {
        if cents < 0 {
            return Err(EngineError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        Ok(Self(cents))
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Price of `quantity` units, saturating at `i64::MAX` cents.
    #[must_use]
    pub fn times(self, quantity: i64) -> i64 {
        self.0.saturating_mul(quantity)
    }

    /// Applies a percentage change.
    ///
    /// The result is `price * (100 + percent) / 100` rounded to the nearest
    /// cent. A change below -100% never reaches here since [`PercentChange`]
    /// rejects it.
    pub fn adjusted(self, change: PercentChange) -> ResultEngine<Self> {
        let factor = i128::from(BASIS_POINTS_100 + change.basis_points());
        let scaled = i128::from(self.0) * factor;
        let half = i128::from(BASIS_POINTS_100) / 2;
        let rounded = (scaled + half) / i128::from(BASIS_POINTS_100);
        let cents = i64::try_from(rounded)
            .map_err(|_| EngineError::Validation("adjusted price too large".to_string()))?;
        Self::try_new(cents)
    }
}

impl fmt::Display for PriceCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FixedPoint(self.0))
    }
}

impl From<PriceCents> for i64 {
    fn from(value: PriceCents) -> Self {
        value.0
    }
}

impl FromStr for PriceCents {
    type Err = EngineError;

    /// Parses a decimal string (`.` or `,` separator, at most two decimals).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cents = parse_hundredths(s, "price")?;
        Self::try_new(cents)
    }
}

const BASIS_POINTS_100: i64 = 10_000;

/// Signed percentage change with two decimals of precision, stored as basis
/// points (`-12.5%` is `-1250`).
///
/// Anything below `-100%` is rejected because it would produce negative
/// prices.
///
/// ```rust
/// use engine::PercentChange;
///
/// assert_eq!("10".parse::<PercentChange>().unwrap().basis_points(), 1000);
/// assert_eq!("-12.5".parse::<PercentChange>().unwrap().basis_points(), -1250);
/// assert!("-100.01".parse::<PercentChange>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PercentChange(i64);

impl PercentChange {
    pub fn from_basis_points(basis_points: i64) -> ResultEngine<Self> {
        if basis_points < -BASIS_POINTS_100 {
            return Err(EngineError::Validation(
                "price change below -100% would make prices negative".to_string(),
            ));
        }
        Ok(Self(basis_points))
    }

    #[must_use]
    pub const fn basis_points(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", FixedPoint(self.0))
    }
}

impl FromStr for PercentChange {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let basis_points = parse_hundredths(s, "percent")?;
        Self::from_basis_points(basis_points)
    }
}

struct FixedPoint(i64);

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses `[+-]digits[(.|,)d[d]]` into hundredths.
fn parse_hundredths(s: &str, label: &str) -> ResultEngine<i64> {
    let invalid = || EngineError::Validation(format!("invalid {label}: {s:?}"));

    let trimmed = s.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let rest = rest.replace(',', ".");
    let (whole, frac) = match rest.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (rest.as_str(), ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        2 => frac.parse().map_err(|_| invalid())?,
        _ => {
            return Err(EngineError::Validation(format!(
                "{label} allows at most two decimals"
            )));
        }
    };

    let total = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| EngineError::Validation(format!("{label} too large")))?;

    Ok(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(s: &str) -> PercentChange {
        s.parse().unwrap()
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<PriceCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<PriceCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<PriceCents>().unwrap().cents(), 1050);
        assert_eq!("  2.30 ".parse::<PriceCents>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_rejects_garbage_and_negative_prices() {
        assert!("".parse::<PriceCents>().is_err());
        assert!("abc".parse::<PriceCents>().is_err());
        assert!("1.2.3".parse::<PriceCents>().is_err());
        assert!("12.345".parse::<PriceCents>().is_err());
        assert!("-0.01".parse::<PriceCents>().is_err());
    }

    #[test]
    fn increase_rounds_to_nearest_cent() {
        let price = PriceCents::try_new(999).unwrap();
        // 9.99 * 1.10 = 10.989
        assert_eq!(price.adjusted(pct("10")).unwrap().cents(), 1099);
        // 0.05 * 1.10 = 0.055
        let small = PriceCents::try_new(5).unwrap();
        assert_eq!(small.adjusted(pct("10")).unwrap().cents(), 6);
    }

    #[test]
    fn decrease_rounds_to_nearest_cent() {
        let price = PriceCents::try_new(1000).unwrap();
        assert_eq!(price.adjusted(pct("-12.5")).unwrap().cents(), 875);
        assert_eq!(price.adjusted(pct("-33.33")).unwrap().cents(), 667);
    }

    #[test]
    fn minus_one_hundred_percent_zeroes_the_price() {
        let price = PriceCents::try_new(1234).unwrap();
        assert_eq!(price.adjusted(pct("-100")).unwrap(), PriceCents::ZERO);
    }

    #[test]
    fn below_minus_one_hundred_percent_is_rejected() {
        let err = "-100.5".parse::<PercentChange>().unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(PriceCents::try_new(5).unwrap().to_string(), "0.05");
        assert_eq!(pct("-7.5").to_string(), "-7.50%");
    }
}
