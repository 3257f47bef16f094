//! Fixed-point money amounts.
//!
//! All monetary values in Luxe are non-negative decimals with two fraction
//! digits, backed by [`rust_decimal::Decimal`]. Binary floats never hold a
//! persisted amount; JSON numbers are accepted on input by parsing their
//! shortest decimal representation.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Quantity;

/// Number of fraction digits carried by every [`Money`] value.
pub const MONEY_SCALE: u32 = 2;

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("amount is not a valid decimal number")]
    Invalid,
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more than two fraction digits.
    #[error("amount cannot have more than {MONEY_SCALE} decimal places")]
    TooPrecise,
    /// The amount exceeds [`Money::MAX`].
    #[error("amount cannot exceed {}", Money::MAX)]
    TooLarge,
}

/// A non-negative currency amount with cent precision.
///
/// ```
/// use luxe_core::{Money, Quantity};
///
/// let price = Money::parse("89.00").unwrap();
/// let line = price.checked_mul_quantity(Quantity::new(2).unwrap()).unwrap();
/// assert_eq!(line.to_string(), "178.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Largest storable amount, `9999999999.99` (an SQL `NUMERIC(12, 2)`).
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE));

    /// Zero with cent scale.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE))
    }

    /// Parse an amount such as `"29.00"` or `"149"`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Invalid`] for non-numeric input, or the errors of
    /// [`Money::from_decimal`].
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid)?;
        Self::from_decimal(amount)
    }

    /// Build from a decimal, rejecting negatives, sub-cent precision and
    /// amounts above [`Money::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`], [`MoneyError::TooPrecise`] or
    /// [`MoneyError::TooLarge`].
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO {
            return Err(MoneyError::Negative);
        }
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise);
        }
        bounded(amount).ok_or(MoneyError::TooLarge)
    }

    /// Build from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative input.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        Self::from_decimal(Decimal::new(cents, MONEY_SCALE))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Add two amounts, returning `None` above [`Money::MAX`].
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        bounded(self.0.checked_add(other.0)?)
    }

    /// Multiply by a line quantity, returning `None` above [`Money::MAX`].
    #[must_use]
    pub fn checked_mul_quantity(self, quantity: Quantity) -> Option<Self> {
        bounded(self.0.checked_mul(Decimal::from(quantity.get()))?)
    }

    /// Apply a fractional rate (e.g. `0.08` for 8% tax), rounding half away
    /// from zero to the nearest cent. Negative rates yield `None`.
    #[must_use]
    pub fn checked_apply_rate(self, rate: Decimal) -> Option<Self> {
        if rate < Decimal::ZERO {
            return None;
        }
        let raw = self.0.checked_mul(rate)?;
        bounded(raw.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Sum a sequence of amounts, returning `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(), Self::checked_add)
    }
}

/// Rescale to cents, or `None` if the amount does not fit [`Money::MAX`].
fn bounded(amount: Decimal) -> Option<Money> {
    if amount > Money::MAX.0 {
        return None;
    }
    let mut scaled = amount;
    scaled.rescale(MONEY_SCALE);
    Some(Money(scaled))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative amount with at most two decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Money::from_decimal(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::from_decimal(Decimal::from(v)).map_err(E::custom)
    }

    // `{}` on f64 prints the shortest string that round-trips, so 29.99
    // becomes "29.99" rather than its binary expansion.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::parse(&v.to_string()).map_err(E::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_decimal(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_parse_pads_to_cents() {
        assert_eq!(money("29").to_string(), "29.00");
        assert_eq!(money("29.5").to_string(), "29.50");
        assert_eq!(money(" 149.00 ").to_string(), "149.00");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Money::parse("abc"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse("-1.00"), Err(MoneyError::Negative));
        assert_eq!(Money::parse("1.005"), Err(MoneyError::TooPrecise));
    }

    #[test]
    fn test_trailing_zeros_beyond_cents_are_accepted() {
        assert_eq!(money("1.500").to_string(), "1.50");
    }

    #[test]
    fn test_cart_total_has_no_float_drift() {
        let lines = [
            money("29.00").checked_mul_quantity(qty(1)).unwrap(),
            money("89.00").checked_mul_quantity(qty(2)).unwrap(),
            money("149.00").checked_mul_quantity(qty(1)).unwrap(),
        ];
        assert_eq!(Money::checked_sum(lines).unwrap().to_string(), "356.00");

        let cents = [money("0.10"), money("0.20")];
        assert_eq!(Money::checked_sum(cents).unwrap(), money("0.30"));
    }

    #[test]
    fn test_apply_rate_rounds_half_away_from_zero() {
        let rate = Decimal::new(8, 2);
        assert_eq!(money("396.00").checked_apply_rate(rate).unwrap().to_string(), "31.68");
        assert_eq!(money("10.15").checked_apply_rate(rate).unwrap().to_string(), "0.81");
        assert_eq!(money("0.06").checked_apply_rate(rate).unwrap().to_string(), "0.00");

        let half = Decimal::new(5, 1);
        assert_eq!(money("0.05").checked_apply_rate(half).unwrap().to_string(), "0.03");
        assert!(money("1.00").checked_apply_rate(Decimal::NEGATIVE_ONE).is_none());
    }

    #[test]
    fn test_serde_string_and_number_input() {
        assert_eq!(serde_json::to_string(&money("87")).unwrap(), "\"87.00\"");
        assert_eq!(serde_json::from_str::<Money>("\"29.00\"").unwrap(), money("29"));
        assert_eq!(serde_json::from_str::<Money>("29.99").unwrap(), money("29.99"));
        assert_eq!(serde_json::from_str::<Money>("12").unwrap(), money("12"));
        assert!(serde_json::from_str::<Money>("-3").is_err());
        assert!(serde_json::from_str::<Money>("0.125").is_err());
    }

    #[test]
    fn test_amounts_are_bounded_by_storage() {
        assert_eq!(Money::MAX.to_string(), "9999999999.99");
        assert_eq!(money("9999999999.99"), Money::MAX);
        assert_eq!(Money::parse("10000000000.00"), Err(MoneyError::TooLarge));
        assert!(serde_json::from_str::<Money>("\"100000000000.00\"").is_err());

        assert!(Money::MAX.checked_add(money("0.01")).is_none());
        assert!(money("5000000000.00").checked_mul_quantity(qty(2)).is_none());
        assert!(Money::checked_sum([Money::MAX, money("0.01")]).is_none());
        assert!(Money::MAX.checked_apply_rate(Decimal::new(108, 2)).is_none());
        assert_eq!(
            money("4999999999.99").checked_mul_quantity(qty(2)).unwrap().to_string(),
            "9999999999.98"
        );
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(8700).unwrap(), money("87.00"));
        assert!(Money::from_cents(-1).is_err());
    }
}
