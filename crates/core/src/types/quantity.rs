//! Cart and order line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// Quantity exceeds what a line can hold.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A strictly positive line quantity.
///
/// Bounded above by `i32::MAX` so it always fits an SQL `INTEGER` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single line may hold.
    #[allow(clippy::cast_sign_loss)] // i32::MAX is positive
    pub const MAX: u32 = i32::MAX as u32;

    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero and
    /// [`QuantityError::TooLarge`] above [`Quantity::MAX`].
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::NotPositive);
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Create a quantity from a signed request value.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for values `<= 0`.
    pub fn from_signed(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive);
        }
        let value = u32::try_from(value).map_err(|_| QuantityError::TooLarge { max: Self::MAX })?;
        Self::new(value)
    }

    /// The quantity as an unsigned integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Add two quantities (merge-on-add).
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the sum exceeds [`Quantity::MAX`].
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
            .and_then(Self::new)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_signed(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl From<Quantity> for i32 {
    #[allow(clippy::cast_possible_wrap)] // bounded by i32::MAX on construction
    fn from(quantity: Quantity) -> Self {
        quantity.0 as Self
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_signed(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i32::from(*self), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::from_signed(0), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::from_signed(-4), Err(QuantityError::NotPositive));
    }

    #[test]
    fn test_rejects_beyond_integer_column() {
        assert!(matches!(
            Quantity::from_signed(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge { .. })
        ));
        assert!(Quantity::from_signed(i64::from(i32::MAX)).is_ok());
    }

    #[test]
    fn test_checked_add_merges() {
        let two = Quantity::new(2).unwrap();
        assert_eq!(two.checked_add(Quantity::ONE).unwrap().get(), 3);
        let max = Quantity::new(Quantity::MAX).unwrap();
        assert!(max.checked_add(Quantity::ONE).is_err());
    }

    #[test]
    fn test_serde() {
        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q.get(), 3);
        assert_eq!(serde_json::to_string(&q).unwrap(), "3");
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }
}
