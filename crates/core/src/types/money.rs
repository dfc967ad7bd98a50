//! Monetary amounts with decimal arithmetic.
//!
//! All prices in the system are a single currency (USD) stored as
//! `NUMERIC(10,2)` in Postgres, so [`Money`] wraps a [`Decimal`] pinned to
//! two fractional digits rather than carrying a currency code around.

use core::fmt;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing [`Money`] from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("amount must be a number like 19.99")]
    Invalid,
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more than two fractional digits.
    #[error("amount cannot have more than two decimal places")]
    TooPrecise,
    /// The amount exceeds what the database column can hold.
    #[error("amount must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative monetary amount in dollars, scaled to cents.
///
/// ```
/// use wildbloom_core::Money;
///
/// let price = Money::parse("19.99").unwrap();
/// assert_eq!(price.to_string(), "$19.99");
/// assert_eq!(price.times(3).to_string(), "$59.97");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound accepted by [`Money::parse`] (NUMERIC(10,2)).
    pub const MAX_EXCLUSIVE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Wrap a decimal amount, rescaling to two fractional digits.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.round_dp(2))
    }

    /// Build from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a user-entered amount like `19.99` or `$19.99`.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is not a number, is negative, carries
    /// more than two decimal places, or exceeds the storable range.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let s = s.trim().trim_start_matches('$').trim();
        let amount: Decimal = s.parse().map_err(|_| MoneyError::Invalid)?;

        if amount.is_sign_negative() {
            return Err(MoneyError::Negative);
        }
        if amount.scale() > 2 && amount != amount.round_dp(2) {
            return Err(MoneyError::TooPrecise);
        }
        if amount >= Self::MAX_EXCLUSIVE {
            return Err(MoneyError::TooLarge {
                max: Self::MAX_EXCLUSIVE,
            });
        }

        Ok(Self(amount.round_dp(2)))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::from_decimal(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature): NUMERIC via rust_decimal
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
        Ok(Self(amount))
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

    #[test]
    fn test_parse_plain() {
        assert_eq!(Money::parse("19.99").unwrap(), Money::from_cents(1999));
        assert_eq!(Money::parse("0").unwrap(), Money::ZERO);
        assert_eq!(Money::parse("5").unwrap(), Money::from_cents(500));
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(Money::parse("$12.50").unwrap(), Money::from_cents(1250));
        assert_eq!(Money::parse(" $ 3.00 ").unwrap(), Money::from_cents(300));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Money::parse("abc"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse(""), Err(MoneyError::Invalid));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Money::parse("-1.00"), Err(MoneyError::Negative));
    }

    #[test]
    fn test_parse_rejects_sub_cent() {
        assert_eq!(Money::parse("1.999"), Err(MoneyError::TooPrecise));
        // Trailing zeros beyond two places are still exact
        assert_eq!(Money::parse("1.990").unwrap(), Money::from_cents(199));
    }

    #[test]
    fn test_parse_rejects_too_large() {
        assert!(matches!(
            Money::parse("100000000.00"),
            Err(MoneyError::TooLarge { .. })
        ));
        assert!(Money::parse("99999999.99").is_ok());
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_times_and_sum() {
        let line = Money::from_cents(1250).times(3);
        assert_eq!(line, Money::from_cents(3750));

        let subtotal: Money = vec![Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(subtotal, Money::from_cents(350));
    }

    #[test]
    fn test_serde_as_string() {
        // serde-with-str keeps NUMERIC values exact in JSON
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "\"19.99\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(1999));
    }
}
