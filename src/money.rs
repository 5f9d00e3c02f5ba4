//! Fixed-point amounts of money.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

/// The largest amount, in either direction, that [Money] accepts as input.
///
/// Small enough that every amount survives the trip through a JSON number
/// (an `f64`) with its cents intact.
const MAX_ABS_CENTS: i64 = 10_000_000_000_000;

/// An amount of money with two decimal places, stored as a whole number of
/// cents.
///
/// Amounts are serialized as JSON numbers (e.g. `500.0`) and stored in the
/// database as integer cents so that sums are exact. Input with more than two
/// decimal places is rounded to the nearest cent, half away from zero,
/// whether it arrives as a JSON number or a string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// No money at all.
    pub const ZERO: Money = Money(0);

    /// The largest amount accepted as input.
    pub const MAX: Money = Money(MAX_ABS_CENTS);

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Round `amount` to the nearest cent, half away from zero.
    ///
    /// Returns `None` if the result is larger than [Money::MAX] in either direction.
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let cents = amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()?;

        (cents.unsigned_abs() <= MAX_ABS_CENTS.unsigned_abs()).then_some(Self(cents))
    }

    /// The amount as an exact decimal with two decimal places.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// The amount as a float, e.g. for JSON output.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is within the range accepted as input.
    pub fn is_in_range(&self) -> bool {
        self.0.unsigned_abs() <= MAX_ABS_CENTS.unsigned_abs()
    }

    /// `self + rhs`, or `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `self - rhs`, or `None` on overflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_decimal().fmt(f)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parse a decimal string such as "500", "500.5" or "-12.345".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("\"{s}\" is not a valid amount"));

        let amount = Decimal::from_str(s.trim()).map_err(|_| invalid())?;

        Money::from_decimal(amount).ok_or_else(invalid)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MoneyVisitor;

        impl MoneyVisitor {
            fn in_range<E: de::Error>(amount: Decimal) -> Result<Money, E> {
                Money::from_decimal(amount).ok_or_else(|| E::custom("amount is out of range"))
            }
        }

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a decimal amount of money")
            }

            // The shortest decimal that reads back as `value`, i.e. the number
            // as it was written in the JSON text.
            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                if !value.is_finite() {
                    return Err(E::custom("amount is out of range"));
                }

                let amount = Decimal::from_str(&value.to_string())
                    .map_err(|_| E::custom("amount is out of range"))?;
                Self::in_range(amount)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Self::in_range(Decimal::from(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Self::in_range(Decimal::from(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

#[cfg(test)]
mod money_tests {
    use crate::{Error, Money};

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("500".parse::<Money>(), Ok(Money::from_cents(50_000)));
        assert_eq!("500.5".parse::<Money>(), Ok(Money::from_cents(50_050)));
        assert_eq!("0.07".parse::<Money>(), Ok(Money::from_cents(7)));
        assert_eq!("-12.34".parse::<Money>(), Ok(Money::from_cents(-1_234)));
    }

    #[test]
    fn rounds_extra_decimal_places() {
        assert_eq!("1.005".parse::<Money>(), Ok(Money::from_cents(101)));
        assert_eq!("1.004".parse::<Money>(), Ok(Money::from_cents(100)));
        assert_eq!("-1.005".parse::<Money>(), Ok(Money::from_cents(-101)));
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "abc", "1.2.3", "12a", "1 000", "--1"] {
            assert!(
                matches!(input.parse::<Money>(), Err(Error::InvalidInput(_))),
                "want error for {input:?}"
            );
        }
    }

    #[test]
    fn rejects_amounts_above_max() {
        assert!("100000000000.00".parse::<Money>().is_ok());
        assert!("100000000000.01".parse::<Money>().is_err());
        assert!(serde_json::from_str::<Money>("1e300").is_err());
        assert!(serde_json::from_str::<Money>("9223372036854775807").is_err());
    }

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Money::from_cents(50_000).to_string(), "500.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(
            Money::from_cents(1_000).checked_sub(Money::from_cents(250)),
            Some(Money::from_cents(750))
        );
        assert_eq!(
            Money::from_cents(10).checked_add(Money::from_cents(20)),
            Some(Money::from_cents(30))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let from_float: Money = serde_json::from_str("500.0").unwrap();
        let from_int: Money = serde_json::from_str("500").unwrap();
        let from_string: Money = serde_json::from_str("\"500.00\"").unwrap();

        assert_eq!(from_float, Money::from_cents(50_000));
        assert_eq!(from_int, Money::from_cents(50_000));
        assert_eq!(from_string, Money::from_cents(50_000));
    }

    #[test]
    fn numbers_and_strings_round_the_same_way() {
        for text in ["1.005", "2.675", "0.125", "-1.005", "12.345"] {
            let from_number: Money = serde_json::from_str(text).unwrap();
            let from_string: Money = serde_json::from_str(&format!("\"{text}\"")).unwrap();

            assert_eq!(from_number, from_string, "{text}");
        }

        let from_number: Money = serde_json::from_str("1.005").unwrap();
        assert_eq!(from_number, Money::from_cents(101));
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1_234)).unwrap();

        assert_eq!(json, "12.34");
    }

    #[test]
    fn largest_amount_survives_json() {
        let largest = Money::MAX.checked_sub(Money::from_cents(1)).unwrap();

        let json = serde_json::to_string(&largest).unwrap();
        let read_back: Money = serde_json::from_str(&json).unwrap();

        assert_eq!(read_back, largest);
    }
}
