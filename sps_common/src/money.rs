use std::{
    fmt::{Display, Formatter},
    iter::Sum,
    num::ParseIntError,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

/// An amount of money, in whole currency units.
///
/// The storefront trades in a zero-decimal currency, so one unit here is one unit at the till. All arithmetic is
/// plain integer arithmetic and there is no cent scaling anywhere in the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Money {
    pub fn from_units(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let value = i64::try_from(value).map_err(|e| MoneyConversionError(e.to_string()))?;
        Ok(Self(value))
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    /// Converts a float amount, as reported by payment gateways, to whole units. Fractional parts are rounded to
    /// the nearest unit.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.abs() >= i64::MAX as f64 {
            return Err(MoneyConversionError(format!("{value} is out of range")));
        }
        Ok(Self(value.round() as i64))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses an amount from a decimal string. Clients send prices as strings to avoid client-side float
    /// formatting surprises, so both `"15000"` and `"15000.0"` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<i64>() {
            Ok(v) => Ok(Self(v)),
            Err(_) => {
                let v = trimmed.parse::<f64>().map_err(|e| MoneyConversionError(format!("{trimmed}: {e}")))?;
                Self::try_from(v)
            },
        }
    }
}

impl From<ParseIntError> for MoneyConversionError {
    fn from(value: ParseIntError) -> Self {
        Self(value.to_string())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::default(), |acc, x| acc + x)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Money::from(1500);
        let b = Money::from(500);
        assert_eq!(a + b, Money::from(2000));
        assert_eq!(a - b, Money::from(1000));
        assert_eq!(-b, Money::from(-500));
        assert_eq!(b * 3, Money::from(1500));
        let mut c = a;
        c -= b;
        assert_eq!(c, Money::from(1000));
    }

    #[test]
    fn summing() {
        let total: Money = [100i64, 250, 650].into_iter().map(Money::from).sum();
        assert_eq!(total, Money::from(1000));
    }

    #[test]
    fn parsing() {
        assert_eq!("15000".parse::<Money>().unwrap(), Money::from(15000));
        assert_eq!(" 15000.0 ".parse::<Money>().unwrap(), Money::from(15000));
        assert_eq!("249.6".parse::<Money>().unwrap(), Money::from(250));
        assert!("abc".parse::<Money>().is_err());
        assert!("inf".parse::<Money>().is_err());
    }

    #[test]
    fn float_conversion() {
        assert_eq!(Money::try_from(1500.0f64).unwrap(), Money::from(1500));
        assert!(Money::try_from(f64::NAN).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Money::from(12500).to_string(), "$12500");
    }
}
