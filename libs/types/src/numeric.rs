//! Exact decimal price facade.
//!
//! Uses rust_decimal so prices compare and round-trip without
//! floating-point error. The engine never does arithmetic on prices; it
//! only compares them and projects them to `f64` for its index keys, so
//! that is the whole surface exposed here.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact decimal price.
///
/// Zero is a legal value: market orders carry a zero price, and a zero
/// stop price means "no stop price set". Serialized as a string to
/// prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lossy `f64` projection used for index keys.
    ///
    /// Two distinct decimals may collide after projection; index keys
    /// disambiguate by order id, so matching order is still total.
    /// Returns `None` when the value has no finite float representation.
    pub fn to_f64(&self) -> Option<f64> {
        self.0.to_f64().filter(|value| value.is_finite())
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Decimal::from_str(s)?))
    }
}

// Serialized as a string to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Self(decimal))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_compare() {
        let low: Price = "20.10".parse().unwrap();
        let high: Price = "20.12".parse().unwrap();
        assert!(low < high);
        assert_eq!(low, Price::new(Decimal::new(2010, 2)));
    }

    #[test]
    fn price_zero() {
        assert!(Price::ZERO.is_zero());
        assert!(Price::default().is_zero());
        assert!(!Price::new(Decimal::new(2025, 2)).is_zero());
    }

    #[test]
    fn price_projection() {
        let price: Price = "20.25".parse().unwrap();
        assert_eq!(price.to_f64(), Some(20.25));
        assert_eq!(Price::ZERO.to_f64(), Some(0.0));
    }

    #[test]
    fn price_serialization() {
        let price: Price = "50000.25".parse().unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"50000.25\"");

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, back);
    }
}
