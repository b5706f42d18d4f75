use std::{fmt::Display, str::FromStr};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

pub const RUB_CURRENCY_CODE: &str = "RUB";

//--------------------------------------       Rubles        ---------------------------------------------------------
/// A non-negative amount of Russian roubles, held as a whole number of kopecks.
///
/// Amounts travel over the wire as decimal strings with exactly two fraction digits (`"9.99"`), which is also the
/// format the payment processor expects. Deserialization accepts JSON numbers as well as strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type)]
#[sqlx(transparent)]
pub struct Rubles(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RublesConversionError {
    #[error("Amount cannot be negative: {0}")]
    Negative(String),
    #[error("Amount has more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("Amount is too large: {0}")]
    Overflow(String),
    #[error("Amount is not a valid decimal number: {0}")]
    InvalidFormat(String),
}

impl Rubles {
    pub fn from_kopecks(kopecks: i64) -> Self {
        Self(kopecks)
    }

    pub fn kopecks(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl TryFrom<Decimal> for Rubles {
    type Error = RublesConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(RublesConversionError::Negative(value.to_string()));
        }
        let kopecks = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| RublesConversionError::Overflow(value.to_string()))?;
        if !kopecks.fract().is_zero() {
            return Err(RublesConversionError::TooPrecise(value.to_string()));
        }
        kopecks.to_i64().map(Self).ok_or_else(|| RublesConversionError::Overflow(value.to_string()))
    }
}

impl FromStr for Rubles {
    type Err = RublesConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e| RublesConversionError::InvalidFormat(format!("{s}. {e}")))?;
        Self::try_from(value)
    }
}

impl Display for Rubles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Rubles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rubles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_from(value).map_err(de::Error::custom)
    }
}
