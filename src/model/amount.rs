//! Amount type for handling monetary values with optional peso signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a peso sign and commas. The backend sends amounts either as JSON
//! numbers or as strings, so deserialization accepts both.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

const PESO: char = '₱';

/// Represents how peso amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ peso: true, commas: true }` -> `-₱60,000.00`
///  - `AmountFormat{ peso: false, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ peso: false, commas: false }` -> `-60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a peso sign is present in the formatting.
    peso: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has a peso sign and commas: e.g. `-₱60,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    peso: true,
    commas: true,
};

/// The format used for amounts that arrived as JSON numbers.
const PLAIN_FORMAT: AmountFormat = AmountFormat {
    peso: false,
    commas: false,
};

/// Represents a peso amount.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use brgy_reports::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("5000.00").unwrap();
/// let b = Amount::from_str("₱5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(b.to_string(), "₱5,000.00");
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value().is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value().is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut peso_sign = false;
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_peso = if let Some(after_minus) = trimmed.strip_prefix('-') {
            // Negative number: could be "-₱50.00" or "-50.00"
            if let Some(after_peso) = after_minus.strip_prefix(PESO) {
                peso_sign = true;
                format!("-{after_peso}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_peso) = trimmed.strip_prefix(PESO) {
            peso_sign = true;
            after_peso.trim_start().to_string()
        } else {
            trimmed.to_string()
        };

        // Remove commas (thousand separators)
        let without_commas = without_peso.replace(',', "");
        let commas = without_commas.len() < without_peso.len();

        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat {
                peso: peso_sign,
                commas,
            },
        })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            ("-", self.value().abs())
        } else {
            ("", self.value())
        };

        let peso = if self.format.peso {
            String::from(PESO)
        } else {
            String::new()
        };

        if self.format.commas {
            write!(f, "{sign}{peso}{}", with_commas(num))
        } else {
            write!(f, "{sign}{peso}{num}")
        }
    }
}

/// Formats a non-negative value with two decimal places and commas between thousands, rounding
/// half away from zero.
fn with_commas(num: Decimal) -> String {
    let fixed = format!(
        "{:.2}",
        num.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    );
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (ix, c) in int.chars().enumerate() {
        if ix > 0 && (int.len() - ix) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{grouped}.{frac}")
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// The backend sends amounts as strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
            StringOrNumber::Number(n) => {
                let amount = Amount::from_str(&n.to_string()).map_err(serde::de::Error::custom)?;
                Ok(Amount {
                    format: PLAIN_FORMAT,
                    ..amount
                })
            }
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
