//! Currency-tagged decimal amounts.
//!
//! An [`Amount`] pairs a decimal quantity with an optional currency tag such as
//! `£` or `USD`. Arithmetic refuses to mix two different currencies; an amount
//! without a currency (a plain number, or a zero produced by summing nothing)
//! adopts the currency of the other operand.
//!
//! Equality and ordering are tolerant: two quantities that differ only by
//! rounding noise (for example after dividing a line price by its quantity)
//! compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountError;

lazy_static! {
    // [sign][currency] number [currency], e.g. "-£3.50", "12.00 USD", "£1,234.00"
    static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"^\s*(-)?([€$£]|[a-zA-Z]+)?\s*((?:-\s?)?[0-9.,]+)\s*([€$£]|[a-zA-Z]+)?\s*$"
    ).unwrap();

    static ref RELATIVE_TOLERANCE: Decimal = Decimal::new(1, 9);
    static ref ABSOLUTE_TOLERANCE: Decimal = Decimal::new(1, 12);
}

/// A decimal quantity with an optional currency.
#[derive(Debug, Clone, Default)]
pub struct Amount {
    quantity: Decimal,
    currency: Option<String>,
}

impl Amount {
    /// Create an amount in the given currency.
    pub fn new(quantity: Decimal, currency: impl Into<String>) -> Self {
        Self {
            quantity,
            currency: Some(currency.into().trim().to_string()),
        }
    }

    /// A unit-less zero. Adding it to anything returns the other operand.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A zero in the given currency (or unit-less when `None`).
    pub fn zero_in(currency: Option<&str>) -> Self {
        Self {
            quantity: Decimal::ZERO,
            currency: currency.map(|c| c.trim().to_string()),
        }
    }

    /// Create a unit-less amount from a plain number.
    pub fn from_number(quantity: Decimal) -> Self {
        Self {
            quantity,
            currency: None,
        }
    }

    /// Create an amount from text such as `"£3.50"`, failing if it does not parse.
    pub fn from_string(text: &str) -> Result<Self, AmountError> {
        Self::parse(text).ok_or_else(|| AmountError::Malformed(text.to_string()))
    }

    /// Copy another amount.
    pub fn copy_of(other: &Amount) -> Self {
        other.clone()
    }

    /// Replace the currency, whatever the value carried before.
    pub fn with_currency(mut self, currency: impl AsRef<str>) -> Self {
        self.currency = Some(currency.as_ref().trim().to_string());
        self
    }

    /// Parse a currency amount.
    ///
    /// Accepts an optional leading `-`, then a currency symbol (`€`, `$`, `£`)
    /// or alphabetic code either before or after the number. Commas in the
    /// number are thousands separators and are dropped. Returns `None` when the
    /// whole (trimmed) text is not of that form.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = AMOUNT_PATTERN.captures(text)?;

        let number: String = caps[3]
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        let quantity = Decimal::from_str(&number).ok()?;

        let currency = caps
            .get(2)
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string());

        let amount = Self { quantity, currency };
        if caps.get(1).is_some() {
            Some(-amount)
        } else {
            Some(amount)
        }
    }

    /// The decimal quantity.
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// The currency tag, if any.
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// The currency a binary operation between `self` and `other` produces.
    fn common_currency(&self, other: &Amount) -> Result<Option<String>, AmountError> {
        match (&self.currency, &other.currency) {
            (Some(left), Some(right)) if left != right => Err(AmountError::DifferentCurrency {
                left: Some(left.clone()),
                right: Some(right.clone()),
            }),
            (Some(currency), _) | (None, Some(currency)) => Ok(Some(currency.clone())),
            (None, None) => Ok(None),
        }
    }

    /// Add two amounts.
    ///
    /// A zero operand is unit-agnostic: the other operand is returned as is,
    /// even if it carries a different currency.
    pub fn add(&self, other: &Amount) -> Result<Amount, AmountError> {
        if self.is_zero() {
            return Ok(other.clone());
        }
        if other.is_zero() {
            return Ok(self.clone());
        }
        let currency = self.common_currency(other)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount { quantity, currency })
    }

    /// Add a plain number, read as being in this amount's currency.
    pub fn add_number(&self, number: Decimal) -> Result<Amount, AmountError> {
        let quantity = self
            .quantity
            .checked_add(number)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount {
            quantity,
            currency: self.currency.clone(),
        })
    }

    pub fn subtract(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.add(&other.negate())
    }

    pub fn negate(&self) -> Amount {
        Amount {
            quantity: -self.quantity,
            currency: self.currency.clone(),
        }
    }

    /// Divide by a scalar.
    pub fn divide(&self, divisor: Decimal) -> Result<Amount, AmountError> {
        let quantity = self
            .quantity
            .checked_div(divisor)
            .ok_or(AmountError::DivisionByZero)?;
        Ok(Amount {
            quantity,
            currency: self.currency.clone(),
        })
    }

    pub fn abs(&self) -> Amount {
        if self.compare_number(Decimal::ZERO) == Ordering::Less {
            self.negate()
        } else {
            self.clone()
        }
    }

    /// Order two amounts of compatible currency.
    pub fn compare_to(&self, other: &Amount) -> Result<Ordering, AmountError> {
        self.common_currency(other)?;
        Ok(compare_quantities(self.quantity, other.quantity))
    }

    /// Order against a unit-less number.
    pub fn compare_number(&self, number: Decimal) -> Ordering {
        compare_quantities(self.quantity, number)
    }

    /// Tolerant equality against a unit-less number.
    pub fn eq_number(&self, number: Decimal) -> bool {
        self.compare_number(number) == Ordering::Equal
    }
}

/// The single tolerance primitive behind every comparison.
fn compare_quantities(a: Decimal, b: Decimal) -> Ordering {
    // Only overflows when the two are far apart
    let Some(diff) = a.checked_sub(b).map(|d| d.abs()) else {
        return a.cmp(&b);
    };
    let magnitude = a.abs().max(b.abs());
    if diff <= magnitude * *RELATIVE_TOLERANCE || diff <= *ABSOLUTE_TOLERANCE {
        Ordering::Equal
    } else {
        a.cmp(&b)
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare_to(other), Ok(Ordering::Equal))
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare_to(other).ok()
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        self.negate()
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        self.negate()
    }
}

impl From<Decimal> for Amount {
    fn from(quantity: Decimal) -> Self {
        Self::from_number(quantity)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .quantity
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        match &self.currency {
            Some(currency) => write!(f, "{}{:.2}", currency, rounded),
            None => write!(f, "{:.2}", rounded),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Amount::from_string(&text).map_err(serde::de::Error::custom)
    }
}
