//! Purchased line items.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::amount::Amount;
use crate::error::{AmountError, ParseError};

/// One purchased line on a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Product name as printed.
    pub name: String,
    /// Number of units, always positive.
    pub qty: u32,
    /// Line price before any discount.
    pub price_without_discount: Amount,
    /// Accumulated discount; zero or negative.
    pub discount: Amount,
}

impl Item {
    /// Create an item; the discount starts at zero in the price's currency.
    pub fn new(name: impl Into<String>, qty: u32, price: Amount) -> Result<Self, ParseError> {
        let name = name.into();
        if qty == 0 {
            return Err(ParseError::InvalidQuantity {
                name,
                qty: qty.to_string(),
            });
        }
        let discount = Amount::zero_in(price.currency());
        Ok(Self {
            name,
            qty,
            price_without_discount: price,
            discount,
        })
    }

    /// Create an item from a quantity token as printed on the receipt.
    ///
    /// Receipts sometimes put something other than a count where the quantity
    /// should be (a weight, a blank cell). Anything that is not all digits
    /// counts as a single unit.
    pub fn from_token(name: impl Into<String>, qty: &str, price: Amount) -> Result<Self, ParseError> {
        let name = name.into();
        let token = qty.trim();
        let qty = if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            token.parse::<u32>().map_err(|_| ParseError::InvalidQuantity {
                name: name.clone(),
                qty: token.to_string(),
            })?
        } else {
            1
        };
        Self::new(name, qty, price)
    }

    /// Add to the running discount.
    pub fn add_discount(&mut self, discount: &Amount) -> Result<(), AmountError> {
        self.discount = self.discount.add(discount)?;
        Ok(())
    }

    /// Price after discounts.
    pub fn price(&self) -> Result<Amount, AmountError> {
        self.price_without_discount.add(&self.discount)
    }

    /// The same product as a single unit at the per-unit price and discount.
    pub fn with_qty_1(&self) -> Result<Item, AmountError> {
        if self.qty == 1 {
            return Ok(self.clone());
        }
        let qty = Decimal::from(self.qty);
        Ok(Item {
            name: self.name.clone(),
            qty: 1,
            price_without_discount: self.price_without_discount.divide(qty)?,
            discount: self.discount.divide(qty)?,
        })
    }

    /// Ordering used to lay out reports: case-insensitive name, then quantity.
    pub fn report_order(&self, other: &Item) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then(self.qty.cmp(&other.qty))
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let price = self.price().map_err(serde::ser::Error::custom)?;
        let mut state = serializer.serialize_struct("Item", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("qty", &self.qty)?;
        state.serialize_field("price", &price)?;
        state.end()
    }
}
