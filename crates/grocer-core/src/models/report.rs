//! Order reports: items plus the order-level shared cost.

use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::amount::Amount;
use super::item::Item;
use crate::error::{AmountError, Result};
use crate::export::{Cell, CsvSink, ReportSink};

/// A parsed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    items: Vec<Item>,
    /// Delivery, coupons and other costs not tied to one item.
    shared_cost: Amount,
}

impl Report {
    /// Build a report, sorting the items by name (case-insensitive) then quantity.
    pub fn new(items: impl IntoIterator<Item = Item>, shared_cost: impl Into<Amount>) -> Self {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort_by(|a, b| a.report_order(b));
        Self {
            items,
            shared_cost: shared_cost.into(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn shared_cost(&self) -> &Amount {
        &self.shared_cost
    }

    /// Every item repeated once per unit, each at its unit price.
    ///
    /// The sequence is finite (`total_item_qty` entries) and calling this again
    /// starts over.
    pub fn items_split_qty(&self) -> std::result::Result<impl Iterator<Item = Item>, AmountError> {
        let units = self
            .items
            .iter()
            .map(|item| Ok((item.with_qty_1()?, item.qty as usize)))
            .collect::<std::result::Result<Vec<_>, AmountError>>()?;

        Ok(units
            .into_iter()
            .flat_map(|(unit, qty)| std::iter::repeat_n(unit, qty)))
    }

    pub fn total_item_qty(&self) -> u32 {
        self.items.iter().map(|item| item.qty).sum()
    }

    /// Sum of item prices after item-level discounts.
    pub fn total_item_price(&self) -> std::result::Result<Amount, AmountError> {
        self.items
            .iter()
            .try_fold(Amount::zero(), |total, item| total.add(&item.price()?))
    }

    pub fn total_item_price_without_discounts(&self) -> std::result::Result<Amount, AmountError> {
        self.items
            .iter()
            .try_fold(Amount::zero(), |total, item| total.add(&item.price_without_discount))
    }

    pub fn total_item_discounts(&self) -> std::result::Result<Amount, AmountError> {
        self.items
            .iter()
            .try_fold(Amount::zero(), |total, item| total.add(&item.discount))
    }

    /// What the order cost in the end: item prices plus the shared cost.
    pub fn total_price(&self) -> std::result::Result<Amount, AmountError> {
        self.total_item_price()?.add(&self.shared_cost)
    }

    /// The report as spreadsheet rows.
    ///
    /// Layout: a `Shared cost` row, a `Name, Qty, Price` header, then one row
    /// per unit.
    pub fn to_rows(&self) -> std::result::Result<Vec<Vec<Cell>>, AmountError> {
        let mut rows = vec![
            vec![
                Cell::text("Shared cost"),
                Cell::Number(self.shared_cost.quantity()),
            ],
            vec![Cell::text("Name"), Cell::text("Qty"), Cell::text("Price")],
        ];

        for item in self.items_split_qty()? {
            rows.push(vec![
                Cell::Text(item.name.clone()),
                Cell::Number(Decimal::from(item.qty)),
                Cell::Number(item.price()?.quantity()),
            ]);
        }

        Ok(rows)
    }

    /// The report as CSV text, one row per unit.
    pub fn to_csv(&self) -> Result<String> {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_report(self)?;
        let data = String::from_utf8(sink.into_inner()?)
            .map_err(|e| crate::error::GrocerError::Io(std::io::Error::other(e)))?;
        Ok(data)
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let items: Vec<Item> = self
            .items_split_qty()
            .map_err(serde::ser::Error::custom)?
            .collect();
        let mut state = serializer.serialize_struct("Report", 2)?;
        state.serialize_field("items", &items)?;
        state.serialize_field("shared_cost", &self.shared_cost)?;
        state.end()
    }
}
