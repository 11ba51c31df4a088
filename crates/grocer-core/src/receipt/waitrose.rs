//! Waitrose order confirmation emails (HTML body).
//!
//! The order is a table following the "Your Order" heading, holding one nested
//! table per item: a four-cell row (image, name, quantity, price) and an
//! optional three-cell row with the offer that applied to it. The "Order
//! Summary" table is a list of label/value rows read top to bottom.

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::patterns::*;
use super::reconcile::Reconciliation;
use super::{ParsedReceipt, ReceiptParser};
use crate::error::{ParseError, Result};
use crate::models::amount::Amount;
use crate::models::item::Item;
use crate::models::report::Report;

/// Figures from the Waitrose order summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitroseSummary {
    pub item_count: u32,
    /// Subtotal before any discount.
    pub subtotal: Amount,
    /// Item-level offers; zero when none applied.
    pub offers: Amount,
    /// Order-level savings (savings and promotion discounts minus offers).
    pub discounts: Amount,
    pub delivery: Amount,
    pub total: Amount,
}

/// Fields of the order summary, keyed by their label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryField {
    Heading,
    ItemCount,
    Subtotal,
    Savings,
    PromotionDiscount,
    Offers,
    Delivery,
    Total,
}

/// What a label does to the open savings/discount group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupEffect {
    /// Start a group; blank-labeled rows after it are discounts.
    Open,
    /// Leave the current group as it is.
    Keep,
    /// End the current group.
    Close,
}

const SUMMARY_LABELS: &[(&str, SummaryField, GroupEffect)] = &[
    ("Order Summary", SummaryField::Heading, GroupEffect::Close),
    ("Number of Items:", SummaryField::ItemCount, GroupEffect::Close),
    ("Subtotal:", SummaryField::Subtotal, GroupEffect::Close),
    ("Your savings", SummaryField::Savings, GroupEffect::Open),
    ("Promotion Discount:", SummaryField::PromotionDiscount, GroupEffect::Open),
    ("Offers:", SummaryField::Offers, GroupEffect::Keep),
    ("Delivery:", SummaryField::Delivery, GroupEffect::Close),
    ("Total:", SummaryField::Total, GroupEffect::Close),
];

fn lookup_label(label: &str) -> Option<(SummaryField, GroupEffect)> {
    SUMMARY_LABELS
        .iter()
        .find(|(known, _, _)| *known == label)
        .map(|(_, field, effect)| (*field, *effect))
}

/// Summary fields as they are read.
#[derive(Debug, Default)]
struct SummaryState {
    item_count: Option<u32>,
    subtotal: Option<Amount>,
    offers: Option<Amount>,
    delivery: Option<Amount>,
    total: Option<Amount>,
    discounts: Amount,
    open_group: Option<SummaryField>,
}

impl SummaryState {
    fn finish(self) -> Result<WaitroseSummary> {
        Ok(WaitroseSummary {
            item_count: self.item_count.ok_or(ParseError::MissingField("number of items"))?,
            subtotal: self.subtotal.ok_or(ParseError::MissingField("subtotal"))?,
            offers: self.offers.unwrap_or_default(),
            discounts: self.discounts,
            delivery: self.delivery.ok_or(ParseError::MissingField("delivery"))?,
            total: self.total.ok_or(ParseError::MissingField("total"))?,
        })
    }
}

/// Parser for Waitrose HTML emails.
#[derive(Debug, Default)]
pub struct WaitroseParser;

impl WaitroseParser {
    pub fn new() -> Self {
        Self
    }

    /// Read one item table.
    fn read_item(&self, table: ElementRef<'_>) -> Result<Item> {
        const PHASE: &str = "order items";
        let rows: Vec<ElementRef<'_>> = table.select(&ROW).collect();
        if rows.is_empty() || rows.len() > 2 {
            return Err(ParseError::RowShape {
                phase: PHASE,
                reason: format!("item table has {} rows, expected 1 or 2", rows.len()),
            }
            .into());
        }

        let cells = cells_of(rows[0], 4, PHASE)?;
        let name = cell_text(cells[1]).replace(ITEM_MARKER, "");
        let qty_text = cell_text(cells[2]);
        let qty = QTY_SUFFIX.replace(&qty_text, "");
        let price = amount_in(cells[3], PHASE)?;
        let mut item = Item::from_token(name.trim(), &qty, price)?;

        if let Some(offer_row) = rows.get(1) {
            let cells = cells_of(*offer_row, 3, PHASE)?;
            let discount = amount_in(cells[2], PHASE)?;
            trace!("Offer {:?} of {} on {:?}", cell_text(cells[1]), discount, item.name);
            item.add_discount(&discount)?;
        }

        trace!("Item {:?} x{} at {}", item.name, item.qty, item.price_without_discount);
        Ok(item)
    }

    /// Read the item tables following the "Your Order" heading.
    fn read_items(&self, document: &Html) -> Result<Vec<Item>> {
        let heading = unique_text_parent(document, YOUR_ORDER)?;
        let order_table = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "table")
            .ok_or_else(|| ParseError::MissingSection(format!("table after {:?}", YOUR_ORDER)))?;

        let mut tables = order_table.select(&TABLE).peekable();
        while tables.next_if(|t| is_column_header(*t)).is_some() {
            trace!("Skipping column header table");
        }

        let items = tables
            .map(|table| self.read_item(table))
            .collect::<Result<Vec<_>>>()?;
        if items.is_empty() {
            return Err(ParseError::MissingSection("order item tables".to_string()).into());
        }

        debug!("Read {} item tables", items.len());
        Ok(items)
    }

    /// Walk the "Order Summary" table row by row.
    fn read_summary(&self, document: &Html) -> Result<WaitroseSummary> {
        const PHASE: &str = "order summary";
        let heading = unique_text_parent(document, ORDER_SUMMARY_HEADING)?;
        let table = std::iter::once(heading)
            .chain(heading.ancestors().filter_map(ElementRef::wrap))
            .find(|e| e.value().name() == "table")
            .ok_or_else(|| {
                ParseError::MissingSection(format!("table around {:?}", ORDER_SUMMARY_HEADING))
            })?;

        let mut state = SummaryState::default();

        for row in table.select(&ROW) {
            let Some(label_cell) = row.select(&CELL).next() else {
                trace!("Skipping row without cells");
                continue;
            };
            let label = cell_text(label_cell);
            let value_cell = || {
                label_cell
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == "td")
                    .ok_or_else(|| ParseError::RowShape {
                        phase: PHASE,
                        reason: format!("no value next to {:?}", label),
                    })
            };

            if label.is_empty() {
                let amount = amount_in(value_cell()?, PHASE)?;
                if state.open_group.is_none() {
                    return Err(ParseError::UnexpectedLine {
                        phase: PHASE,
                        line: format!("unlabeled amount {}", amount),
                    }
                    .into());
                }
                trace!("Discount {} in {:?}", amount, state.open_group);
                state.discounts = state.discounts.add(&amount)?;
                continue;
            }

            let Some((field, effect)) = lookup_label(&label) else {
                if state.open_group.is_some() {
                    trace!("Skipping {:?} inside {:?}", label, state.open_group);
                    continue;
                }
                return Err(ParseError::UnknownLabel {
                    phase: PHASE,
                    label,
                }
                .into());
            };

            match effect {
                GroupEffect::Open => state.open_group = Some(field),
                GroupEffect::Close => state.open_group = None,
                GroupEffect::Keep => {}
            }

            match field {
                SummaryField::Heading | SummaryField::Savings | SummaryField::PromotionDiscount => {}
                SummaryField::ItemCount => {
                    let text = cell_text(value_cell()?);
                    let count = text.parse().map_err(|_| ParseError::UnexpectedLine {
                        phase: PHASE,
                        line: format!("{} {}", label, text),
                    })?;
                    state.item_count = Some(count);
                }
                SummaryField::Subtotal => state.subtotal = Some(amount_in(value_cell()?, PHASE)?),
                SummaryField::Offers => {
                    let offers = amount_in(value_cell()?, PHASE)?;
                    // Offers are already in the item prices but are also listed under savings.
                    state.discounts = state.discounts.subtract(&offers)?;
                    state.offers = Some(offers);
                }
                SummaryField::Delivery => state.delivery = Some(amount_in(value_cell()?, PHASE)?),
                SummaryField::Total => state.total = Some(amount_in(value_cell()?, PHASE)?),
            }
            trace!("Summary {:?} -> {:?}", label, field);
        }

        state.finish()
    }
}

impl ReceiptParser for WaitroseParser {
    type Summary = WaitroseSummary;

    fn parse(&self, html: &str) -> Result<ParsedReceipt<WaitroseSummary>> {
        info!("Parsing Waitrose receipt from {} characters of HTML", html.len());
        let document = Html::parse_document(html);

        let items = self.read_items(&document)?;
        let summary = self.read_summary(&document)?;

        let shared_cost = summary.discounts.add(&summary.delivery)?;
        let report = Report::new(items, shared_cost);

        let mut checks = Reconciliation::new();
        checks
            .counts("item count", summary.item_count, report.total_item_qty())?
            .amounts(
                "subtotal equals undiscounted item prices",
                &summary.subtotal,
                &report.total_item_price_without_discounts()?,
            )?
            .amounts(
                "offers equal item discounts",
                &summary.offers,
                &report.total_item_discounts()?,
            )?
            .amounts(
                "subtotal plus offers equals item prices",
                &summary.subtotal.add(&summary.offers)?,
                &report.total_item_price()?,
            )?
            .amounts("total equals report total", &summary.total, &report.total_price()?)?;

        info!(
            "Parsed {} items ({} units), total {}",
            report.items().len(),
            report.total_item_qty(),
            summary.total
        );

        Ok(ParsedReceipt {
            report,
            summary,
            checks: checks.finish(),
        })
    }
}

/// The element holding the only text node that contains `marker`.
fn unique_text_parent<'a>(document: &'a Html, marker: &str) -> Result<ElementRef<'a>> {
    let parents: Vec<ElementRef<'a>> = document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().as_text().is_some_and(|text| text.contains(marker)))
        .filter_map(|node| node.parent().and_then(ElementRef::wrap))
        .collect();

    match parents.as_slice() {
        [parent] => Ok(*parent),
        [] => Err(ParseError::MissingSection(marker.to_string()).into()),
        _ => Err(ParseError::RowShape {
            phase: "section headings",
            reason: format!("{:?} appears {} times", marker, parents.len()),
        }
        .into()),
    }
}

/// A table that only holds the "Qty"/"Price" column headings.
fn is_column_header(table: ElementRef<'_>) -> bool {
    let strings: Vec<&str> = table
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    strings == ["Qty", "Price"]
}

/// Cell text with runs of whitespace collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn cells_of<'a>(row: ElementRef<'a>, expected: usize, phase: &'static str) -> Result<Vec<ElementRef<'a>>> {
    let cells: Vec<ElementRef<'a>> = row.select(&CELL).collect();
    if cells.len() != expected {
        return Err(ParseError::RowShape {
            phase,
            reason: format!("row has {} cells, expected {}", cells.len(), expected),
        }
        .into());
    }
    Ok(cells)
}

fn amount_in(cell: ElementRef<'_>, phase: &'static str) -> Result<Amount> {
    let text = cell_text(cell);
    Amount::from_string(&text).map_err(|_| ParseError::MalformedAmount { phase, text }.into())
}
