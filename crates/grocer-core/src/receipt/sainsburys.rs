//! Sainsbury's order confirmations (text layer of the PDF).
//!
//! The text comes out as one cell per line:
//!
//! ```text
//! Delivery summary (5 items)
//! 2 Sainsbury's British Semi
//! Skimmed Milk 2.27L
//! £2.30
//! ...
//! Order summary
//! Subtotal (5 items)
//! Delivery cost
//! Coupons
//! £9.55
//! £0.50
//! -£1.00
//! Total paid
//! £8.55
//! ```
//!
//! Item names wrap over several lines and end at the price line. The order
//! summary table is rendered column by column: all labels first, then all
//! prices, so labels are queued and paired with prices in arrival order.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::patterns::*;
use super::reconcile::Reconciliation;
use super::{ParsedReceipt, ReceiptParser};
use crate::error::{ParseError, Result};
use crate::models::amount::Amount;
use crate::models::item::Item;
use crate::models::report::Report;

/// Figures from the Sainsbury's order summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SainsburysSummary {
    /// Item count from the "Delivery summary (N items)" heading.
    pub item_count: u32,
    /// Item count printed next to the subtotal.
    pub subtotal_item_count: u32,
    /// Subtotal; includes the delivery cost.
    pub subtotal: Amount,
    pub delivery: Amount,
    /// Sum of coupons; zero when none were used.
    pub coupons: Amount,
    pub total: Amount,
}

/// One non-blank line of the text dump.
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Price(Amount),
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn classify(line: &'a str, phase: &'static str) -> Result<Self> {
        if PRICE_LINE.is_match(line) {
            let price = Amount::from_string(line).map_err(|_| ParseError::MalformedAmount {
                phase,
                text: line.to_string(),
            })?;
            Ok(Line::Price(price))
        } else {
            Ok(Line::Text(line))
        }
    }
}

/// Parser for Sainsbury's PDF text.
#[derive(Debug, Default)]
pub struct SainsburysParser;

impl SainsburysParser {
    pub fn new() -> Self {
        Self
    }

    /// Skip to the item list heading and return the item count it announces.
    fn seek_item_list<'a>(&self, lines: &mut impl Iterator<Item = &'a str>) -> Result<u32> {
        for line in lines {
            if let Some(caps) = DELIVERY_SUMMARY.captures(line) {
                let count = caps[1].parse().map_err(|_| ParseError::UnexpectedLine {
                    phase: "item list heading",
                    line: line.to_string(),
                })?;
                debug!("Item list announces {} items", count);
                return Ok(count);
            }
            trace!("Skipping preamble line {:?}", line);
        }
        Err(ParseError::MissingSection("Delivery summary (N items)".to_string()).into())
    }

    /// Read items up to the "Order summary" marker.
    fn read_items<'a>(&self, lines: &mut impl Iterator<Item = &'a str>) -> Result<Vec<Item>> {
        const PHASE: &str = "item list";
        let mut items = Vec::new();
        let mut name_parts: Vec<&str> = Vec::new();

        loop {
            let line = lines.next().ok_or(ParseError::UnexpectedEnd(PHASE))?;
            if line == ORDER_SUMMARY {
                break;
            }

            match Line::classify(line, PHASE)? {
                Line::Price(price) => {
                    if name_parts.is_empty() {
                        return Err(ParseError::UnexpectedLine {
                            phase: PHASE,
                            line: line.to_string(),
                        }
                        .into());
                    }
                    let name = name_parts.join(" ");
                    name_parts.clear();

                    let item = match QTY_PREFIX.captures(&name) {
                        Some(caps) => Item::from_token(&caps[2], &caps[1], price)?,
                        None => Item::new(name.as_str(), 1, price)?,
                    };
                    trace!("Item {:?} x{} at {}", item.name, item.qty, item.price_without_discount);
                    items.push(item);
                }
                Line::Text(text) => name_parts.push(text),
            }
        }

        if !name_parts.is_empty() {
            return Err(ParseError::UnexpectedLine {
                phase: PHASE,
                line: name_parts.join(" "),
            }
            .into());
        }

        debug!("Read {} item lines", items.len());
        Ok(items)
    }

    /// Read the order summary table and the final total.
    fn read_summary<'a>(
        &self,
        lines: &mut impl Iterator<Item = &'a str>,
        item_count: u32,
    ) -> Result<SainsburysSummary> {
        const PHASE: &str = "order summary";
        let mut labels: VecDeque<&str> = VecDeque::new();
        let mut subtotal: Option<(Amount, u32)> = None;
        let mut delivery: Option<Amount> = None;
        let mut coupons = Amount::zero();

        loop {
            let line = lines.next().ok_or(ParseError::UnexpectedEnd(PHASE))?;
            if line == TOTAL_PAID {
                break;
            }

            let price = match Line::classify(line, PHASE)? {
                Line::Text(label) => {
                    labels.push_back(label);
                    continue;
                }
                Line::Price(price) => price,
            };

            let label = labels.pop_front().ok_or_else(|| ParseError::UnexpectedLine {
                phase: PHASE,
                line: line.to_string(),
            })?;
            trace!("Summary {:?} = {}", label, price);

            if label == DELIVERY_COST {
                if delivery.replace(price).is_some() {
                    return Err(duplicate(label));
                }
            } else if label == COUPONS {
                coupons = coupons.add(&price)?;
            } else if let Some(caps) = SUBTOTAL_LABEL.captures(label) {
                let count = caps[1].parse().map_err(|_| ParseError::UnexpectedLine {
                    phase: PHASE,
                    line: label.to_string(),
                })?;
                if subtotal.replace((price, count)).is_some() {
                    return Err(duplicate(label));
                }
            } else {
                return Err(ParseError::UnknownLabel {
                    phase: PHASE,
                    label: label.to_string(),
                }
                .into());
            }
        }

        if !labels.is_empty() {
            return Err(ParseError::RowShape {
                phase: PHASE,
                reason: format!("labels without a price: {:?}", labels),
            }
            .into());
        }

        let total_line = lines.next().ok_or(ParseError::UnexpectedEnd("total paid"))?;
        let total = match Line::classify(total_line, "total paid")? {
            Line::Price(total) => total,
            Line::Text(text) => {
                return Err(ParseError::UnexpectedLine {
                    phase: "total paid",
                    line: text.to_string(),
                }
                .into());
            }
        };

        let (subtotal, subtotal_item_count) =
            subtotal.ok_or(ParseError::MissingField("subtotal"))?;
        let delivery = delivery.ok_or(ParseError::MissingField("delivery cost"))?;

        if subtotal_item_count != item_count {
            warn!(
                "Subtotal counts {} items but the item list announced {}",
                subtotal_item_count, item_count
            );
        }

        Ok(SainsburysSummary {
            item_count,
            subtotal_item_count,
            subtotal,
            delivery,
            coupons,
            total,
        })
    }
}

fn duplicate(label: &str) -> crate::error::GrocerError {
    ParseError::RowShape {
        phase: "order summary",
        reason: format!("{:?} appears twice", label),
    }
    .into()
}

impl ReceiptParser for SainsburysParser {
    type Summary = SainsburysSummary;

    fn parse(&self, text: &str) -> Result<ParsedReceipt<SainsburysSummary>> {
        info!("Parsing Sainsbury's receipt from {} characters of text", text.len());

        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        let item_count = self.seek_item_list(&mut lines)?;
        let items = self.read_items(&mut lines)?;
        let summary = self.read_summary(&mut lines, item_count)?;

        let shared_cost = summary.coupons.add(&summary.delivery)?;
        let report = Report::new(items, shared_cost);

        let mut checks = Reconciliation::new();
        checks
            .amounts(
                "subtotal equals item prices plus delivery",
                &summary.subtotal,
                &report.total_item_price()?.add(&summary.delivery)?,
            )?
            .amounts(
                "total equals subtotal plus coupons",
                &summary.total,
                &summary.subtotal.add(&summary.coupons)?,
            )?
            .counts("item count", summary.item_count, report.total_item_qty())?
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AmountError, GrocerError};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const RECEIPT: &str = r#"
        Sainsbury's Online
        Order number 1234567

        Delivery summary (5 items)
        2 Sainsbury's British Semi
        Skimmed Milk 2.27L
        £2.30
        Hovis Soft White Medium
        Bread 800g
        £1.40
        JS Bananas Loose
        £0.85
        Lurpak Spreadable
        Slightly Salted 500g
        £4.50

        Order summary
        Subtotal (5 items)
        Delivery cost
        Coupons
        £9.55
        £0.50
        -£1.00
        Total paid
        £8.55
    "#;

    fn pounds(pence: i64) -> Amount {
        Amount::new(Decimal::new(pence, 2), "£")
    }

    #[test]
    fn test_parse_receipt() {
        let parsed = SainsburysParser::new().parse(RECEIPT).unwrap();
        let report = &parsed.report;

        let names: Vec<&str> = report.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Hovis Soft White Medium Bread 800g",
                "JS Bananas Loose",
                "Lurpak Spreadable Slightly Salted 500g",
                "Sainsbury's British Semi Skimmed Milk 2.27L",
            ]
        );
        assert_eq!(report.items()[3].qty, 2);
        assert_eq!(report.total_item_qty(), 5);
        assert_eq!(report.shared_cost(), &pounds(-50));
        assert_eq!(report.total_price().unwrap(), pounds(855));

        assert_eq!(parsed.summary.subtotal, pounds(955));
        assert_eq!(parsed.summary.delivery, pounds(50));
        assert_eq!(parsed.summary.coupons, pounds(-100));
        assert_eq!(parsed.summary.subtotal_item_count, 5);
        assert_eq!(parsed.checks.len(), 4);
    }

    #[test]
    fn test_no_coupons() {
        let text = RECEIPT
            .replace("        Coupons\n", "")
            .replace("        -£1.00\n", "")
            .replace("Total paid\n        £8.55", "Total paid\n        £9.55");
        let parsed = SainsburysParser::new().parse(&text).unwrap();
        assert!(parsed.summary.coupons.is_zero());
        assert_eq!(parsed.report.shared_cost(), &pounds(50));
    }

    #[test]
    fn test_price_off_by_a_penny_fails() {
        let text = RECEIPT.replace("£1.40", "£1.41");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        match err {
            GrocerError::Reconciliation(e) => {
                assert_eq!(e.check, "subtotal equals item prices plus delivery");
                assert_eq!(e.declared, "£9.55");
                assert_eq!(e.derived, "£9.56");
            }
            other => panic!("expected reconciliation error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_item_count_fails() {
        let text = RECEIPT.replace("Delivery summary (5 items)", "Delivery summary (6 items)");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(err, GrocerError::Reconciliation(e) if e.check == "item count"));
    }

    #[test]
    fn test_missing_heading() {
        let text = RECEIPT.replace("Delivery summary (5 items)", "Your items");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(err, GrocerError::Parse(ParseError::MissingSection(_))));
    }

    #[test]
    fn test_unknown_summary_label() {
        let text = RECEIPT.replace("Coupons", "Bag charge");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: unknown label in order summary: \"Bag charge\""
        );
    }

    #[test]
    fn test_unpaired_summary_label() {
        let text = RECEIPT.replace("        -£1.00\n", "");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(err, GrocerError::Parse(ParseError::RowShape { .. })));
    }

    #[test]
    fn test_price_without_name() {
        let text = RECEIPT.replace("JS Bananas Loose\n", "");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(
            err,
            GrocerError::Parse(ParseError::UnexpectedLine { phase: "item list", .. })
        ));
    }

    #[test]
    fn test_truncated_text() {
        let cut = RECEIPT.find("Order summary").unwrap();
        let err = SainsburysParser::new().parse(&RECEIPT[..cut]).unwrap_err();
        assert!(matches!(err, GrocerError::Parse(ParseError::UnexpectedEnd("item list"))));

        let cut = RECEIPT.find("Total paid").unwrap();
        let err = SainsburysParser::new().parse(&RECEIPT[..cut]).unwrap_err();
        assert!(matches!(err, GrocerError::Parse(ParseError::UnexpectedEnd("order summary"))));
    }

    #[test]
    fn test_missing_delivery() {
        let text = RECEIPT
            .replace("        Delivery cost\n", "")
            .replace("        £0.50\n", "");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(err, GrocerError::Parse(ParseError::MissingField("delivery cost"))));
    }

    #[test]
    fn test_repeated_delivery_cost() {
        let text = RECEIPT.replace("        Coupons\n", "        Delivery cost\n");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        match err {
            GrocerError::Parse(ParseError::RowShape { phase, reason }) => {
                assert_eq!(phase, "order summary");
                assert_eq!(reason, "\"Delivery cost\" appears twice");
            }
            other => panic!("expected a shape error, got {other}"),
        }
    }

    #[test]
    fn test_repeated_subtotal() {
        let text = RECEIPT.replace("        Delivery cost\n", "        Subtotal (5 items)\n");
        let err = SainsburysParser::new().parse(&text).unwrap_err();
        assert!(matches!(
            err,
            GrocerError::Parse(ParseError::RowShape { ref reason, .. }) if reason.contains("Subtotal")
        ));
    }

    #[test]
    fn test_huge_prices_fail_cleanly() {
        let text = "\
Delivery summary (2 items)
Caviar Tin
£50000000000000000000000000000.00
Truffle Oil
£50000000000000000000000000000.00
Order summary
Subtotal (2 items)
Delivery cost
£1.00
£0.50
Total paid
£1.50
";
        let err = SainsburysParser::new().parse(text).unwrap_err();
        assert!(matches!(err, GrocerError::Amount(AmountError::Overflow)));
    }
}
