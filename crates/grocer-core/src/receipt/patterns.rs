//! Line and label patterns for the supported receipt layouts.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Selector;

// Sainsbury's PDF text dump
pub const ORDER_SUMMARY: &str = "Order summary";
pub const TOTAL_PAID: &str = "Total paid";
pub const DELIVERY_COST: &str = "Delivery cost";
pub const COUPONS: &str = "Coupons";

// Waitrose email
pub const YOUR_ORDER: &str = "Your Order";
pub const ORDER_SUMMARY_HEADING: &str = "Order Summary";
pub const ITEM_MARKER: &str = " ‡";

lazy_static! {
    // "Delivery summary (23 items)"
    pub static ref DELIVERY_SUMMARY: Regex = Regex::new(
        r"^Delivery summary \((\d+) items?\)$"
    ).unwrap();

    // A line holding only a price, e.g. "£2.50" or "-£1.00"
    pub static ref PRICE_LINE: Regex = Regex::new(
        r"^-?£\d+\.\d\d$"
    ).unwrap();

    // "3 Sainsbury's Bananas" -> quantity and name
    pub static ref QTY_PREFIX: Regex = Regex::new(
        r"^(\d+) (.*)$"
    ).unwrap();

    // "Subtotal (23 items)"
    pub static ref SUBTOTAL_LABEL: Regex = Regex::new(
        r"^Subtotal \((\d+) items?\)$"
    ).unwrap();

    // "2 x £1.50" -> "2"
    pub static ref QTY_SUFFIX: Regex = Regex::new(
        r" *x.*"
    ).unwrap();

    pub static ref TABLE: Selector = Selector::parse("table").unwrap();
    pub static ref ROW: Selector = Selector::parse("tr").unwrap();
    pub static ref CELL: Selector = Selector::parse("td").unwrap();
}
