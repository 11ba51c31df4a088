//! End-to-end tests: vendor documents in, reconciled reports and exports out.

use std::io::Write;

use grocer_core::receipt::WaitroseSummary;
use grocer_core::{
    load_receipt, Amount, CsvSink, GrocerError, ReceiptParser, ReportSink, RowSink,
    SainsburysParser, Vendor,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const SAINSBURYS_TEXT: &str = "\
Your order
Delivery summary (4 items)
2 Sainsbury's Semi Skimmed
Milk 2.27L
£2.30
Hovis Soft White
Medium Bread 800g
£1.40
JS Frozen Peas, Garden
£1.10
Order summary
Subtotal (4 items)
Delivery cost
Coupons
£5.80
£1.00
-£0.50
Total paid
£5.30
";

const WAITROSE_EML: &str = "\
From: Waitrose <customerservice@waitrose.example>
To: shopper@example.com
Subject: Your order confirmation
MIME-Version: 1.0
Content-Type: multipart/alternative; boundary=\"XYZ\"

--XYZ
Content-Type: text/plain; charset=utf-8

Thanks for your order.
--XYZ
Content-Type: text/html; charset=utf-8
Content-Transfer-Encoding: 8bit

<html><body>
<p>Your Order</p>
<table><tr><td>
<table><tr><td>Qty</td><td>Price</td></tr></table>
<table><tr><td></td><td>Duchy Organic Milk</td><td>2 x £1.20</td><td>£2.40</td></tr></table>
<table><tr><td></td><td>Lemons ‡</td><td>3</td><td>£0.90</td></tr>
<tr><td></td><td>Offer</td><td>-£0.10</td></tr></table>
</td></tr></table>
<table>
<tr><td>Order Summary</td></tr>
<tr><td>Number of Items:</td><td>5</td></tr>
<tr><td>Subtotal:</td><td>£3.30</td></tr>
<tr><td>Your savings</td></tr>
<tr><td>Offers:</td><td>-£0.10</td></tr>
<tr><td></td><td>-£0.10</td></tr>
<tr><td>Delivery:</td><td>£2.00</td></tr>
<tr><td>Total:</td><td>£5.20</td></tr>
</table>
</body></html>
--XYZ--
";

fn pounds(quantity: rust_decimal::Decimal) -> Amount {
    Amount::new(quantity, "£")
}

#[test]
fn test_sainsburys_text_to_csv() {
    let parsed = SainsburysParser::new().parse(SAINSBURYS_TEXT).unwrap();
    let report = parsed.report;

    assert_eq!(report.total_item_qty(), 4);
    assert_eq!(report.shared_cost(), &pounds(dec!(0.50)));
    assert_eq!(report.total_price().unwrap(), pounds(dec!(5.30)));

    let mut sink = CsvSink::new(Vec::new());
    sink.write_report(&report).unwrap();
    let csv = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(
        csv,
        "Shared cost,0.5\n\
         Name,Qty,Price\n\
         Hovis Soft White Medium Bread 800g,1,1.4\n\
         JS Frozen Peas Garden,1,1.1\n\
         Sainsbury's Semi Skimmed Milk 2.27L,1,1.15\n\
         Sainsbury's Semi Skimmed Milk 2.27L,1,1.15\n"
    );
}

#[test]
fn test_sainsburys_wrong_total_is_rejected() {
    let text = SAINSBURYS_TEXT.replace("£5.30", "£5.40");
    let err = SainsburysParser::new().parse(&text).unwrap_err();
    match err {
        GrocerError::Reconciliation(e) => {
            assert_eq!(e.check, "total equals subtotal plus coupons");
            assert_eq!(e.declared, "£5.40");
            assert_eq!(e.derived, "£5.30");
        }
        other => panic!("expected a reconciliation error, got {other}"),
    }
}

#[test]
fn test_waitrose_eml_file() {
    let mut file = tempfile::Builder::new().suffix(".eml").tempfile().unwrap();
    file.write_all(WAITROSE_EML.as_bytes()).unwrap();

    let vendor = Vendor::from_path(file.path()).unwrap();
    assert_eq!(vendor, Vendor::Waitrose);

    let report = load_receipt(file.path(), vendor, 50).unwrap();
    assert_eq!(report.total_item_qty(), 5);
    assert_eq!(report.total_item_price().unwrap(), pounds(dec!(3.20)));
    assert_eq!(report.shared_cost(), &pounds(dec!(2.00)));
    assert_eq!(report.total_price().unwrap(), pounds(dec!(5.20)));

    let mut sink = RowSink::new();
    sink.write_report(&report).unwrap();
    let rows = sink.into_rows();
    assert_eq!(rows.len(), 2 + 5);
    assert_eq!(rows[2][0].to_string(), "Duchy Organic Milk");
    assert_eq!(rows[4][0].to_string(), "Lemons");
}

#[test]
fn test_waitrose_summary_serializes() {
    let html_start = WAITROSE_EML.find("<html>").unwrap();
    let html_end = WAITROSE_EML.find("</html>").unwrap() + "</html>".len();
    let html = &WAITROSE_EML[html_start..html_end];

    let parsed = grocer_core::WaitroseParser::new().parse(html).unwrap();
    let summary: &WaitroseSummary = &parsed.summary;
    let json = serde_json::to_value(summary).unwrap();
    assert_eq!(json["item_count"], 5);
    assert_eq!(json["total"], "£5.20");
    assert_eq!(json["discounts"], "£0.00");
}
