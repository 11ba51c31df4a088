use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const WAITROSE_EML: &str = "\
From: Waitrose <customerservice@waitrose.example>
To: shopper@example.com
Subject: Your order confirmation
MIME-Version: 1.0
Content-Type: text/html; charset=utf-8
Content-Transfer-Encoding: 8bit

<html><body>
<p>Your Order</p>
<table><tr><td>
<table><tr><td>Qty</td><td>Price</td></tr></table>
<table><tr><td></td><td>Sourdough, Large</td><td>1</td><td>£2.50</td></tr></table>
<table><tr><td></td><td>Apples</td><td>2 x £0.60</td><td>£1.20</td></tr></table>
</td></tr></table>
<table>
<tr><td>Order Summary</td></tr>
<tr><td>Number of Items:</td><td>3</td></tr>
<tr><td>Subtotal:</td><td>£3.70</td></tr>
<tr><td>Delivery:</td><td>£1.00</td></tr>
<tr><td>Total:</td><td>£4.70</td></tr>
</table>
</body></html>
";

fn grocer() -> Command {
    let mut cmd = Command::cargo_bin("grocer").unwrap();
    // Keep the user's own config out of the way
    cmd.env("XDG_CONFIG_HOME", std::env::temp_dir().join("grocer-cli-tests"));
    cmd
}

#[test]
fn test_process_eml_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.eml");
    fs::write(&input, WAITROSE_EML).unwrap();

    grocer()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            "Shared cost,1\n\
             Name,Qty,Price\n\
             Apples,1,0.6\n\
             Apples,1,0.6\n\
             Sourdough Large,1,2.5\n",
        );
}

#[test]
fn test_process_json_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.eml");
    let output = dir.path().join("report.json");
    fs::write(&input, WAITROSE_EML).unwrap();

    grocer()
        .args(["process", "--format", "json", "--output"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["shared_cost"], "£1.00");
    assert_eq!(json["items"].as_array().unwrap().len(), 3);
}

#[test]
fn test_process_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.eml");
    fs::write(&input, WAITROSE_EML).unwrap();

    grocer()
        .args(["process", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total:        £4.70"));
}

#[test]
fn test_reconciliation_failure_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.eml");
    fs::write(&input, WAITROSE_EML.replace("£4.70", "£4.80")).unwrap();

    grocer()
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("total equals report total"));
}

#[test]
fn test_unknown_vendor() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.txt");
    fs::write(&input, "hello").unwrap();

    grocer()
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--vendor"));
}

#[test]
fn test_missing_input() {
    grocer()
        .args(["process", "/nonexistent/order.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    grocer()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    grocer()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    grocer()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"min_text_length\": 50"));
}

#[test]
fn test_config_delimiter_applies_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("order.eml");
    let config = dir.path().join("config.json");
    fs::write(&input, WAITROSE_EML).unwrap();
    fs::write(&config, r#"{"export": {"delimiter": ";"}}"#).unwrap();

    grocer()
        .arg("-c")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Shared cost;1\n"));
}
