//! Email (`.eml`) loading.

use mailparse::ParsedMail;
use tracing::debug;

use crate::error::{GrocerError, Result};

/// Return the HTML body of a raw MIME message.
///
/// Parts are searched depth first; the first `text/html` part wins. Transfer
/// encodings and charsets are decoded.
pub fn extract_html_body(raw: &[u8]) -> Result<String> {
    let mail = mailparse::parse_mail(raw).map_err(|e| GrocerError::Email(e.to_string()))?;

    match find_html_part(&mail) {
        Some(part) => {
            let body = part
                .get_body()
                .map_err(|e| GrocerError::Email(e.to_string()))?;
            debug!("Found HTML body of {} characters", body.len());
            Ok(body)
        }
        None => Err(GrocerError::Email("message has no text/html part".to_string())),
    }
}

fn find_html_part<'a, 'b>(part: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/html") {
        return Some(part);
    }
    part.subparts.iter().find_map(find_html_part)
}
