//! Response interpretation: status literal matching and receipt extraction.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, warn};

use super::revision::ResponseRule;

/// Receipt label followed by POS id, `yy-MM-dd` date and `HH:mm:ss` time.
static IDENT_TPA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Ident\. TPA:\s*(\d+)\s*(\d{2}-\d{2}-\d{2})\s*(\d{2}:\d{2}:\d{2})")
        .expect("receipt pattern is valid")
});

/// Format of the date and time captured from the receipt.
const RECEIPT_DATETIME_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// Character offset where the receipt body starts in a purchase response.
pub const RECEIPT_BODY_OFFSET: usize = 29;

/// Whether the text, from `rule.offset` characters on, starts with the expected literal.
pub fn is_success(text: &str, rule: &ResponseRule) -> bool {
    let mut chars = text.chars();
    for _ in 0..rule.offset {
        if chars.next().is_none() {
            return false;
        }
    }
    chars.as_str().starts_with(rule.expected.as_str())
}

/// Receipt metadata embedded in a purchase response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub pos_identification: String,
    pub receipt_date: Option<NaiveDateTime>,
    pub receipt_body: String,
}

/// Extract POS id, receipt timestamp and body from a purchase response.
///
/// No match means the terminal prints the receipt itself; the result is
/// then empty, which is not an error.
pub fn parse_receipt(text: &str) -> ReceiptInfo {
    let Some(caps) = IDENT_TPA.captures(text) else {
        debug!("No receipt metadata in response, receipt printed on terminal");
        return ReceiptInfo::default();
    };

    let pos_identification = caps[1].to_string();
    let stamp = format!("{} {}", &caps[2], &caps[3]);
    let receipt_date = match NaiveDateTime::parse_from_str(&stamp, RECEIPT_DATETIME_FORMAT) {
        Ok(dt) => Some(dt),
        Err(e) => {
            warn!("Invalid receipt timestamp '{stamp}': {e}");
            None
        }
    };

    ReceiptInfo {
        pos_identification,
        receipt_date,
        receipt_body: text.chars().skip(RECEIPT_BODY_OFFSET).collect(),
    }
}
