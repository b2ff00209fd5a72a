//! Fixed-width field encoding for terminal commands.

use chrono::{NaiveDate, NaiveTime};

use super::error::{Result, TerminalError};

/// Width of the transaction id field.
pub const TRANSACTION_ID_WIDTH: usize = 4;
/// Width of the amount field (cents).
pub const AMOUNT_WIDTH: usize = 8;
/// Width of the original POS identification field.
pub const POS_ID_WIDTH: usize = 8;

/// Left-pad a digit-only value with `'0'` to exactly `width` characters.
///
/// Values longer than `width` are rejected rather than truncated.
pub fn pad_left(field: &'static str, value: &str, width: usize) -> Result<String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TerminalError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    if value.len() > width {
        return Err(TerminalError::FieldOverflow {
            field,
            value: value.to_string(),
            width,
        });
    }
    Ok(format!("{value:0>width$}"))
}

/// `yyMMdd`, used when a date is embedded mid-command.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// `yyyyMMdd`, used for standalone operation-date fields.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `HHmmss`.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H%M%S").to_string()
}
