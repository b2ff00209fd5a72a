//! Values exchanged with callers: amounts, the purchase correlation token and results.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Result, TerminalError};
use super::field::{AMOUNT_WIDTH, POS_ID_WIDTH, TRANSACTION_ID_WIDTH, pad_left};

/// Money amount with two decimals, stored as cents.
///
/// Serialized as a decimal string (`"12.34"`); numbers are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub const ZERO: Amount = Amount { cents: 0 };

    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl FromStr for Amount {
    type Err = TerminalError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TerminalError::validation(format!("Invalid amount '{s}'"));
        let s = s.trim();
        let (units, fraction) = s.split_once('.').unwrap_or((s, ""));

        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: u64 = units.parse().map_err(|_| invalid())?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Self::from_cents)
            .ok_or_else(invalid)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Largest numeric amount whose cents still fit a `u64`.
const MAX_NUMERIC_UNITS: f64 = (u64::MAX / 100) as f64;

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) if n.is_finite() && n >= 0.0 && n < MAX_NUMERIC_UNITS => {
                Ok(Self::from_cents((n * 100.0).round() as u64))
            }
            Repr::Number(n) => Err(serde::de::Error::custom(format!("Invalid amount {n}"))),
        }
    }
}

/// Data from a successful purchase needed to refund it later.
///
/// The client never stores it; callers keep it and hand it back to
/// [`PaymentTerminal::refund`](super::PaymentTerminal::refund).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub transaction_id: String,
    pub amount: Amount,
    /// POS identification printed on the original receipt.
    #[serde(default)]
    pub original_pos_identification: String,
    /// Original receipt date and time.
    #[serde(default)]
    pub original_receipt_date: Option<NaiveDateTime>,
    /// Receipt body as returned by the terminal.
    #[serde(default)]
    pub receipt_data: String,
}

impl PurchaseResult {
    /// Whether the terminal embedded receipt metadata a refund can use.
    ///
    /// When it prints the receipt locally, none of this is available.
    pub fn has_receipt_metadata(&self) -> bool {
        self.original_receipt_date.is_some() && self.check_pos_identification().is_ok()
    }

    /// Check every field a refund command needs, in the form it is sent.
    pub fn validate_for_refund(&self) -> Result<()> {
        if self.transaction_id.trim().is_empty() {
            return Err(TerminalError::validation("Refund requires the transaction id"));
        }
        pad_left("transaction_id", self.transaction_id.trim(), TRANSACTION_ID_WIDTH).map_err(token_error)?;
        if self.amount.is_zero() {
            return Err(TerminalError::validation("Refund requires a non-zero amount"));
        }
        pad_left("amount", &self.amount.cents().to_string(), AMOUNT_WIDTH).map_err(token_error)?;
        if self.original_pos_identification.is_empty() {
            return Err(TerminalError::validation(
                "Refund requires the original POS identification",
            ));
        }
        self.check_pos_identification().map_err(token_error)?;
        if self.original_receipt_date.is_none() {
            return Err(TerminalError::validation(
                "Refund requires the original receipt date and time",
            ));
        }
        Ok(())
    }

    fn check_pos_identification(&self) -> Result<String> {
        pad_left("original_pos_identification", &self.original_pos_identification, POS_ID_WIDTH)
    }
}

/// Field errors in a stored token are the caller's data, not a command bug.
fn token_error(err: TerminalError) -> TerminalError {
    TerminalError::validation(format!("Malformed purchase token: {err}"))
}

/// Uniform outcome of one terminal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Status text matched the expected literal.
    pub success: bool,
    /// Decoded response text.
    pub message: String,
    /// Correlation token, purchase only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<PurchaseResult>,
}

impl OperationResult {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            extra_data: None,
        }
    }

    pub fn with_extra_data(mut self, token: PurchaseResult) -> Self {
        self.extra_data = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn complete_token() -> PurchaseResult {
        PurchaseResult {
            transaction_id: "12".to_string(),
            amount: Amount::from_cents(153),
            original_pos_identification: "00069085".to_string(),
            original_receipt_date: NaiveDate::from_ymd_opt(2023, 1, 15).and_then(|d| d.and_hms_opt(14, 5, 30)),
            receipt_data: String::new(),
        }
    }

    #[test]
    fn test_amount_parse() {
        assert_eq!("12.34".parse::<Amount>().unwrap().cents(), 1234);
        assert_eq!("12.3".parse::<Amount>().unwrap().cents(), 1230);
        assert_eq!("12".parse::<Amount>().unwrap().cents(), 1200);
        assert_eq!("0.05".parse::<Amount>().unwrap().cents(), 5);
    }

    #[test]
    fn test_amount_parse_invalid() {
        for bad in ["", ".5", "1.234", "-1", "1,50", "abc", "1.x"] {
            assert!(bad.parse::<Amount>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(123456).to_string(), "1234.56");
    }

    #[test]
    fn test_amount_deserialize_number_and_text() {
        let from_number: Amount = serde_json::from_str("0.53").unwrap();
        let from_text: Amount = serde_json::from_str("\"0.53\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"0.53\"");
    }

    #[test]
    fn test_complete_token_validates() {
        assert!(complete_token().validate_for_refund().is_ok());
        assert!(complete_token().has_receipt_metadata());
    }

    #[test]
    fn test_token_missing_fields_rejected() {
        let mut token = complete_token();
        token.original_pos_identification.clear();
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));

        let mut token = complete_token();
        token.original_receipt_date = None;
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));

        let mut token = complete_token();
        token.amount = Amount::ZERO;
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));
    }

    #[test]
    fn test_token_malformed_fields_rejected() {
        let mut token = complete_token();
        token.original_pos_identification = "123456789".to_string();
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));
        assert!(!token.has_receipt_metadata());

        let mut token = complete_token();
        token.original_pos_identification = " 69085".to_string();
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));

        let mut token = complete_token();
        token.transaction_id = "A1".to_string();
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));

        let mut token = complete_token();
        token.amount = Amount::from_cents(123_456_789);
        assert!(matches!(token.validate_for_refund(), Err(TerminalError::Validation(_))));
    }

    #[test]
    fn test_amount_deserialize_huge_number_rejected() {
        assert!(serde_json::from_str::<Amount>("1e300").is_err());
        assert!(serde_json::from_str::<Amount>("-1").is_err());
        assert_eq!(serde_json::from_str::<Amount>("12").unwrap().cents(), 1200);
    }

    #[test]
    fn test_token_json_defaults() {
        let token: PurchaseResult = serde_json::from_str(r#"{"transaction_id":"1","amount":"1.00"}"#).unwrap();
        assert!(token.original_pos_identification.is_empty());
        assert!(token.original_receipt_date.is_none());
        assert!(!token.has_receipt_metadata());
    }

    #[test]
    fn test_result_skips_missing_extra_data() {
        let json = serde_json::to_string(&OperationResult::new(false, "ERR")).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"ERR"}"#);
    }
}
