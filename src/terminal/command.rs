//! Terminal commands and rendering them from revision templates.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::{Result, TerminalError};
use super::field::{AMOUNT_WIDTH, POS_ID_WIDTH, TRANSACTION_ID_WIDTH, format_time, pad_left};
use super::revision::ProtocolRevision;
use super::types::Amount;

// Template placeholders
pub const PH_TRANSACTION_ID: &str = "#TRANSACTIONID#";
pub const PH_AMOUNT: &str = "#AMOUNT#";
pub const PH_ORIGINAL_POS_ID: &str = "#ORIGINALPOSIDENTIFICATION#";
pub const PH_ORIGINAL_RECEIPT_DATE: &str = "#ORIGINALRECEIPTDATE#";
pub const PH_ORIGINAL_RECEIPT_TIME: &str = "#ORIGINALRECEIPTTIME#";

/// Command kind, used to key templates and response rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Status,
    OpenPeriod,
    ClosePeriod,
    Purchase,
    Refund,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::Status,
        CommandKind::OpenPeriod,
        CommandKind::ClosePeriod,
        CommandKind::Purchase,
        CommandKind::Refund,
    ];

    /// Placeholders a template for this kind must contain.
    pub fn placeholders(self) -> &'static [&'static str] {
        match self {
            CommandKind::Status => &[],
            CommandKind::OpenPeriod | CommandKind::ClosePeriod => &[PH_TRANSACTION_ID],
            CommandKind::Purchase => &[PH_TRANSACTION_ID, PH_AMOUNT],
            CommandKind::Refund => &[
                PH_TRANSACTION_ID,
                PH_AMOUNT,
                PH_ORIGINAL_POS_ID,
                PH_ORIGINAL_RECEIPT_DATE,
                PH_ORIGINAL_RECEIPT_TIME,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Status => "status",
            CommandKind::OpenPeriod => "open_period",
            CommandKind::ClosePeriod => "close_period",
            CommandKind::Purchase => "purchase",
            CommandKind::Refund => "refund",
        }
    }
}

impl FromStr for CommandKind {
    type Err = TerminalError;

    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TerminalError::validation(format!("Unknown command kind '{s}'")))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to the terminal. Built per call and rendered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    OpenPeriod {
        transaction_id: String,
    },
    ClosePeriod {
        transaction_id: String,
    },
    Purchase {
        transaction_id: String,
        amount: Amount,
    },
    Refund {
        transaction_id: String,
        amount: Amount,
        original_pos_identification: String,
        original_receipt: NaiveDateTime,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Status => CommandKind::Status,
            Command::OpenPeriod { .. } => CommandKind::OpenPeriod,
            Command::ClosePeriod { .. } => CommandKind::ClosePeriod,
            Command::Purchase { .. } => CommandKind::Purchase,
            Command::Refund { .. } => CommandKind::Refund,
        }
    }

    /// Render the ASCII command string using the revision's template.
    pub fn render(&self, revision: &ProtocolRevision) -> Result<String> {
        let template = revision.template(self.kind())?;

        let rendered = match self {
            Command::Status => template.to_string(),
            Command::OpenPeriod { transaction_id } | Command::ClosePeriod { transaction_id } => {
                template.replace(PH_TRANSACTION_ID, &pad_transaction_id(transaction_id)?)
            }
            Command::Purchase { transaction_id, amount } => template
                .replace(PH_TRANSACTION_ID, &pad_transaction_id(transaction_id)?)
                .replace(PH_AMOUNT, &pad_amount(*amount)?),
            Command::Refund {
                transaction_id,
                amount,
                original_pos_identification,
                original_receipt,
            } => template
                .replace(PH_TRANSACTION_ID, &pad_transaction_id(transaction_id)?)
                .replace(PH_AMOUNT, &pad_amount(*amount)?)
                .replace(
                    PH_ORIGINAL_POS_ID,
                    &pad_left("original_pos_identification", original_pos_identification, POS_ID_WIDTH)?,
                )
                .replace(
                    PH_ORIGINAL_RECEIPT_DATE,
                    &revision.refund_date_width().format(original_receipt.date()),
                )
                .replace(PH_ORIGINAL_RECEIPT_TIME, &format_time(original_receipt.time())),
        };

        Ok(rendered)
    }
}

fn pad_transaction_id(transaction_id: &str) -> Result<String> {
    pad_left("transaction_id", transaction_id.trim(), TRANSACTION_ID_WIDTH)
}

fn pad_amount(amount: Amount) -> Result<String> {
    pad_left("amount", &amount.cents().to_string(), AMOUNT_WIDTH)
}

/// Check that a template carries exactly the placeholders its kind fills.
pub(crate) fn validate_template(kind: CommandKind, template: &str) -> Result<()> {
    let invalid = |reason: String| TerminalError::InvalidTemplate { kind, reason };

    if template.is_empty() {
        return Err(invalid("template is empty".to_string()));
    }
    if !template.is_ascii() {
        return Err(invalid("template must be ASCII".to_string()));
    }

    let mut rest = template.to_string();
    for placeholder in kind.placeholders() {
        if !rest.contains(placeholder) {
            return Err(invalid(format!("missing placeholder {placeholder}")));
        }
        rest = rest.replace(placeholder, "");
    }
    if rest.contains('#') {
        return Err(invalid(format!("unexpected placeholder in '{template}'")));
    }

    Ok(())
}
