//! TerminalClient: one request/response exchange per public operation.

use tracing::{info, warn};

use super::command::Command;
use super::error::{Result, TerminalError};
use super::frame;
use super::response::{is_success, parse_receipt};
use super::revision::ProtocolRevision;
use super::transport::{TcpTransport, Transport};
use super::types::{Amount, OperationResult, PurchaseResult};

/// Operations a POS needs from a payment terminal.
///
/// Any terminal integration (this socket protocol or a vendor SDK) reports
/// through the same [`OperationResult`] so callers stay transport-agnostic.
pub trait PaymentTerminal {
    /// Request the terminal status.
    fn status(&self) -> Result<OperationResult>;

    /// Open the accounting period.
    fn open_period(&self, transaction_id: &str) -> Result<OperationResult>;

    /// Close the accounting period.
    fn close_period(&self, transaction_id: &str) -> Result<OperationResult>;

    /// Run a card purchase.
    ///
    /// On success the result carries a [`PurchaseResult`] the caller keeps
    /// for a later refund. Its receipt fields stay empty when the terminal
    /// prints the receipt itself.
    fn purchase(&self, transaction_id: &str, amount: Amount) -> Result<OperationResult>;

    /// Refund a previous purchase.
    ///
    /// A malformed token is rejected as a validation error before any
    /// connection is opened.
    fn refund(&self, token: &PurchaseResult) -> Result<OperationResult>;
}

/// Client for the terminal's length-prefixed socket protocol.
///
/// Holds no per-call state; concurrent calls open independent connections.
/// Nothing is retried: transport failures are returned as errors, and
/// unexpected status text as an unsuccessful result.
#[derive(Debug, Clone)]
pub struct TerminalClient<T = TcpTransport> {
    transport: T,
    revision: ProtocolRevision,
}

impl<T: Transport> TerminalClient<T> {
    pub fn new(transport: T, revision: ProtocolRevision) -> Self {
        Self { transport, revision }
    }

    pub fn revision(&self) -> &ProtocolRevision {
        &self.revision
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build, send and interpret one command.
    ///
    /// Rendering and rule lookup happen before any connection is opened.
    fn execute(&self, command: &Command) -> Result<(bool, String)> {
        let kind = command.kind();
        let rule = self.revision.rule(kind)?;
        let rendered = command.render(&self.revision)?;
        let request = frame::encode(&rendered)?;

        info!("Sending {kind} command ({} bytes)", rendered.len());
        let response = self.transport.exchange(&request)?;
        let text = frame::decode(&response);

        let success = is_success(&text, rule);
        if success {
            info!("Terminal accepted {kind}");
        } else {
            warn!("Terminal rejected {kind}: {text:?}");
        }
        Ok((success, text))
    }

    fn simple(&self, command: Command) -> Result<OperationResult> {
        let (success, text) = self.execute(&command)?;
        Ok(OperationResult::new(success, text))
    }
}

impl<T: Transport> PaymentTerminal for TerminalClient<T> {
    fn status(&self) -> Result<OperationResult> {
        self.simple(Command::Status)
    }

    fn open_period(&self, transaction_id: &str) -> Result<OperationResult> {
        self.simple(Command::OpenPeriod {
            transaction_id: transaction_id.to_string(),
        })
    }

    fn close_period(&self, transaction_id: &str) -> Result<OperationResult> {
        self.simple(Command::ClosePeriod {
            transaction_id: transaction_id.to_string(),
        })
    }

    fn purchase(&self, transaction_id: &str, amount: Amount) -> Result<OperationResult> {
        let (success, text) = self.execute(&Command::Purchase {
            transaction_id: transaction_id.to_string(),
            amount,
        })?;

        if !success {
            return Ok(OperationResult::new(false, text));
        }

        let receipt = parse_receipt(&text);
        let token = PurchaseResult {
            transaction_id: transaction_id.to_string(),
            amount,
            original_pos_identification: receipt.pos_identification,
            original_receipt_date: receipt.receipt_date,
            receipt_data: receipt.receipt_body,
        };
        if !token.has_receipt_metadata() {
            warn!("Purchase {transaction_id} succeeded without usable receipt metadata, refund will not be possible");
        }

        Ok(OperationResult::new(true, text).with_extra_data(token))
    }

    fn refund(&self, token: &PurchaseResult) -> Result<OperationResult> {
        token.validate_for_refund()?;
        let original_receipt = token
            .original_receipt_date
            .ok_or_else(|| TerminalError::validation("Refund requires the original receipt date and time"))?;

        self.simple(Command::Refund {
            transaction_id: token.transaction_id.clone(),
            amount: token.amount,
            original_pos_identification: token.original_pos_identification.clone(),
            original_receipt,
        })
    }
}
