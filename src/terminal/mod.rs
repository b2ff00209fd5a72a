//! Petrotec terminal raw socket protocol client.
//!
//! Each operation opens one TCP connection, sends a length-prefixed ASCII
//! command and reads the terminal's answer until it hangs up.
//!
//! # Example
//!
//! ```ignore
//! use petrotec_link::terminal::{
//!     CommandKind, PaymentTerminal, ProtocolRevision, ResponseRule, RevisionName, TcpTransport, TerminalClient,
//! };
//!
//! let revision = ProtocolRevision::builtin(RevisionName::V5)
//!     .with_rule(CommandKind::Purchase, ResponseRule::new(9, "..."))?;
//! let client = TerminalClient::new(TcpTransport::new("192.168.40.167", 45000), revision);
//! let result = client.purchase("1", "1.53".parse()?)?;
//! ```

mod client;
mod command;
mod error;
mod field;
mod frame;
mod response;
mod revision;
mod transport;
mod types;


// Re-export public API
pub use client::{PaymentTerminal, TerminalClient};
pub use command::{Command, CommandKind};
pub use error::{Result, TerminalError};
pub use frame::{decode as decode_frame, encode as encode_frame};
pub use response::{ReceiptInfo, parse_receipt};
pub use revision::{DateWidth, ProtocolRevision, ResponseRule, RevisionName};
pub use transport::{ReadStrategy, TcpTransport, Transport};
pub use types::{Amount, OperationResult, PurchaseResult};
