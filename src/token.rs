//! Caller-side storage of the purchase correlation token as JSON.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::terminal::PurchaseResult;

/// Write the token so a later run can refund the purchase.
pub fn save(path: &Path, token: &PurchaseResult) -> Result<()> {
    let content = serde_json::to_string_pretty(token)?;
    std::fs::write(path, content)?;
    info!("Saved purchase token to {}", path.display());
    Ok(())
}

/// Read a token written by [`save`].
pub fn load(path: &Path) -> Result<PurchaseResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
