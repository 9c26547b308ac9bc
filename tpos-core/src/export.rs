//! # Export Blocks
//!
//! Copy/paste framing for handing a contract to the other party:
//!
//! ```text
//! =====TPOSOWNERINFO======================
//! 0200000001...
//! ========================================
//! ```

use bitcoin::{consensus, Network, Transaction};

use crate::{contract::decode, error::Result, Contract, TposError};

/// Marker word written into the header line.
pub const EXPORT_HEADER: &str = "TPOSOWNERINFO";

/// Width of the header and footer lines.
pub const EXPORT_HEADER_WIDTH: usize = 40;

/// Left margin before the marker word.
const EXPORT_HEADER_MARGIN: usize = 5;

/// Frame `payload` between the export header and footer.
pub fn export_block(payload: &str) -> String {
    let footer = "=".repeat(EXPORT_HEADER_WIDTH);
    let header = format!(
        "{}{}{}",
        "=".repeat(EXPORT_HEADER_MARGIN),
        EXPORT_HEADER,
        "=".repeat(EXPORT_HEADER_WIDTH - EXPORT_HEADER_MARGIN - EXPORT_HEADER.len()),
    );
    format!("{header}\n{payload}\n{footer}")
}

/// Extract the payload of an export block.
///
/// Returns an empty string when the frame is missing or damaged. The payload
/// itself is not checked.
pub fn import_block(block: &str) -> String {
    let mut tokens = block.split_whitespace();
    let (Some(header), Some(payload), Some(footer)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return String::new();
    };

    let prefix = format!("{}{}", "=".repeat(EXPORT_HEADER_MARGIN), EXPORT_HEADER);
    if header.len() == footer.len() && header.starts_with(&prefix) {
        payload.to_string()
    } else {
        String::new()
    }
}

/// Export a contract transaction as a framed, consensus-encoded hex block.
pub fn export_contract(tx: &Transaction) -> String {
    export_block(&consensus::encode::serialize_hex(tx))
}

/// Import a block produced by [`export_contract`] and decode its contract.
pub fn import_contract(block: &str, network: Network) -> Result<(Transaction, Contract)> {
    let payload = import_block(block);
    if payload.is_empty() {
        return Err(TposError::InvalidExportBlock);
    }

    let bytes = hex::decode(payload)?;
    let tx: Transaction = consensus::deserialize(&bytes)?;
    let contract = decode(&tx, network)?;
    Ok((tx, contract))
}
