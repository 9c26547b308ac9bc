//! # Configuration
//!
//! Settings shared by the codec and the payout classifier.

use std::{ops::Range, path::Path};

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::{error::Result, TposError};

/// How the commission is written into the marker.
///
/// Decoding always reads the stored value as the merchant commission, so the
/// two conventions are not interchangeable: with [`Complement`] a contract
/// encoded for commission `c` decodes with commission `100 - c`.
///
/// [`Complement`]: CommissionConvention::Complement
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommissionConvention {
    /// Store `100 - commission`, the owner's retained share.
    #[default]
    Complement,
    /// Store the commission unchanged.
    Direct,
}

impl CommissionConvention {
    /// The value written into the marker for `commission`.
    ///
    /// Commissions above 100 have no complement and store 0.
    pub fn stored_value(self, commission: u8) -> u8 {
        match self {
            Self::Complement => 100u8.saturating_sub(commission),
            Self::Direct => commission,
        }
    }
}

/// Output indices of a stake transaction that may carry a delegation payout.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutWindow {
    /// First scanned output index (inclusive)
    pub start: usize,
    /// Last scanned output index (exclusive)
    pub end: usize,
}

impl PayoutWindow {
    /// Create a window, rejecting empty ranges.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start >= end {
            return Err(TposError::InvalidPayoutWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Indices to scan in a transaction with `output_count` outputs.
    pub fn indices(&self, output_count: usize) -> Range<usize> {
        self.start.min(output_count)..self.end.min(output_count)
    }
}

impl Default for PayoutWindow {
    /// Coinstake layout: empty marker, stake return, then the payout legs.
    fn default() -> Self {
        Self { start: 2, end: 4 }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TposConfig {
    /// Network used to render delegate addresses
    pub network: Network,

    /// Outputs scanned for delegation payouts
    pub payout_window: PayoutWindow,

    /// Commission convention used when encoding markers
    pub commission_convention: CommissionConvention,
}

impl Default for TposConfig {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            payout_window: PayoutWindow::default(),
            commission_convention: CommissionConvention::default(),
        }
    }
}

impl TposConfig {
    /// Parse a JSON configuration, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        PayoutWindow::new(config.payout_window.start, config.payout_window.end)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
