//! # TPoS Core
//!
//! Core Rust library for trustless proof-of-stake (TPoS) delegation contracts.
//!
//! A merchant lets an owner stake on its behalf by publishing a contract
//! inside an ordinary transaction:
//! - Output 0 pays the delegate address that will receive staking rewards
//! - A zero-value `OP_RETURN` marker carries the commission and the merchant outpoint
//! - Stake transactions later pay the delegate address from a fixed output window
//!
//! ## Features
//!
//! - **Contract Codec**: Encode marker outputs and decode contracts from untrusted transactions
//! - **Payout Classification**: Split stake transactions into stake and commission
//! - **Role Recognition**: Tell whether the wallet acts as merchant, owner, or both
//! - **Contract Book**: Keep the contracts a wallet takes part in
//! - **Export Blocks**: Copy/paste framing for handing contracts over
//!
//! ## Examples
//!
//! ```rust
//! use tpos_core::{export_block, import_block};
//!
//! let block = export_block("0200000001abcdef");
//! assert!(block.starts_with("=====TPOSOWNERINFO"));
//! assert_eq!(import_block(&block), "0200000001abcdef");
//! ```

pub mod builder;
pub mod config;
pub mod contract;
pub mod error;
pub mod export;
pub mod payout;
pub mod registry;
pub mod script;

#[cfg(test)]
pub(crate) mod test_utils;

pub use builder::{
    encode_marker_outputs, ContractParams, ContractTransactionBuilder, TransactionFunder,
};
pub use config::{CommissionConvention, PayoutWindow, TposConfig};
pub use contract::{decode, is_contract, Contract};
pub use error::{DecodeError, Result, TposError};
pub use export::{export_block, export_contract, import_block, import_contract};
pub use payout::{
    classify_payout, is_merchant_contract, is_owner_contract, recognize, ContractRole, Ownership,
    PayoutClassifier, PayoutSplit, RecognizedContract, WalletView,
};
pub use registry::ContractBook;
