//! Error types for tpos-core

use thiserror::Error;

/// Result type alias for tpos operations
pub type Result<T> = std::result::Result<T, TposError>;

/// Errors raised to the immediate caller.
///
/// Ledger data never produces one of these: a transaction that is not a
/// contract is reported through [`DecodeError`] or a `None` payout instead.
#[derive(Error, Debug)]
pub enum TposError {
    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Consensus decoding errors
    #[error("Transaction decoding error: {0}")]
    Consensus(#[from] bitcoin::consensus::encode::Error),

    /// Serde JSON errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Commission outside the open interval (0, 100)
    #[error("Invalid commission: {0} (expected 1..=99)")]
    InvalidCommission(u8),

    /// Payout window that cannot select any output
    #[error("Invalid payout window: {start}..{end}")]
    InvalidPayoutWindow { start: usize, end: usize },

    /// The transaction is not a contract
    #[error("Not a contract: {0}")]
    NotAContract(#[from] DecodeError),

    /// Text block without a valid export frame
    #[error("Invalid export block")]
    InvalidExportBlock,

    /// The funding wallet refused to sign
    #[error("Wallet is locked")]
    WalletLocked,

    /// Transaction construction service errors
    #[error("Funding error: {0}")]
    Funding(String),

    /// The funded contract transaction would not relay
    #[error("Non-standard contract transaction: {0}")]
    NonStandard(String),
}

/// Every way a transaction can fail to decode as a contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer outputs than a delegate payment plus a marker
    #[error("transaction has {0} outputs, at least 2 required")]
    TooFewOutputs(usize),

    /// No unspendable output
    #[error("no unspendable marker output")]
    MissingMarker,

    /// More than one unspendable output
    #[error("{0} unspendable outputs, marker is ambiguous")]
    AmbiguousMarker(usize),

    /// Output 0 is the marker instead of the delegate payment
    #[error("first output is not a delegate payment")]
    MissingDelegate,

    /// Marker carries opcodes other than data pushes
    #[error("marker output is not null data")]
    MarkerNotNullData,

    /// Delegate output has no P2PKH or P2SH address
    #[error("delegate output is neither P2PKH nor P2SH")]
    UnsupportedDelegateScript,

    /// Marker script cannot be parsed into instructions
    #[error("marker script does not disassemble")]
    MalformedScript,

    /// Marker disassembles to the wrong number of tokens
    #[error("marker has {0} tokens, expected 4")]
    TokenCount(usize),

    /// First marker token is not `OP_RETURN`
    #[error("marker starts with {0:?}, expected OP_RETURN")]
    MarkerOpcode(String),

    /// Commission or output index token is not a decimal integer
    #[error("not an integer: {0:?}")]
    InvalidNumber(String),

    /// Commission outside the open interval (0, 100)
    #[error("commission {0} outside (0, 100)")]
    CommissionOutOfRange(i64),

    /// Merchant txid token is not 64 hex characters
    #[error("invalid merchant txid: {0:?}")]
    InvalidMerchantTxid(String),

    /// Merchant txid is all zeroes
    #[error("merchant txid is null")]
    NullMerchantTxid,

    /// Merchant output index is negative or too large
    #[error("invalid merchant output index: {0}")]
    InvalidOutputIndex(i64),
}
