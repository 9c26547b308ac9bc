//! # TPoS Contracts
//!
//! A contract delegates staking of a merchant's coins to an owner-controlled
//! address. It is defined by a single transaction whose outputs are:
//!
//! - output 0: P2PKH or P2SH payment to the delegate address
//! - exactly one null-data marker: `OP_RETURN <commission> <merchant txid> <vout>`
//!
//! Transactions come from the network, so decoding treats every output as
//! untrusted: any deviation from the layout yields a [`DecodeError`].

use std::str::FromStr;

use bitcoin::{hashes::Hash, Address, AddressType, Network, OutPoint, Transaction, TxOut, Txid};

use crate::{
    script::{disassemble, is_null_data, is_unspendable},
    DecodeError,
};

/// Name of the marker opcode as it appears in the disassembly.
pub const MARKER_OPCODE_NAME: &str = "OP_RETURN";

/// Number of disassembly tokens in a marker script.
const MARKER_TOKEN_COUNT: usize = 4;

/// A delegation agreement recovered from a contract transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    originating_txid: Txid,
    merchant_outpoint: OutPoint,
    delegate_address: Address,
    commission_percent: u8,
}

impl Contract {
    /// Decode the contract carried by `tx`.
    ///
    /// The merchant outpoint is not resolved: whether it exists, and who
    /// owns it, is for the caller to find out.
    pub fn from_transaction(tx: &Transaction, network: Network) -> Result<Self, DecodeError> {
        if tx.output.len() < 2 {
            return Err(DecodeError::TooFewOutputs(tx.output.len()));
        }

        let (marker, delegate) = locate_outputs(&tx.output)?;

        if !is_null_data(&marker.script_pubkey) {
            return Err(DecodeError::MarkerNotNullData);
        }
        if !(delegate.script_pubkey.is_p2pkh() || delegate.script_pubkey.is_p2sh()) {
            return Err(DecodeError::UnsupportedDelegateScript);
        }

        let (commission_percent, merchant_outpoint) = parse_marker(&marker.script_pubkey)?;

        let delegate_address = Address::from_script(&delegate.script_pubkey, network)
            .map_err(|_| DecodeError::UnsupportedDelegateScript)?;

        Ok(Self {
            originating_txid: tx.compute_txid(),
            merchant_outpoint,
            delegate_address,
            commission_percent,
        })
    }

    /// Txid of the transaction that defined this contract
    pub fn originating_txid(&self) -> Txid {
        self.originating_txid
    }

    /// Merchant output backing the contract
    pub fn merchant_outpoint(&self) -> OutPoint {
        self.merchant_outpoint
    }

    /// Address receiving the staking rewards
    pub fn delegate_address(&self) -> &Address {
        &self.delegate_address
    }

    /// Merchant commission, in percent
    pub fn commission_percent(&self) -> u8 {
        self.commission_percent
    }

    /// Checks the contract invariants.
    ///
    /// Always true for a decoded contract.
    pub fn is_valid(&self) -> bool {
        self.originating_txid != Txid::all_zeros()
            && self.merchant_outpoint.txid != Txid::all_zeros()
            && matches!(
                self.delegate_address.address_type(),
                Some(AddressType::P2pkh | AddressType::P2sh)
            )
            && self.commission_percent > 0
            && self.commission_percent < 100
    }
}

/// Decode `tx` as a contract, logging why it is not one.
pub fn decode(tx: &Transaction, network: Network) -> Result<Contract, DecodeError> {
    Contract::from_transaction(tx, network).inspect_err(|error| {
        tracing::debug!(txid = %tx.compute_txid(), %error, "transaction is not a tpos contract");
    })
}

/// Returns true if `tx` decodes as a contract.
pub fn is_contract(tx: &Transaction, network: Network) -> bool {
    decode(tx, network).is_ok()
}

/// Single pass over the outputs: the unique unspendable output is the marker,
/// a spendable output 0 is the delegate payment.
fn locate_outputs(outputs: &[TxOut]) -> Result<(&TxOut, &TxOut), DecodeError> {
    let mut markers = Vec::new();
    let mut delegate = None;

    for (index, output) in outputs.iter().enumerate() {
        if is_unspendable(&output.script_pubkey) {
            markers.push(output);
        } else if index == 0 {
            delegate = Some(output);
        }
    }

    let marker = match markers.as_slice() {
        [] => return Err(DecodeError::MissingMarker),
        [marker] => *marker,
        _ => return Err(DecodeError::AmbiguousMarker(markers.len())),
    };
    let delegate = delegate.ok_or(DecodeError::MissingDelegate)?;

    Ok((marker, delegate))
}

/// Read `(commission, merchant outpoint)` from the marker disassembly.
fn parse_marker(script: &bitcoin::Script) -> Result<(u8, OutPoint), DecodeError> {
    let tokens = disassemble(script)?;
    let [opcode, commission, txid, vout] = tokens.as_slice() else {
        return Err(DecodeError::TokenCount(tokens.len()));
    };

    if opcode != MARKER_OPCODE_NAME {
        return Err(DecodeError::MarkerOpcode(opcode.clone()));
    }

    let commission = parse_integer(commission)?;
    if commission <= 0 || commission >= 100 {
        return Err(DecodeError::CommissionOutOfRange(commission));
    }

    let txid = Txid::from_str(txid).map_err(|_| DecodeError::InvalidMerchantTxid(txid.clone()))?;
    if txid == Txid::all_zeros() {
        return Err(DecodeError::NullMerchantTxid);
    }

    let vout = parse_integer(vout)?;
    let vout = u32::try_from(vout).map_err(|_| DecodeError::InvalidOutputIndex(vout))?;

    // Range checked above.
    let commission = commission as u8;
    Ok((commission, OutPoint { txid, vout }))
}

fn parse_integer(token: &str) -> Result<i64, DecodeError> {
    token
        .parse()
        .map_err(|_| DecodeError::InvalidNumber(token.to_string()))
}
