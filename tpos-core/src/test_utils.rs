//! Common test utilities for tpos-core tests.
//!
//! Deterministic addresses, contract transactions, stake transactions and an
//! in-memory wallet shared by the module tests.

use std::collections::HashMap;
use std::str::FromStr;

use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{
    absolute::LockTime, hashes::Hash, transaction::Version, Address, Amount, CompressedPublicKey,
    OutPoint, PrivateKey, ScriptBuf, Transaction, TxIn, TxOut, Txid,
};

use crate::payout::{Ownership, WalletView};

/// Deterministic public key for `index` (must be non-zero).
pub fn create_test_public_key(index: u8) -> CompressedPublicKey {
    let secp = Secp256k1::new();
    let mut secret_bytes = [0u8; 32];
    secret_bytes[0] = index;
    secret_bytes[31] = index;
    let secret_key = SecretKey::from_slice(&secret_bytes).unwrap();
    let private_key = PrivateKey::new(secret_key, constants::TEST_NETWORK);
    CompressedPublicKey::from_private_key(&secp, &private_key).unwrap()
}

/// P2PKH regtest address for `index` (must be non-zero).
pub fn test_p2pkh_address(index: u8) -> Address {
    Address::p2pkh(
        create_test_public_key(index).pubkey_hash(),
        constants::TEST_NETWORK,
    )
}

/// P2SH regtest address wrapping a trivial redeem script.
pub fn test_p2sh_address(index: u8) -> Address {
    let redeem_script = ScriptBuf::from_bytes(vec![0x51, 0x75, index]);
    Address::p2sh(&redeem_script, constants::TEST_NETWORK).unwrap()
}

/// P2WPKH regtest address for `index` (must be non-zero).
pub fn test_p2wpkh_address(index: u8) -> Address {
    Address::p2wpkh(&create_test_public_key(index), constants::TEST_NETWORK)
}

pub fn test_merchant_outpoint(vout: u32) -> OutPoint {
    OutPoint {
        txid: Txid::from_str(constants::TEST_MERCHANT_TXID).unwrap(),
        vout,
    }
}

/// Merchant txid in the byte order used by the marker push.
pub fn reversed_txid_bytes(outpoint: &OutPoint) -> [u8; 32] {
    let mut bytes = outpoint.txid.to_byte_array();
    bytes.reverse();
    bytes
}

pub fn test_output(address: &Address, sats: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(sats),
        script_pubkey: address.script_pubkey(),
    }
}

/// Transaction spending a single dummy input.
pub fn create_test_tx(output: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::from_str(constants::TEST_FUNDING_TXID).unwrap(),
                vout: 0,
            },
            ..TxIn::default()
        }],
        output,
    }
}

/// `[delegate payment, marker]` contract transaction.
pub fn create_test_contract_tx(delegate: &Address, sats: u64, marker: ScriptBuf) -> Transaction {
    create_test_tx(vec![
        test_output(delegate, sats),
        TxOut {
            value: Amount::ZERO,
            script_pubkey: marker,
        },
    ])
}

/// Coinstake: empty output 0 followed by `outputs`.
pub fn create_test_coinstake_tx(outputs: Vec<TxOut>) -> Transaction {
    let mut output = vec![TxOut {
        value: Amount::ZERO,
        script_pubkey: ScriptBuf::new(),
    }];
    output.extend(outputs);
    create_test_tx(output)
}

/// In-memory wallet answering ownership and ledger queries.
#[derive(Default)]
pub struct TestWallet {
    pub owned: HashMap<Address, Ownership>,
    pub outputs: HashMap<OutPoint, ScriptBuf>,
    pub credit: Amount,
    pub debit: Amount,
}

impl TestWallet {
    pub fn with_spendable(mut self, address: &Address) -> Self {
        self.owned.insert(address.clone(), Ownership::Spendable);
        self
    }

    pub fn with_watch_only(mut self, address: &Address) -> Self {
        self.owned.insert(address.clone(), Ownership::WatchOnly);
        self
    }

    pub fn with_output(mut self, outpoint: OutPoint, address: &Address) -> Self {
        self.outputs.insert(outpoint, address.script_pubkey());
        self
    }

    pub fn with_output_script(mut self, outpoint: OutPoint, script: ScriptBuf) -> Self {
        self.outputs.insert(outpoint, script);
        self
    }

    pub fn with_balance_change(mut self, credit: u64, debit: u64) -> Self {
        self.credit = Amount::from_sat(credit);
        self.debit = Amount::from_sat(debit);
        self
    }
}

impl WalletView for TestWallet {
    fn ownership(&self, address: &Address) -> Ownership {
        self.owned
            .get(address)
            .copied()
            .unwrap_or(Ownership::NotMine)
    }

    fn output_script(&self, outpoint: &OutPoint) -> Option<ScriptBuf> {
        self.outputs.get(outpoint).cloned()
    }

    fn credit(&self, _tx: &Transaction) -> Amount {
        self.credit
    }

    fn debit(&self, _tx: &Transaction) -> Amount {
        self.debit
    }
}

/// Common test constants
pub mod constants {
    use bitcoin::Network;

    /// Network used by every fixture
    pub const TEST_NETWORK: Network = Network::Regtest;

    /// Merchant transaction referenced by test markers
    pub const TEST_MERCHANT_TXID: &str =
        "abcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcd";

    /// Input spent by every test transaction
    pub const TEST_FUNDING_TXID: &str =
        "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
}
