//! # Contract Book
//!
//! In-memory view of the contracts a wallet takes part in, split by side.
//! The book does no locking of its own; share it behind a lock or hand out
//! clones as snapshots.

use std::collections::BTreeMap;

use bitcoin::{Network, Transaction, Txid};

use crate::payout::{
    recognize, ContractRole, PayoutClassifier, PayoutSplit, RecognizedContract, WalletView,
};
use crate::Contract;

#[derive(Clone, Debug, Default)]
pub struct ContractBook {
    /// Contracts where the wallet owns the delegate address
    owner_contracts: BTreeMap<Txid, Contract>,
    /// Contracts where the wallet owns the merchant output
    merchant_contracts: BTreeMap<Txid, Contract>,
}

impl ContractBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `contract` on the side(s) given by `role`.
    ///
    /// Returns false for [`ContractRole::Unrelated`], which is not stored.
    pub fn insert(&mut self, contract: Contract, role: ContractRole) -> bool {
        let txid = contract.originating_txid();
        match role {
            ContractRole::Owner => {
                self.owner_contracts.insert(txid, contract);
            }
            ContractRole::Merchant => {
                self.merchant_contracts.insert(txid, contract);
            }
            ContractRole::Both => {
                self.owner_contracts.insert(txid, contract.clone());
                self.merchant_contracts.insert(txid, contract);
            }
            ContractRole::Unrelated => return false,
        }

        tracing::info!(%txid, ?role, "tpos contract registered");
        true
    }

    pub fn register(&mut self, recognized: RecognizedContract) -> bool {
        self.insert(recognized.contract, recognized.role)
    }

    /// Recognize `tx` and store it if the wallet takes part in it.
    pub fn scan_transaction(
        &mut self,
        tx: &Transaction,
        network: Network,
        wallet: &impl WalletView,
    ) -> Option<ContractRole> {
        let recognized = recognize(tx, network, wallet)?;
        let role = recognized.role;
        self.register(recognized).then_some(role)
    }

    /// Drop the contract defined by `txid` from both sides.
    pub fn remove(&mut self, txid: &Txid) -> bool {
        let owner = self.owner_contracts.remove(txid).is_some();
        let merchant = self.merchant_contracts.remove(txid).is_some();
        owner || merchant
    }

    pub fn get(&self, txid: &Txid) -> Option<&Contract> {
        self.owner_contracts
            .get(txid)
            .or_else(|| self.merchant_contracts.get(txid))
    }

    pub fn owner_contracts(&self) -> impl Iterator<Item = &Contract> {
        self.owner_contracts.values()
    }

    pub fn merchant_contracts(&self) -> impl Iterator<Item = &Contract> {
        self.merchant_contracts.values()
    }

    /// Owner-side contracts first, then merchant-side ones.
    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.owner_contracts().chain(self.merchant_contracts())
    }

    /// Number of distinct contracts, counting a two-sided contract once.
    pub fn len(&self) -> usize {
        let merchant_only = self
            .merchant_contracts
            .keys()
            .filter(|txid| !self.owner_contracts.contains_key(*txid))
            .count();
        self.owner_contracts.len() + merchant_only
    }

    pub fn is_empty(&self) -> bool {
        self.owner_contracts.is_empty() && self.merchant_contracts.is_empty()
    }

    /// Classify `tx` against every contract in the book.
    pub fn classify_payout(
        &self,
        tx: &Transaction,
        classifier: &PayoutClassifier,
        wallet: &impl WalletView,
    ) -> Option<PayoutSplit> {
        classifier.classify(tx, self.contracts(), wallet)
    }
}
