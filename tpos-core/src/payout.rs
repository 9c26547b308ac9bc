//! # Payout Classification
//!
//! Stake transactions produced under a contract pay the delegate address from
//! a fixed window of outputs. Classifying a stake transaction splits its value
//! into the stake returned to the delegate and the commission that reached
//! the wallet.

use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, SignedAmount, Transaction};

use crate::{
    config::PayoutWindow, contract::decode, script::extract_address, Contract, TposConfig,
};

/// How much control the wallet has over a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    NotMine,
    WatchOnly,
    Spendable,
}

/// Wallet and ledger facts the classifier depends on.
pub trait WalletView {
    /// Ownership oracle for a destination.
    fn ownership(&self, address: &Address) -> Ownership;

    /// Script of a wallet output, if the wallet knows the transaction.
    fn output_script(&self, outpoint: &OutPoint) -> Option<ScriptBuf>;

    /// Value `tx` pays to the wallet.
    fn credit(&self, tx: &Transaction) -> Amount;

    /// Value `tx` spends from the wallet.
    fn debit(&self, tx: &Transaction) -> Amount;

    /// Whether `tx` generates stake.
    ///
    /// Defaults to the coinstake shape, see [`is_coin_stake`].
    fn is_stake_generation(&self, tx: &Transaction) -> bool {
        is_coin_stake(tx)
    }
}

/// Coinstake layout: spends a real output and opens with an empty marker output.
pub fn is_coin_stake(tx: &Transaction) -> bool {
    let spends_output = tx
        .input
        .first()
        .is_some_and(|input| !input.previous_output.is_null());
    let empty_first_output = tx
        .output
        .first()
        .is_some_and(|output| output.value == Amount::ZERO && output.script_pubkey.is_empty());

    spends_output && tx.output.len() >= 2 && empty_first_output
}

/// Split of a stake transaction paying out under a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutSplit {
    /// Value returned to the delegate address
    pub stake_amount: Amount,

    /// Net value the transaction brought to the wallet
    pub commission_amount: SignedAmount,

    /// Delegate address of the matched contract
    pub delegate_address: Address,
}

/// Matches stake transactions against known contracts.
#[derive(Clone, Debug)]
pub struct PayoutClassifier {
    network: Network,
    window: PayoutWindow,
}

impl PayoutClassifier {
    pub fn new(network: Network, window: PayoutWindow) -> Self {
        Self { network, window }
    }

    pub fn from_config(config: &TposConfig) -> Self {
        Self::new(config.network, config.payout_window)
    }

    pub fn window(&self) -> PayoutWindow {
        self.window
    }

    /// Classify `tx` against `contracts`.
    ///
    /// Outputs in the payout window are scanned in ascending order; the first
    /// one paying a known delegate address wins. The commission is the net
    /// change of the wallet: the commission leg is funded from the inputs, so
    /// it shows up as the difference between credit and debit.
    ///
    /// Returns `None` when `tx` is not a stake transaction or pays none of
    /// the contracts.
    pub fn classify<'a>(
        &self,
        tx: &Transaction,
        contracts: impl IntoIterator<Item = &'a Contract>,
        wallet: &impl WalletView,
    ) -> Option<PayoutSplit> {
        if !wallet.is_stake_generation(tx) {
            return None;
        }

        let contracts: Vec<&Contract> = contracts.into_iter().collect();
        let commission_amount = net_change(wallet.credit(tx), wallet.debit(tx))?;

        for index in self.window.indices(tx.output.len()) {
            let output = &tx.output[index];
            let Some(address) = extract_address(&output.script_pubkey, self.network) else {
                continue;
            };

            let Some(contract) = contracts
                .iter()
                .find(|contract| contract.delegate_address() == &address)
            else {
                continue;
            };

            tracing::info!(
                txid = %tx.compute_txid(),
                contract = %contract.originating_txid(),
                output = index,
                stake = %output.value,
                commission = %commission_amount,
                "tpos payout recognized"
            );

            return Some(PayoutSplit {
                stake_amount: output.value,
                commission_amount,
                delegate_address: address,
            });
        }

        None
    }
}

impl Default for PayoutClassifier {
    fn default() -> Self {
        Self::from_config(&TposConfig::default())
    }
}

fn net_change(credit: Amount, debit: Amount) -> Option<SignedAmount> {
    let credit = credit.to_signed().ok()?;
    let debit = debit.to_signed().ok()?;
    credit.checked_sub(debit)
}

/// Classify `tx` with the window and network from `config`.
pub fn classify_payout<'a>(
    tx: &Transaction,
    contracts: impl IntoIterator<Item = &'a Contract>,
    wallet: &impl WalletView,
    config: &TposConfig,
) -> Option<PayoutSplit> {
    PayoutClassifier::from_config(config).classify(tx, contracts, wallet)
}

/// Which side of a contract the wallet is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractRole {
    /// The wallet owns the merchant output
    Merchant,
    /// The wallet owns the delegate address
    Owner,
    /// The wallet owns both sides
    Both,
    /// The wallet owns neither side
    Unrelated,
}

impl ContractRole {
    pub fn is_merchant(self) -> bool {
        matches!(self, Self::Merchant | Self::Both)
    }

    pub fn is_owner(self) -> bool {
        matches!(self, Self::Owner | Self::Both)
    }
}

/// A decoded contract together with the wallet's role in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognizedContract {
    pub contract: Contract,
    pub role: ContractRole,
}

/// Wallet's role in an already decoded contract.
pub fn contract_role(
    contract: &Contract,
    network: Network,
    wallet: &impl WalletView,
) -> ContractRole {
    let merchant = wallet
        .output_script(&contract.merchant_outpoint())
        .and_then(|script| extract_address(&script, network))
        .is_some_and(|address| wallet.ownership(&address) == Ownership::Spendable);
    let owner = wallet.ownership(contract.delegate_address()) == Ownership::Spendable;

    match (merchant, owner) {
        (true, true) => ContractRole::Both,
        (true, false) => ContractRole::Merchant,
        (false, true) => ContractRole::Owner,
        (false, false) => ContractRole::Unrelated,
    }
}

/// Decode `tx` once and determine the wallet's role in it.
///
/// Returns `None` when `tx` is not a contract.
pub fn recognize(
    tx: &Transaction,
    network: Network,
    wallet: &impl WalletView,
) -> Option<RecognizedContract> {
    let contract = decode(tx, network).ok()?;
    let role = contract_role(&contract, network, wallet);
    Some(RecognizedContract { contract, role })
}

/// Returns true if `tx` is a contract whose merchant output the wallet can spend.
pub fn is_merchant_contract(tx: &Transaction, network: Network, wallet: &impl WalletView) -> bool {
    recognize(tx, network, wallet).is_some_and(|recognized| recognized.role.is_merchant())
}

/// Returns true if `tx` is a contract whose delegate address the wallet can spend.
pub fn is_owner_contract(tx: &Transaction, network: Network, wallet: &impl WalletView) -> bool {
    recognize(tx, network, wallet).is_some_and(|recognized| recognized.role.is_owner())
}
