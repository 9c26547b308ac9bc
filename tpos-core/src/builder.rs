//! # Contract Transactions
//!
//! Encoding side of the protocol: the two outputs that define a contract, and
//! a builder that hands them to the wallet for funding and checks the result.

use bitcoin::{Address, Amount, Network, OutPoint, Transaction, TxOut};

use crate::{
    contract::decode,
    error::Result,
    script::{build_marker_script, is_unspendable, MAX_OP_RETURN_RELAY},
    CommissionConvention, TposConfig, TposError,
};

/// Parameters of a new contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractParams {
    /// Address receiving the staking rewards
    pub delegate: Address,
    /// Value sent to the delegate address
    pub amount: Amount,
    /// Merchant output backing the contract
    pub merchant_outpoint: OutPoint,
    /// Merchant commission, in percent
    pub commission: u8,
}

/// Build the contract outputs: `(delegate, amount)` then `(marker, 0)`.
pub fn encode_marker_outputs(
    params: &ContractParams,
    convention: CommissionConvention,
) -> Result<Vec<TxOut>> {
    if params.commission == 0 || params.commission >= 100 {
        return Err(TposError::InvalidCommission(params.commission));
    }

    let marker = build_marker_script(
        convention.stored_value(params.commission),
        &params.merchant_outpoint,
    );

    Ok(vec![
        TxOut {
            value: params.amount,
            script_pubkey: params.delegate.script_pubkey(),
        },
        TxOut {
            value: Amount::ZERO,
            script_pubkey: marker,
        },
    ])
}

/// Transaction construction service of the wallet.
pub trait TransactionFunder {
    /// Whether the wallet can sign right now.
    fn is_locked(&self) -> bool;

    /// Select coins, add fees and change, and sign.
    ///
    /// `outputs` must stay at the front of the transaction in the given order.
    fn fund_transaction(&self, outputs: Vec<TxOut>) -> Result<Transaction>;
}

/// Creates signed contract transactions.
#[derive(Clone, Debug)]
pub struct ContractTransactionBuilder {
    network: Network,
    convention: CommissionConvention,
}

impl ContractTransactionBuilder {
    pub fn new(network: Network, convention: CommissionConvention) -> Self {
        Self {
            network,
            convention,
        }
    }

    pub fn from_config(config: &TposConfig) -> Self {
        Self::new(config.network, config.commission_convention)
    }

    /// Build, fund and check a contract transaction.
    pub fn build(
        &self,
        funder: &impl TransactionFunder,
        params: &ContractParams,
    ) -> Result<Transaction> {
        let outputs = encode_marker_outputs(params, self.convention)?;

        if funder.is_locked() {
            return Err(TposError::WalletLocked);
        }

        let delegate_output = outputs[0].clone();
        let tx = funder.fund_transaction(outputs)?;

        self.check_standard(&tx, &delegate_output).inspect_err(|error| {
            tracing::warn!(
                txid = %tx.compute_txid(),
                %error,
                "rejecting funded contract transaction"
            );
        })?;

        tracing::info!(
            txid = %tx.compute_txid(),
            delegate = %params.delegate,
            merchant = %params.merchant_outpoint,
            commission = params.commission,
            "tpos contract transaction created"
        );
        Ok(tx)
    }

    fn check_standard(&self, tx: &Transaction, delegate_output: &TxOut) -> Result<()> {
        if tx.output.first() != Some(delegate_output) {
            return Err(TposError::NonStandard(
                "delegate output is not the first output".to_string(),
            ));
        }

        decode(tx, self.network).map_err(|e| TposError::NonStandard(e.to_string()))?;

        // Decoding guarantees a single unspendable output.
        let oversized = tx.output.iter().any(|output| {
            is_unspendable(&output.script_pubkey)
                && output.script_pubkey.len() > MAX_OP_RETURN_RELAY
        });
        if oversized {
            return Err(TposError::NonStandard("marker exceeds relay limit".to_string()));
        }

        let dust_limit = delegate_output.script_pubkey.minimal_non_dust();
        if delegate_output.value < dust_limit {
            return Err(TposError::NonStandard(format!(
                "delegate output of {} is below the dust limit of {}",
                delegate_output.value, dust_limit
            )));
        }

        Ok(())
    }
}
