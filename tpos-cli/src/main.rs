//! # TPoS CLI
//!
//! Command-line interface for inspecting and preparing TPoS delegation contracts.

use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use bitcoin::{consensus, Address, Amount, Network, OutPoint, Transaction};
use clap::{Parser, Subcommand};
use colored::*;
use tpos_core::{
    decode, encode_marker_outputs, export_block, import_block, import_contract, script,
    CommissionConvention, Contract, ContractParams, TposConfig,
};

#[derive(Parser)]
#[command(name = "tpos")]
#[command(about = "Trustless proof-of-stake delegation contracts")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network override (bitcoin, testnet, signet, regtest)
    #[arg(short, long, global = true)]
    network: Option<Network>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a contract from a raw transaction
    Decode {
        /// Consensus-encoded transaction (hex)
        tx_hex: String,
    },
    /// Build the outputs of a new contract
    Encode {
        /// Delegate address receiving staking rewards
        #[arg(short, long)]
        delegate: String,
        /// Amount sent to the delegate address (satoshis)
        #[arg(short, long)]
        amount: u64,
        /// Merchant outpoint (txid:vout)
        #[arg(short, long)]
        merchant: OutPoint,
        /// Merchant commission in percent (1-99)
        #[arg(short = 'p', long)]
        commission: u8,
        /// Store the commission as-is instead of its complement
        #[arg(long)]
        direct: bool,
    },
    /// Wrap a payload in an export block
    Export {
        /// Payload to frame
        payload: String,
    },
    /// Extract the payload of an export block
    Import {
        /// File holding the block (stdin if omitted)
        file: Option<PathBuf>,
        /// Decode the payload as a contract transaction
        #[arg(short, long)]
        decode: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => TposConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TposConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Decode { tx_hex } => {
            let bytes = hex::decode(tx_hex.trim()).context("transaction is not valid hex")?;
            let tx: Transaction =
                consensus::deserialize(&bytes).context("transaction does not deserialize")?;

            match decode(&tx, config.network) {
                Ok(contract) => print_contract(&contract),
                Err(error) => {
                    println!("{}: {}", "Not a TPoS contract".red().bold(), error);
                }
            }
        }

        Commands::Encode {
            delegate,
            amount,
            merchant,
            commission,
            direct,
        } => {
            let delegate = Address::from_str(&delegate)?.require_network(config.network)?;
            let convention = if direct {
                CommissionConvention::Direct
            } else {
                config.commission_convention
            };
            let params = ContractParams {
                delegate,
                amount: Amount::from_sat(amount),
                merchant_outpoint: merchant,
                commission,
            };

            let outputs = encode_marker_outputs(&params, convention)?;

            println!("{}", "Contract Outputs".green().bold());
            println!("{}", "═".repeat(50).bright_black());
            for (index, output) in outputs.iter().enumerate() {
                println!(
                    "{} {}: {} sat",
                    "Output".yellow().bold(),
                    index,
                    output.value.to_sat()
                );
                println!("  {}: {}", "asm".bright_black(), output.script_pubkey.to_asm_string());
                println!("  {}: {}", "hex".bright_black(), output.script_pubkey.to_hex_string());
            }
            let marker = script::disassemble(&outputs[1].script_pubkey)?;
            println!("{}: {}", "Marker".cyan().bold(), marker.join(" "));
            println!("{}", "═".repeat(50).bright_black());
            println!(
                "{}",
                "Fund these outputs with the delegate payment first.".bright_blue()
            );
        }

        Commands::Export { payload } => {
            println!("{}", export_block(payload.trim()));
        }

        Commands::Import { file, decode } => {
            let block = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };

            if decode {
                let (tx, contract) = import_contract(&block, config.network)?;
                println!("{}: {}", "Transaction".yellow().bold(), tx.compute_txid());
                print_contract(&contract);
            } else {
                let payload = import_block(&block);
                if payload.is_empty() {
                    anyhow::bail!("input is not a TPoS export block");
                }
                println!("{payload}");
            }
        }

        Commands::Config => {
            println!("{}", config.to_json_string()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_contract(contract: &Contract) {
    println!("{}", "TPoS Contract".green().bold());
    println!("{}", "═".repeat(50).bright_black());
    println!(
        "{}: {}",
        "Contract Tx".yellow().bold(),
        contract.originating_txid()
    );
    println!(
        "{}: {}",
        "Delegate Address".cyan().bold(),
        contract.delegate_address()
    );
    println!(
        "{}: {}",
        "Merchant Output".yellow().bold(),
        contract.merchant_outpoint()
    );
    println!(
        "{}: {}%",
        "Commission".yellow().bold(),
        contract.commission_percent()
    );
    println!("{}", "═".repeat(50).bright_black());
}
