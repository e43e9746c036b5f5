//! Operator CLI for the NFT bridge core.
//!
//! Subcommands:
//!   root         - Merkle root over a JSON list of transfer ids
//!   verify-root  - Check a claimed root against a JSON list of transfer ids
//!   inclusion    - Inclusion proof for one transfer id of a batch
//!   transfer-id  - Derive a transfer id from its inputs

use std::fs;

use alloy_primitives::{Address, B256, U256};
use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use nft_bridge_lib::{
    compute_proof, compute_root, verify_root, AssetRef, MerkleProofStep, TransferId,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "nft-bridge")]
#[command(about = "Batch commitments and transfer ids for the NFT bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the Merkle root of a batch
    Root {
        /// Path to a JSON array of 0x-prefixed transfer ids, in batch order
        #[arg(long)]
        input: String,
    },
    /// Recompute a batch root and compare it with a claimed one
    VerifyRoot {
        /// Path to a JSON array of 0x-prefixed transfer ids, in batch order
        #[arg(long)]
        input: String,
        /// Claimed root (0x-prefixed hex)
        #[arg(long)]
        root: B256,
    },
    /// Build the inclusion proof for one entry of a batch
    Inclusion {
        /// Path to a JSON array of 0x-prefixed transfer ids, in batch order
        #[arg(long)]
        input: String,
        /// Position of the transfer id in the batch
        #[arg(long)]
        index: usize,
        /// Path to write the proof JSON (stdout if omitted)
        #[arg(long)]
        output: Option<String>,
    },
    /// Derive the transfer id a lock would issue
    TransferId {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        collection: Address,
        #[arg(long)]
        token_id: U256,
        #[arg(long)]
        initiator: Address,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Serialize)]
struct RootOutput {
    root: B256,
    count: usize,
}

#[derive(Serialize)]
struct VerifyOutput {
    valid: bool,
    claimed: B256,
    computed: B256,
}

#[derive(Serialize)]
struct InclusionOutput {
    leaf: TransferId,
    index: usize,
    root: B256,
    proof: Vec<MerkleProofStep>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    nft_bridge_script::setup_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Root { input } => {
            let ids = read_transfer_ids(&input)?;
            let root = compute_root(&leaves(&ids));
            print_json(&RootOutput {
                root,
                count: ids.len(),
            })?;
        }
        Commands::VerifyRoot { input, root } => {
            let ids = read_transfer_ids(&input)?;
            let leaves = leaves(&ids);
            print_json(&VerifyOutput {
                valid: verify_root(&leaves, &root),
                claimed: root,
                computed: compute_root(&leaves),
            })?;
        }
        Commands::Inclusion {
            input,
            index,
            output,
        } => {
            let ids = read_transfer_ids(&input)?;
            let leaves = leaves(&ids);
            let proof = compute_proof(&leaves, index)
                .with_context(|| format!("index {index} out of range for {} ids", ids.len()))?;
            let out = InclusionOutput {
                leaf: ids[index],
                index,
                root: compute_root(&leaves),
                proof,
            };
            match output {
                Some(path) => {
                    fs::write(&path, serde_json::to_string_pretty(&out)?)?;
                    println!("Inclusion proof written to {path}");
                }
                None => print_json(&out)?,
            }
        }
        Commands::TransferId {
            chain_id,
            collection,
            token_id,
            initiator,
            nonce,
            timestamp,
        } => {
            let asset = AssetRef::new(collection, token_id);
            let id = TransferId::derive(chain_id, &asset, &initiator, nonce, timestamp);
            println!("{id}");
        }
    }

    Ok(())
}

fn read_transfer_ids(path: &str) -> Result<Vec<TransferId>> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let ids: Vec<TransferId> =
        serde_json::from_str(&json).with_context(|| format!("parsing transfer ids in {path}"))?;
    ensure!(!ids.is_empty(), "{path} contains no transfer ids");
    Ok(ids)
}

fn leaves(ids: &[TransferId]) -> Vec<B256> {
    ids.iter().map(TransferId::as_b256).collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
