//! Environment configuration (optionally loaded from `.env`).
//!
//! Env vars (all optional):
//!   SOURCE_CHAIN_ID       chain id of the source ledger (default: 1)
//!   DESTINATION_CHAIN_ID  chain id of the destination ledger (default: 2)
//!   BRIDGE_ADDRESS        custody account on the source ledger
//!   RELAYER_ADDRESS       relay operating identity (the only minter/unlocker)
//!   MAX_BATCH_SIZE        batch lock/mint limit (default: 100)
//!   BATCH_MINT_POLICY     `atomic` or `skip-minted` (default: atomic)
//!   POLL_INTERVAL_MS      relay poll interval (default: 250)
//!   PROOF_LEN             placeholder proof length in bytes (default: 256)

use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{ensure, Context, Result};
use nft_bridge_lib::{BatchMintPolicy, BridgeConfig, PLACEHOLDER_PROOF_LEN};

pub const DEFAULT_BRIDGE_ADDRESS: Address = Address::new([0xB1; 20]);
pub const DEFAULT_RELAYER_ADDRESS: Address = Address::new([0x4E; 20]);
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

#[derive(Clone, Debug)]
pub struct ScriptConfig {
    pub bridge: BridgeConfig,
    pub poll_interval: Duration,
    pub proof_len: usize,
}

impl ScriptConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = BridgeConfig::default();

        let source_chain_id: u64 = match lookup("SOURCE_CHAIN_ID") {
            Some(v) => v.parse().context("SOURCE_CHAIN_ID must be a number")?,
            None => defaults.source_chain_id,
        };
        let destination_chain_id: u64 = match lookup("DESTINATION_CHAIN_ID") {
            Some(v) => v.parse().context("DESTINATION_CHAIN_ID must be a number")?,
            None => defaults.destination_chain_id,
        };
        ensure!(
            source_chain_id != destination_chain_id,
            "SOURCE_CHAIN_ID and DESTINATION_CHAIN_ID must differ (both {source_chain_id})"
        );

        let bridge_address: Address = match lookup("BRIDGE_ADDRESS") {
            Some(v) => v.parse().context("BRIDGE_ADDRESS is not a valid address")?,
            None => DEFAULT_BRIDGE_ADDRESS,
        };
        let relayer: Address = match lookup("RELAYER_ADDRESS") {
            Some(v) => v.parse().context("RELAYER_ADDRESS is not a valid address")?,
            None => DEFAULT_RELAYER_ADDRESS,
        };
        ensure!(!relayer.is_zero(), "RELAYER_ADDRESS must not be the zero address");

        let max_batch_size: usize = match lookup("MAX_BATCH_SIZE") {
            Some(v) => v.parse().context("MAX_BATCH_SIZE must be a number")?,
            None => defaults.max_batch_size,
        };
        ensure!(max_batch_size > 0, "MAX_BATCH_SIZE must be at least 1");

        let batch_mint_policy: BatchMintPolicy = match lookup("BATCH_MINT_POLICY") {
            Some(v) => v.parse::<BatchMintPolicy>().map_err(anyhow::Error::msg)?,
            None => defaults.batch_mint_policy,
        };

        let poll_interval_ms: u64 = lookup("POLL_INTERVAL_MS")
            .unwrap_or_else(|| DEFAULT_POLL_INTERVAL_MS.to_string())
            .parse()
            .context("POLL_INTERVAL_MS must be a number")?;
        ensure!(poll_interval_ms > 0, "POLL_INTERVAL_MS must be positive");

        let proof_len: usize = lookup("PROOF_LEN")
            .unwrap_or_else(|| PLACEHOLDER_PROOF_LEN.to_string())
            .parse()
            .context("PROOF_LEN must be a number")?;

        Ok(Self {
            bridge: BridgeConfig {
                source_chain_id,
                destination_chain_id,
                bridge_address,
                relayer,
                max_batch_size,
                batch_mint_policy,
            },
            poll_interval: Duration::from_millis(poll_interval_ms),
            proof_len,
        })
    }
}
