use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// How `batch_mint` treats an element whose transfer was already minted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMintPolicy {
    /// Any already-minted element fails the whole batch before mutation.
    #[default]
    Atomic,
    /// Already-minted elements are skipped and reported; the rest are minted.
    SkipMinted,
}

impl core::str::FromStr for BatchMintPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(Self::Atomic),
            "skip-minted" => Ok(Self::SkipMinted),
            other => Err(format!(
                "unknown batch mint policy `{other}` (expected `atomic` or `skip-minted`)"
            )),
        }
    }
}

/// Parameters shared by both ledger states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Chain the originals live on; part of every transfer id
    pub source_chain_id: u64,
    /// Chain the wrapped representations are minted on
    pub destination_chain_id: u64,
    /// Account holding locked assets on the source chain
    pub bridge_address: Address,
    /// Operating identity of the relay; the only caller allowed to mint and unlock
    pub relayer: Address,
    pub max_batch_size: usize,
    pub batch_mint_policy: BatchMintPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source_chain_id: 1,
            destination_chain_id: 2,
            bridge_address: Address::ZERO,
            relayer: Address::ZERO,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_mint_policy: BatchMintPolicy::Atomic,
        }
    }
}
