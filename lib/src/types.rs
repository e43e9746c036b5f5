use alloy_primitives::{Address, B256, U256};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::hash::{keccak256, word_address, word_u256, word_u64};

// =============================================================================
//                              ASSET REFERENCE
// =============================================================================

/// One asset instance on its home ledger: (collection contract, token id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetRef {
    /// Collection (ERC-721 contract) address
    pub collection: Address,
    /// Token id within the collection
    pub token_id: U256,
}

impl AssetRef {
    pub fn new(collection: Address, token_id: U256) -> Self {
        Self {
            collection,
            token_id,
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.token_id)
    }
}

// =============================================================================
//                              TRANSFER ID
// =============================================================================

/// 256-bit identifier correlating a lock on the source ledger with its mint
/// (and a burn with its unlock).
///
///   transfer_id = keccak256(abi.encode(chainId, collection, tokenId, initiator, nonce, timestamp))
///
/// Each field occupies one 32-byte ABI slot, 192 bytes in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub B256);

impl TransferId {
    pub fn derive(
        chain_id: u64,
        asset: &AssetRef,
        initiator: &Address,
        nonce: u64,
        timestamp: u64,
    ) -> Self {
        let mut preimage = [0u8; 192];
        preimage[0..32].copy_from_slice(&word_u64(chain_id));
        preimage[32..64].copy_from_slice(&word_address(&asset.collection));
        preimage[64..96].copy_from_slice(&word_u256(asset.token_id));
        preimage[96..128].copy_from_slice(&word_address(initiator));
        preimage[128..160].copy_from_slice(&word_u64(nonce));
        preimage[160..192].copy_from_slice(&word_u64(timestamp));
        Self(B256::from(keccak256(&preimage)))
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<B256> for TransferId {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<TransferId> for B256 {
    fn from(value: TransferId) -> Self {
        value.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TransferId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(B256::from(bytes)))
    }
}

/// Destination-side id of a wrapped representation. Allocated from 1 upwards
/// and never reused, even after a burn.
pub type WrappedId = u64;

// =============================================================================
//                          TRANSACTION CONTEXT
// =============================================================================

/// The caller and block time a ledger call executes under
/// (`msg.sender` / `block.timestamp`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub sender: Address,
    pub timestamp: u64,
}

impl TxContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }
}

// =============================================================================
//                              LEDGER RECORDS
// =============================================================================

/// Source-side record of an outstanding lock. Present only while the asset is
/// locked; an absent record means `locked == false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// The transfer the lock was issued under
    pub transfer_id: TransferId,
    /// Account custody was taken from
    pub initiator: Address,
    pub locked_at: u64,
}

/// Destination-side representation of a locked source asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedAsset {
    pub wrapped_id: WrappedId,
    pub original: AssetRef,
    pub owner: Address,
    /// Transfer this representation was minted for
    pub transfer_id: TransferId,
    pub minted_at: u64,
}
