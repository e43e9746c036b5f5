//! Core of a lock-and-mint NFT bridge between two independent ledgers.
//!
//! - [`SourceLedger`] holds custody of locked originals and issues transfer ids.
//! - [`DestinationLedger`] mints and burns wrapped representations and refuses
//!   to consume a transfer id twice.
//! - [`merkle`] commits a batch of transfer ids to one root that both ledgers
//!   recompute independently.
//! - [`ProofGate`] is the single seam where proof verification plugs in.
//!
//! The ledgers share no state. Everything crosses the boundary as an event in
//! one ledger's [`Outbox`] that a relay turns into a call on the other.

pub mod config;
pub mod custody;
pub mod destination;
pub mod error;
pub mod events;
pub mod hash;
pub mod merkle;
pub mod proof;
pub mod source;
pub mod types;

pub use alloy_primitives::{Address, B256, U256};

pub use crate::config::{BatchMintPolicy, BridgeConfig};
pub use crate::custody::{Custody, CustodyError, NftRegistry};
pub use crate::destination::{BatchMintOutcome, DestinationLedger};
pub use crate::error::{BridgeError, Result};
pub use crate::events::{
    BatchLockEvent, BatchMintEvent, DestinationEvent, LockEvent, MintEvent, Outbox, ReturnEvent,
    SourceEvent, UnlockEvent, WrappedTransferEvent,
};
pub use crate::hash::{hash_pair, keccak256};
pub use crate::merkle::{
    compute_proof, compute_root, verify_merkle_proof, verify_root, MerkleProofStep, EMPTY_ROOT,
};
pub use crate::proof::{PlaceholderGate, ProofGate, PLACEHOLDER_PROOF_LEN};
pub use crate::source::SourceLedger;
pub use crate::types::{AssetRef, LockRecord, TransferId, TxContext, WrappedAsset, WrappedId};
