//! Events each ledger emits for the relay to observe. The two ledgers never
//! call each other; an event sitting in a ledger's outbox is the whole
//! cross-chain contract. Delivery is the relay's concern.

use std::collections::VecDeque;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::types::{AssetRef, TransferId, WrappedId};

// =============================================================================
//                              SOURCE EVENTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEvent {
    pub transfer_id: TransferId,
    pub asset: AssetRef,
    pub owner: Address,
    pub destination_chain_id: u64,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLockEvent {
    /// Transfer ids in emission order; the root is computed over this order
    pub transfer_ids: Vec<TransferId>,
    pub merkle_root: B256,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockEvent {
    pub transfer_id: TransferId,
    pub asset: AssetRef,
    pub recipient: Address,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SourceEvent {
    Locked(LockEvent),
    BatchLocked(BatchLockEvent),
    Unlocked(UnlockEvent),
}

// =============================================================================
//                           DESTINATION EVENTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintEvent {
    pub transfer_id: TransferId,
    pub recipient: Address,
    pub wrapped_id: WrappedId,
    pub original: AssetRef,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMintEvent {
    pub merkle_root: B256,
    /// Transfer ids actually minted by the call, in batch order
    pub transfer_ids: Vec<TransferId>,
    pub wrapped_ids: Vec<WrappedId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedTransferEvent {
    pub wrapped_id: WrappedId,
    pub from: Address,
    pub to: Address,
    pub timestamp: u64,
}

/// Emitted by `burn`; the relay forwards it to the source ledger's `unlock`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEvent {
    pub transfer_id: TransferId,
    pub wrapped_id: WrappedId,
    pub original: AssetRef,
    /// Owner at burn time; receives the original on unlock
    pub owner: Address,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DestinationEvent {
    Minted(MintEvent),
    BatchMinted(BatchMintEvent),
    WrappedTransferred(WrappedTransferEvent),
    Returned(ReturnEvent),
}

// =============================================================================
//                                 OUTBOX
// =============================================================================

/// FIFO of emitted events waiting for the relay to drain them.
#[derive(Clone, Debug)]
pub struct Outbox<E> {
    queue: VecDeque<E>,
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<E> Outbox<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, event: E) {
        self.queue.push_back(event);
    }

    pub(crate) fn emit_all(&mut self, events: impl IntoIterator<Item = E>) {
        self.queue.extend(events);
    }

    /// Remove and return every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<E> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &E> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
