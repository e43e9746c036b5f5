//! Destination ledger state: the wrapped-asset registry and the replay guard
//! on consumed transfer ids.

use std::collections::{BTreeMap, HashSet};

use alloy_primitives::{Address, B256};
use tracing::{debug, info, warn};

use crate::config::{BatchMintPolicy, BridgeConfig};
use crate::error::{BridgeError, Result};
use crate::events::{
    BatchMintEvent, DestinationEvent, MintEvent, Outbox, ReturnEvent, WrappedTransferEvent,
};
use crate::merkle::compute_root;
use crate::proof::ProofGate;
use crate::types::{AssetRef, TransferId, TxContext, WrappedAsset, WrappedId};

/// Result of a `batch_mint` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchMintOutcome {
    /// Newly allocated wrapped ids, in batch order
    pub wrapped_ids: Vec<WrappedId>,
    /// Transfer ids passed over because they were already minted.
    /// Always empty under `BatchMintPolicy::Atomic`.
    pub skipped: Vec<TransferId>,
}

pub struct DestinationLedger<G> {
    relayer: Address,
    max_batch_size: usize,
    policy: BatchMintPolicy,
    gate: G,
    /// Consumed transfer ids. Append-only, survives burns.
    minted: HashSet<TransferId>,
    wrapped: BTreeMap<WrappedId, WrappedAsset>,
    next_wrapped_id: WrappedId,
    outbox: Outbox<DestinationEvent>,
}

impl<G: ProofGate> DestinationLedger<G> {
    pub fn new(config: &BridgeConfig, gate: G) -> Self {
        Self {
            relayer: config.relayer,
            max_batch_size: config.max_batch_size,
            policy: config.batch_mint_policy,
            gate,
            minted: HashSet::new(),
            wrapped: BTreeMap::new(),
            next_wrapped_id: 1,
            outbox: Outbox::new(),
        }
    }

    // -------------------------------------------------------------------------
    //                              ENTRY POINTS
    // -------------------------------------------------------------------------

    /// Mint a wrapped representation of `original` for `recipient`. Relay only.
    /// A transfer id mints at most once, whatever the other arguments are.
    pub fn mint(
        &mut self,
        ctx: &TxContext,
        recipient: Address,
        original: AssetRef,
        transfer_id: TransferId,
        proof: &[u8],
    ) -> Result<WrappedId> {
        self.ensure_relayer(ctx)?;

        if self.minted.contains(&transfer_id) {
            debug!(%transfer_id, "mint rejected: already minted");
            return Err(BridgeError::AlreadyMinted(transfer_id));
        }
        if !self.gate.verify(proof, &transfer_id.as_b256()) {
            debug!(%transfer_id, "mint rejected: proof");
            return Err(BridgeError::ProofRejected(transfer_id.as_b256()));
        }

        Ok(self.issue(ctx, recipient, original, transfer_id))
    }

    /// Mint a whole batch behind one proof over its Merkle root.
    ///
    /// The root is recomputed here from `transfer_ids` exactly as the source
    /// ledger computed it. Already-minted elements are handled per the
    /// configured [`BatchMintPolicy`].
    pub fn batch_mint(
        &mut self,
        ctx: &TxContext,
        recipients: &[Address],
        originals: &[AssetRef],
        transfer_ids: &[TransferId],
        claimed_root: B256,
        proof: &[u8],
    ) -> Result<BatchMintOutcome> {
        self.ensure_relayer(ctx)?;

        let count = transfer_ids.len();
        if recipients.len() != count {
            return Err(BridgeError::ArityMismatch {
                field: "recipients",
                expected: count,
                got: recipients.len(),
            });
        }
        if originals.len() != count {
            return Err(BridgeError::ArityMismatch {
                field: "originals",
                expected: count,
                got: originals.len(),
            });
        }
        if count == 0 {
            return Err(BridgeError::EmptyBatch);
        }
        if count > self.max_batch_size {
            return Err(BridgeError::BatchTooLarge {
                got: count,
                limit: self.max_batch_size,
            });
        }

        let leaves: Vec<B256> = transfer_ids.iter().map(TransferId::as_b256).collect();
        let computed = compute_root(&leaves);
        if computed != claimed_root {
            debug!(claimed = %claimed_root, %computed, "batch mint rejected: root");
            return Err(BridgeError::BadMerkleRoot {
                claimed: claimed_root,
                computed,
            });
        }
        if !self.gate.verify(proof, &claimed_root) {
            debug!(root = %claimed_root, "batch mint rejected: proof");
            return Err(BridgeError::ProofRejected(claimed_root));
        }

        // Decide every element before touching state
        let mut seen = HashSet::with_capacity(count);
        let mut accepted = Vec::with_capacity(count);
        let mut skipped = Vec::new();
        for (index, transfer_id) in transfer_ids.iter().enumerate() {
            let fresh = !self.minted.contains(transfer_id) && seen.insert(*transfer_id);
            match (fresh, self.policy) {
                (true, _) => accepted.push(index),
                (false, BatchMintPolicy::Atomic) => {
                    debug!(%transfer_id, "batch mint rejected: already minted");
                    return Err(BridgeError::AlreadyMinted(*transfer_id));
                }
                (false, BatchMintPolicy::SkipMinted) => {
                    warn!(%transfer_id, index, "batch mint skipping already minted transfer");
                    skipped.push(*transfer_id);
                }
            }
        }

        let wrapped_ids: Vec<WrappedId> = accepted
            .iter()
            .map(|&i| self.issue(ctx, recipients[i], originals[i], transfer_ids[i]))
            .collect();

        if !wrapped_ids.is_empty() {
            self.outbox.emit(DestinationEvent::BatchMinted(BatchMintEvent {
                merkle_root: claimed_root,
                transfer_ids: accepted.iter().map(|&i| transfer_ids[i]).collect(),
                wrapped_ids: wrapped_ids.clone(),
            }));
        }

        info!(
            root = %claimed_root,
            minted = wrapped_ids.len(),
            skipped = skipped.len(),
            "batch minted"
        );
        Ok(BatchMintOutcome {
            wrapped_ids,
            skipped,
        })
    }

    /// Move a wrapped asset to a new owner on the destination ledger.
    pub fn transfer_wrapped(
        &mut self,
        ctx: &TxContext,
        wrapped_id: WrappedId,
        to: Address,
    ) -> Result<()> {
        let record = self.owned_by_caller(ctx, wrapped_id)?;
        let from = record.owner;

        if let Some(record) = self.wrapped.get_mut(&wrapped_id) {
            record.owner = to;
        }
        self.outbox
            .emit(DestinationEvent::WrappedTransferred(WrappedTransferEvent {
                wrapped_id,
                from,
                to,
                timestamp: ctx.timestamp,
            }));

        info!(wrapped_id, %from, %to, "wrapped asset transferred");
        Ok(())
    }

    /// Destroy a wrapped asset and emit the return event the relay forwards to
    /// the source ledger's `unlock`.
    pub fn burn(
        &mut self,
        ctx: &TxContext,
        wrapped_id: WrappedId,
        transfer_id: TransferId,
        proof: &[u8],
    ) -> Result<()> {
        let record = self.owned_by_caller(ctx, wrapped_id)?;
        if record.transfer_id != transfer_id {
            debug!(wrapped_id, %transfer_id, "burn rejected: transfer does not match");
            return Err(BridgeError::UnknownTransfer(transfer_id));
        }
        if !self.gate.verify(proof, &transfer_id.as_b256()) {
            debug!(%transfer_id, "burn rejected: proof");
            return Err(BridgeError::ProofRejected(transfer_id.as_b256()));
        }

        self.wrapped.remove(&wrapped_id);
        self.outbox.emit(DestinationEvent::Returned(ReturnEvent {
            transfer_id,
            wrapped_id,
            original: record.original,
            owner: record.owner,
            timestamp: ctx.timestamp,
        }));

        info!(wrapped_id, %transfer_id, owner = %record.owner, "wrapped asset burned");
        Ok(())
    }

    // -------------------------------------------------------------------------
    //                                QUERIES
    // -------------------------------------------------------------------------

    pub fn is_minted(&self, transfer_id: &TransferId) -> bool {
        self.minted.contains(transfer_id)
    }

    /// The original asset a live wrapped id stands for.
    pub fn wrapped_asset_info(&self, wrapped_id: WrappedId) -> Option<AssetRef> {
        self.wrapped.get(&wrapped_id).map(|w| w.original)
    }

    pub fn owner_of_wrapped(&self, wrapped_id: WrappedId) -> Option<Address> {
        self.wrapped.get(&wrapped_id).map(|w| w.owner)
    }

    /// The live wrapped asset minted for `transfer_id`, if not yet burned.
    pub fn find_by_transfer(&self, transfer_id: &TransferId) -> Option<&WrappedAsset> {
        self.wrapped
            .values()
            .find(|w| w.transfer_id == *transfer_id)
    }

    /// Id the next mint will allocate.
    pub fn next_wrapped_id(&self) -> WrappedId {
        self.next_wrapped_id
    }

    pub fn wrapped_count(&self) -> usize {
        self.wrapped.len()
    }

    pub fn outbox(&self) -> &Outbox<DestinationEvent> {
        &self.outbox
    }

    pub fn drain_events(&mut self) -> Vec<DestinationEvent> {
        self.outbox.drain()
    }

    // -------------------------------------------------------------------------
    //                                INTERNALS
    // -------------------------------------------------------------------------

    fn ensure_relayer(&self, ctx: &TxContext) -> Result<()> {
        if ctx.sender != self.relayer {
            debug!(caller = %ctx.sender, "rejected: caller is not the relayer");
            return Err(BridgeError::Unauthorized(ctx.sender));
        }
        Ok(())
    }

    fn owned_by_caller(&self, ctx: &TxContext, wrapped_id: WrappedId) -> Result<WrappedAsset> {
        let record = self
            .wrapped
            .get(&wrapped_id)
            .copied()
            .ok_or(BridgeError::UnknownWrappedAsset(wrapped_id))?;
        if record.owner != ctx.sender {
            return Err(BridgeError::NotOwner {
                wrapped_id,
                caller: ctx.sender,
            });
        }
        Ok(record)
    }

    /// All checks have passed. Consumes the transfer id and allocates the next
    /// wrapped id.
    fn issue(
        &mut self,
        ctx: &TxContext,
        recipient: Address,
        original: AssetRef,
        transfer_id: TransferId,
    ) -> WrappedId {
        let wrapped_id = self.next_wrapped_id;
        self.next_wrapped_id += 1;

        self.minted.insert(transfer_id);
        self.wrapped.insert(
            wrapped_id,
            WrappedAsset {
                wrapped_id,
                original,
                owner: recipient,
                transfer_id,
                minted_at: ctx.timestamp,
            },
        );
        self.outbox.emit(DestinationEvent::Minted(MintEvent {
            transfer_id,
            recipient,
            wrapped_id,
            original,
            timestamp: ctx.timestamp,
        }));

        info!(%transfer_id, wrapped_id, %recipient, %original, "wrapped asset minted");
        wrapped_id
    }
}
