//! Source ledger state: custody of locked originals, transfer id issuance and
//! the lock/unlock state machine.
//!
//!   Unlocked --lock--> Locked --unlock--> Unlocked
//!
//! Every entry point validates before it mutates, so a failed call leaves the
//! ledger exactly as it found it.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, error, info};

use crate::config::BridgeConfig;
use crate::custody::{Custody, CustodyError};
use crate::error::{BridgeError, Result};
use crate::events::{BatchLockEvent, LockEvent, Outbox, SourceEvent, UnlockEvent};
use crate::merkle::compute_root;
use crate::proof::ProofGate;
use crate::types::{AssetRef, LockRecord, TransferId, TxContext};

pub struct SourceLedger<G, C> {
    chain_id: u64,
    destination_chain_id: u64,
    bridge: Address,
    relayer: Address,
    max_batch_size: usize,
    gate: G,
    custody: C,
    /// Outstanding locks; absence means unlocked
    locks: HashMap<AssetRef, LockRecord>,
    /// Every transfer id ever issued, with the asset it locked. Append-only.
    completed: HashMap<TransferId, AssetRef>,
    nonce: u64,
    outbox: Outbox<SourceEvent>,
}

impl<G: ProofGate, C: Custody> SourceLedger<G, C> {
    pub fn new(config: &BridgeConfig, gate: G, custody: C) -> Self {
        Self {
            chain_id: config.source_chain_id,
            destination_chain_id: config.destination_chain_id,
            bridge: config.bridge_address,
            relayer: config.relayer,
            max_batch_size: config.max_batch_size,
            gate,
            custody,
            locks: HashMap::new(),
            completed: HashMap::new(),
            nonce: 0,
            outbox: Outbox::new(),
        }
    }

    // -------------------------------------------------------------------------
    //                              ENTRY POINTS
    // -------------------------------------------------------------------------

    /// Take custody of `asset` from the caller and issue a fresh transfer id.
    pub fn lock(&mut self, ctx: &TxContext, asset: AssetRef) -> Result<TransferId> {
        if self.locks.contains_key(&asset) {
            debug!(%asset, "lock rejected: already locked");
            return Err(BridgeError::AlreadyLocked(asset));
        }

        self.custody
            .transfer(&asset, ctx.sender, self.bridge)
            .map_err(|source| BridgeError::Custody { asset, source })?;

        let event = self.record_lock(ctx, asset);
        let transfer_id = event.transfer_id;
        self.outbox.emit(SourceEvent::Locked(event));

        info!(%transfer_id, %asset, initiator = %ctx.sender, "asset locked");
        Ok(transfer_id)
    }

    /// Lock `collections[i]#token_ids[i]` for every `i`, in order, and commit
    /// to the issued transfer ids with one Merkle root.
    ///
    /// All-or-nothing: if any custody transfer fails, custody already taken in
    /// this call is handed back and no lock persists.
    pub fn batch_lock(
        &mut self,
        ctx: &TxContext,
        collections: &[Address],
        token_ids: &[U256],
    ) -> Result<(Vec<TransferId>, B256)> {
        if collections.len() != token_ids.len() {
            return Err(BridgeError::ArityMismatch {
                field: "token_ids",
                expected: collections.len(),
                got: token_ids.len(),
            });
        }
        if collections.is_empty() {
            return Err(BridgeError::EmptyBatch);
        }
        if collections.len() > self.max_batch_size {
            return Err(BridgeError::BatchTooLarge {
                got: collections.len(),
                limit: self.max_batch_size,
            });
        }

        let assets: Vec<AssetRef> = collections
            .iter()
            .zip(token_ids)
            .map(|(collection, token_id)| AssetRef::new(*collection, *token_id))
            .collect();

        // A repeat inside the batch would be locked twice in one call
        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if self.locks.contains_key(asset) || !seen.insert(*asset) {
                debug!(%asset, "batch lock rejected: already locked");
                return Err(BridgeError::AlreadyLocked(*asset));
            }
        }

        for asset in &assets {
            self.ensure_owned_by(asset, ctx.sender)?;
        }

        for (taken, asset) in assets.iter().enumerate() {
            if let Err(source) = self.custody.transfer(asset, ctx.sender, self.bridge) {
                let stranded = self.return_custody(&assets[..taken], ctx.sender);
                if !stranded.is_empty() {
                    return Err(BridgeError::RollbackFailed { stranded, source });
                }
                return Err(BridgeError::Custody {
                    asset: *asset,
                    source,
                });
            }
        }

        let events: Vec<LockEvent> = assets
            .iter()
            .map(|asset| self.record_lock(ctx, *asset))
            .collect();
        let transfer_ids: Vec<TransferId> = events.iter().map(|e| e.transfer_id).collect();
        let leaves: Vec<B256> = transfer_ids.iter().map(TransferId::as_b256).collect();
        let merkle_root = compute_root(&leaves);

        self.outbox
            .emit_all(events.into_iter().map(SourceEvent::Locked));
        self.outbox.emit(SourceEvent::BatchLocked(BatchLockEvent {
            transfer_ids: transfer_ids.clone(),
            merkle_root,
            count: transfer_ids.len(),
        }));

        info!(
            count = transfer_ids.len(),
            %merkle_root,
            initiator = %ctx.sender,
            "batch locked"
        );
        Ok((transfer_ids, merkle_root))
    }

    /// Release `asset` to `recipient` once its wrapped representation has been
    /// burned. Relay only.
    pub fn unlock(
        &mut self,
        ctx: &TxContext,
        asset: AssetRef,
        recipient: Address,
        transfer_id: TransferId,
        proof: &[u8],
    ) -> Result<()> {
        if ctx.sender != self.relayer {
            return Err(BridgeError::Unauthorized(ctx.sender));
        }

        let record = self
            .locks
            .get(&asset)
            .ok_or(BridgeError::NotLocked(asset))?;

        // The id must have been issued, and for the lock that is outstanding
        // on this asset; this is what makes each id unlock at most once.
        if self.completed.get(&transfer_id) != Some(&asset) || record.transfer_id != transfer_id
        {
            debug!(%transfer_id, %asset, "unlock rejected: transfer does not match lock");
            return Err(BridgeError::UnknownTransfer(transfer_id));
        }

        if !self.gate.verify(proof, &transfer_id.as_b256()) {
            debug!(%transfer_id, "unlock rejected: proof");
            return Err(BridgeError::ProofRejected(transfer_id.as_b256()));
        }

        self.custody
            .transfer(&asset, self.bridge, recipient)
            .map_err(|source| BridgeError::Custody { asset, source })?;

        self.locks.remove(&asset);
        self.outbox.emit(SourceEvent::Unlocked(UnlockEvent {
            transfer_id,
            asset,
            recipient,
            timestamp: ctx.timestamp,
        }));

        info!(%transfer_id, %asset, %recipient, "asset unlocked");
        Ok(())
    }

    // -------------------------------------------------------------------------
    //                                QUERIES
    // -------------------------------------------------------------------------

    pub fn is_locked(&self, asset: &AssetRef) -> bool {
        self.locks.contains_key(asset)
    }

    pub fn lock_record(&self, asset: &AssetRef) -> Option<&LockRecord> {
        self.locks.get(asset)
    }

    /// Whether `transfer_id` was ever issued by a lock on this ledger.
    pub fn is_known_transfer(&self, transfer_id: &TransferId) -> bool {
        self.completed.contains_key(transfer_id)
    }

    /// Nonce the next lock will use.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn outbox(&self) -> &Outbox<SourceEvent> {
        &self.outbox
    }

    pub fn drain_events(&mut self) -> Vec<SourceEvent> {
        self.outbox.drain()
    }

    // -------------------------------------------------------------------------
    //                                INTERNALS
    // -------------------------------------------------------------------------

    /// Custody has already been taken. Issues the id and marks the asset locked.
    fn record_lock(&mut self, ctx: &TxContext, asset: AssetRef) -> LockEvent {
        let transfer_id =
            TransferId::derive(self.chain_id, &asset, &ctx.sender, self.nonce, ctx.timestamp);
        self.nonce += 1;

        self.locks.insert(
            asset,
            LockRecord {
                transfer_id,
                initiator: ctx.sender,
                locked_at: ctx.timestamp,
            },
        );
        self.completed.insert(transfer_id, asset);

        LockEvent {
            transfer_id,
            asset,
            owner: ctx.sender,
            destination_chain_id: self.destination_chain_id,
            timestamp: ctx.timestamp,
        }
    }

    fn ensure_owned_by(&self, asset: &AssetRef, owner: Address) -> Result<()> {
        let source = match self.custody.owner_of(asset) {
            Some(current) if current == owner => return Ok(()),
            Some(current) => CustodyError::NotOwner {
                asset: *asset,
                from: owner,
                owner: current,
            },
            None => CustodyError::UnknownAsset(*asset),
        };
        debug!(%asset, %owner, %source, "batch lock rejected: custody precheck");
        Err(BridgeError::Custody {
            asset: *asset,
            source,
        })
    }

    /// Hand back custody taken by an aborted batch lock. Returns the assets
    /// that could not be handed back and are still held by the bridge.
    fn return_custody(&mut self, taken: &[AssetRef], owner: Address) -> Vec<AssetRef> {
        let mut stranded = Vec::new();
        for asset in taken.iter().rev() {
            if let Err(err) = self.custody.transfer(asset, self.bridge, owner) {
                error!(%asset, %owner, %err, "failed to return custody after aborted batch lock");
                stranded.push(*asset);
            }
        }
        stranded
    }
}
