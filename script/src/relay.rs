//! In-process relay: polls each ledger's outbox on a fixed interval and turns
//! source locks into destination mints and destination burns into source
//! unlocks.
//!
//! The relay holds no bridge state of its own. Redelivery is safe because the
//! ledgers reject a second mint or unlock of the same transfer id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256};
use nft_bridge_lib::{
    BatchLockEvent, BridgeError, Custody, DestinationEvent, DestinationLedger, LockEvent,
    ProofGate, ReturnEvent, SourceEvent, SourceLedger, TransferId, TxContext, WrappedId,
};
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("batch {root} references transfer {transfer_id} without a lock event")]
    MissingLockEvent { root: B256, transfer_id: TransferId },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// One thing the relay did, recorded for the operator journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelayAction {
    Minted {
        transfer_id: TransferId,
        wrapped_id: WrappedId,
    },
    BatchMinted {
        merkle_root: B256,
        wrapped_ids: Vec<WrappedId>,
        skipped: Vec<TransferId>,
    },
    /// Redelivered transfer the destination had already consumed
    Duplicate { transfer_id: TransferId },
    Unlocked {
        transfer_id: TransferId,
        recipient: Address,
    },
    Failed {
        transfer_id: Option<TransferId>,
        error: String,
    },
}

pub struct Relayer<G, C> {
    source: Arc<Mutex<SourceLedger<G, C>>>,
    destination: Arc<Mutex<DestinationLedger<G>>>,
    identity: Address,
    proof: Vec<u8>,
    /// Returns whose unlock hit a transient failure, retried next poll
    pending_returns: Vec<ReturnEvent>,
    journal: Vec<RelayAction>,
}

impl<G, C> Relayer<G, C>
where
    G: ProofGate,
    C: Custody,
{
    /// `identity` must be the relayer address both ledgers were configured
    /// with. `proof` is attached to every mint, batch mint and unlock.
    pub fn new(
        source: Arc<Mutex<SourceLedger<G, C>>>,
        destination: Arc<Mutex<DestinationLedger<G>>>,
        identity: Address,
        proof: Vec<u8>,
    ) -> Self {
        Self {
            source,
            destination,
            identity,
            proof,
            pending_returns: Vec::new(),
            journal: Vec::new(),
        }
    }

    pub fn journal(&self) -> &[RelayAction] {
        &self.journal
    }

    /// Poll every `poll_interval` until `shutdown` fires, then do one final
    /// poll and hand back the journal.
    pub async fn run(
        mut self,
        poll_interval: Duration,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Vec<RelayAction> {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = &mut shutdown => {
                    self.poll_once().await;
                    break;
                }
            }
        }
        self.journal
    }

    /// Drain both outboxes once and act on everything found. Returns the
    /// actions taken in this round.
    pub async fn poll_once(&mut self) -> Vec<RelayAction> {
        let start = self.journal.len();

        let source_events = self.source.lock().await.drain_events();
        if !source_events.is_empty() {
            self.relay_locks(source_events).await;
        }

        let mut returns = std::mem::take(&mut self.pending_returns);
        returns.extend(
            self.destination
                .lock()
                .await
                .drain_events()
                .into_iter()
                .filter_map(|event| match event {
                    DestinationEvent::Returned(ret) => Some(ret),
                    _ => None,
                }),
        );
        for ret in returns {
            self.relay_return(ret).await;
        }

        self.journal[start..].to_vec()
    }

    async fn relay_locks(&mut self, events: Vec<SourceEvent>) {
        // Per-element lock events of a batch are minted through the batch
        let batched: HashSet<TransferId> = events
            .iter()
            .filter_map(|event| match event {
                SourceEvent::BatchLocked(batch) => Some(batch.transfer_ids.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect();
        let locks: HashMap<TransferId, LockEvent> = events
            .iter()
            .filter_map(|event| match event {
                SourceEvent::Locked(lock) => Some((lock.transfer_id, lock.clone())),
                _ => None,
            })
            .collect();

        for event in &events {
            match event {
                SourceEvent::Locked(lock) if !batched.contains(&lock.transfer_id) => {
                    self.relay_lock(lock).await;
                }
                SourceEvent::BatchLocked(batch) => match self.relay_batch(batch, &locks).await {
                    Ok(()) => {}
                    Err(RelayError::Bridge(BridgeError::AlreadyMinted(transfer_id))) => {
                        warn!(root = %batch.merkle_root, %transfer_id, "batch already relayed");
                        self.journal.push(RelayAction::Duplicate { transfer_id });
                    }
                    Err(err) => {
                        error!(root = %batch.merkle_root, %err, "batch relay failed");
                        self.journal.push(RelayAction::Failed {
                            transfer_id: None,
                            error: err.to_string(),
                        });
                    }
                },
                _ => {}
            }
        }
    }

    async fn relay_lock(&mut self, lock: &LockEvent) {
        let ctx = self.ctx();
        let result = self.destination.lock().await.mint(
            &ctx,
            lock.owner,
            lock.asset,
            lock.transfer_id,
            &self.proof,
        );
        let action = match result {
            Ok(wrapped_id) => {
                info!(transfer_id = %lock.transfer_id, wrapped_id, "relayed lock");
                RelayAction::Minted {
                    transfer_id: lock.transfer_id,
                    wrapped_id,
                }
            }
            Err(BridgeError::AlreadyMinted(transfer_id)) => {
                warn!(%transfer_id, "lock already relayed");
                RelayAction::Duplicate { transfer_id }
            }
            Err(err) => {
                error!(transfer_id = %lock.transfer_id, %err, "mint failed");
                RelayAction::Failed {
                    transfer_id: Some(lock.transfer_id),
                    error: err.to_string(),
                }
            }
        };
        self.journal.push(action);
    }

    async fn relay_batch(
        &mut self,
        batch: &BatchLockEvent,
        locks: &HashMap<TransferId, LockEvent>,
    ) -> Result<(), RelayError> {
        let mut recipients = Vec::with_capacity(batch.count);
        let mut originals = Vec::with_capacity(batch.count);
        for transfer_id in &batch.transfer_ids {
            let lock = locks
                .get(transfer_id)
                .ok_or(RelayError::MissingLockEvent {
                    root: batch.merkle_root,
                    transfer_id: *transfer_id,
                })?;
            recipients.push(lock.owner);
            originals.push(lock.asset);
        }

        let ctx = self.ctx();
        let outcome = self.destination.lock().await.batch_mint(
            &ctx,
            &recipients,
            &originals,
            &batch.transfer_ids,
            batch.merkle_root,
            &self.proof,
        )?;

        info!(
            root = %batch.merkle_root,
            minted = outcome.wrapped_ids.len(),
            skipped = outcome.skipped.len(),
            "relayed batch"
        );
        self.journal.push(RelayAction::BatchMinted {
            merkle_root: batch.merkle_root,
            wrapped_ids: outcome.wrapped_ids,
            skipped: outcome.skipped,
        });
        Ok(())
    }

    async fn relay_return(&mut self, ret: ReturnEvent) {
        let ctx = self.ctx();
        let result = self.source.lock().await.unlock(
            &ctx,
            ret.original,
            ret.owner,
            ret.transfer_id,
            &self.proof,
        );
        match result {
            Ok(()) => {
                info!(transfer_id = %ret.transfer_id, recipient = %ret.owner, "relayed return");
                self.journal.push(RelayAction::Unlocked {
                    transfer_id: ret.transfer_id,
                    recipient: ret.owner,
                });
            }
            Err(err) if err.is_retryable() => {
                warn!(transfer_id = %ret.transfer_id, %err, "unlock deferred");
                self.pending_returns.push(ret);
            }
            Err(err) => {
                error!(transfer_id = %ret.transfer_id, %err, "unlock failed");
                self.journal.push(RelayAction::Failed {
                    transfer_id: Some(ret.transfer_id),
                    error: err.to_string(),
                });
            }
        }
    }

    fn ctx(&self) -> TxContext {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        TxContext::new(self.identity, now)
    }
}
