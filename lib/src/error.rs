use alloy_primitives::{Address, B256};

use crate::custody::CustodyError;
use crate::types::{AssetRef, TransferId, WrappedId};

/// Failure of a single ledger operation. Every variant is terminal for the
/// call that raised it and leaves ledger state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("asset {0} is already locked")]
    AlreadyLocked(AssetRef),

    #[error("asset {0} is not locked")]
    NotLocked(AssetRef),

    #[error("unknown transfer {0}")]
    UnknownTransfer(TransferId),

    #[error("transfer {0} has already been minted")]
    AlreadyMinted(TransferId),

    #[error("batch arity mismatch: `{field}` has {got} entries, expected {expected}")]
    ArityMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch of {got} entries exceeds the limit of {limit}")]
    BatchTooLarge { got: usize, limit: usize },

    #[error("merkle root mismatch: claimed {claimed}, computed {computed}")]
    BadMerkleRoot { claimed: B256, computed: B256 },

    #[error("proof rejected for public input {0}")]
    ProofRejected(B256),

    #[error("{caller} does not own wrapped asset {wrapped_id}")]
    NotOwner {
        wrapped_id: WrappedId,
        caller: Address,
    },

    #[error("unknown wrapped asset {0}")]
    UnknownWrappedAsset(WrappedId),

    #[error("caller {0} is not authorized")]
    Unauthorized(Address),

    /// An aborted batch lock could not hand custody back. The bridge still
    /// holds `stranded` with no lock record; needs operator attention.
    #[error("batch lock aborted and {count} assets could not be returned: {source}", count = .stranded.len())]
    RollbackFailed {
        stranded: Vec<AssetRef>,
        #[source]
        source: CustodyError,
    },

    #[error("custody transfer of {asset} failed: {source}")]
    Custody {
        asset: AssetRef,
        #[source]
        source: CustodyError,
    },
}

impl BridgeError {
    /// Whether resubmitting the same call later could succeed.
    /// Only a custody ledger that was temporarily unavailable qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Custody {
                source: CustodyError::Unavailable(_),
                ..
            }
        )
    }
}

pub type Result<T, E = BridgeError> = core::result::Result<T, E>;
