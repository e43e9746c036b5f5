//! Batch commitment over an ordered list of transfer ids.
//!
//! Both ledgers recompute the root independently, so the reduction rule is
//! fixed bit-for-bit:
//!   - no leaves  -> zero hash
//!   - one leaf   -> the leaf itself
//!   - otherwise  -> pair adjacent nodes left to right with `hash_pair`; an odd
//!     last node is carried up unchanged (never duplicated, never zero-padded).
//!
//! Known collision: `[ZERO]` and `[]` both reduce to the zero hash. The ledgers
//! never accept either as a batch (empty batches are rejected and the proof
//! gate rejects a zero public input), but `verify_root` itself cannot tell
//! them apart.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::hash::hash_pair;

/// Root of an empty batch.
pub const EMPTY_ROOT: B256 = B256::ZERO;

/// Compute the batch root over `leaves` in the given order.
pub fn compute_root(leaves: &[B256]) -> B256 {
    match leaves {
        [] => EMPTY_ROOT,
        [leaf] => *leaf,
        _ => {
            let mut level: Vec<B256> = leaves.to_vec();
            while level.len() > 1 {
                level = next_level(&level);
            }
            level[0]
        }
    }
}

/// Recompute the root over `leaves` and compare it with `claimed`.
pub fn verify_root(leaves: &[B256], claimed: &B256) -> bool {
    compute_root(leaves) == *claimed
}

fn next_level(level: &[B256]) -> Vec<B256> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => B256::from(hash_pair(&left.0, &right.0)),
            // Odd node: carried forward unchanged
            [carried] => *carried,
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

// =============================================================================
//                          INCLUSION PROOFS
// =============================================================================

/// A single step in a Merkle proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProofStep {
    /// true if the current node is the LEFT child (index even at this level).
    /// When is_left=true:  parent = hash(current, sibling)
    /// When is_left=false: parent = hash(sibling, current)
    pub is_left: bool,
    /// The sibling hash at this level.
    pub sibling: B256,
}

/// Build the inclusion proof for `leaves[index]` under the batch root.
///
/// Levels where the node is the carried odd one contribute no step, so the
/// proof can be shorter than the tree height. Returns `None` when `index` is
/// out of range.
pub fn compute_proof(leaves: &[B256], index: usize) -> Option<Vec<MerkleProofStep>> {
    if index >= leaves.len() {
        return None;
    }

    let mut proof = Vec::new();
    let mut level: Vec<B256> = leaves.to_vec();
    let mut idx = index;

    while level.len() > 1 {
        let sibling_idx = idx ^ 1;
        if sibling_idx < level.len() {
            proof.push(MerkleProofStep {
                is_left: idx % 2 == 0,
                sibling: level[sibling_idx],
            });
        }
        level = next_level(&level);
        idx /= 2;
    }

    Some(proof)
}

/// Verify a Merkle proof against an expected root.
///
/// Traverses from the leaf up to the root, hashing at each level
/// according to the `is_left` flag.
pub fn verify_merkle_proof(leaf: B256, proof: &[MerkleProofStep], expected_root: B256) -> bool {
    let mut current = leaf;
    for step in proof {
        current = if step.is_left {
            B256::from(hash_pair(&current.0, &step.sibling.0))
        } else {
            B256::from(hash_pair(&step.sibling.0, &current.0))
        };
    }
    current == expected_root
}
