use alloy_primitives::{Address, U256};
use tiny_keccak::{Hasher, Keccak};

// =============================================================================
//                          KECCAK256 HELPERS
// =============================================================================

/// Compute keccak256 hash. This matches Solidity's keccak256() opcode.
/// Note: tiny_keccak::Keccak is the original Keccak-256 (NOT SHA3-256).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Hash a pair of 32-byte nodes. Matches Solidity:
///   keccak256(abi.encodePacked(left, right))
/// which is keccak256 of 64 bytes (left ++ right).
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left);
    data[32..].copy_from_slice(right);
    keccak256(&data)
}

// =============================================================================
//                          ABI WORD ENCODING
// =============================================================================

/// ABI encoding of `uint64` as a 32-byte slot: 24 zero bytes + 8 BE bytes.
pub fn word_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// ABI encoding of `uint256`: 32 big-endian bytes.
pub fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// ABI encoding of `address`: 12 zero bytes + 20 address bytes.
pub fn word_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}
