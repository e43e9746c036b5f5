use alloy_primitives::B256;

/// Proof length the placeholder gate accepts. Same size as a Groth16 proof
/// over BN254 (two G1 points and one G2 point, uncompressed).
pub const PLACEHOLDER_PROOF_LEN: usize = 256;

/// Accepts or rejects an opaque proof against a public commitment
/// (a transfer id or a batch root).
///
/// Implementations must be pure: same `(proof, public_input)`, same answer,
/// and no side effects. Both ledgers call the gate before mutating state.
pub trait ProofGate: Send + Sync {
    fn verify(&self, proof: &[u8], public_input: &B256) -> bool;
}

impl<G: ProofGate + ?Sized> ProofGate for &G {
    fn verify(&self, proof: &[u8], public_input: &B256) -> bool {
        (**self).verify(proof, public_input)
    }
}

impl<G: ProofGate + ?Sized> ProofGate for Box<G> {
    fn verify(&self, proof: &[u8], public_input: &B256) -> bool {
        (**self).verify(proof, public_input)
    }
}

impl<G: ProofGate + ?Sized> ProofGate for std::sync::Arc<G> {
    fn verify(&self, proof: &[u8], public_input: &B256) -> bool {
        (**self).verify(proof, public_input)
    }
}

/// Stand-in verifier: accepts iff the proof has exactly `proof_len` bytes and
/// the public input is non-zero. Carries no cryptographic meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderGate {
    proof_len: usize,
}

impl PlaceholderGate {
    pub fn new(proof_len: usize) -> Self {
        Self { proof_len }
    }

    /// A blob of the accepted shape, for relays and tests.
    pub fn well_formed_proof(&self) -> Vec<u8> {
        vec![0u8; self.proof_len]
    }
}

impl Default for PlaceholderGate {
    fn default() -> Self {
        Self::new(PLACEHOLDER_PROOF_LEN)
    }
}

impl ProofGate for PlaceholderGate {
    fn verify(&self, proof: &[u8], public_input: &B256) -> bool {
        proof.len() == self.proof_len && !public_input.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_accepts_well_formed_proof() {
        let gate = PlaceholderGate::default();
        let input = B256::repeat_byte(0x11);
        assert!(gate.verify(&gate.well_formed_proof(), &input));
    }

    #[test]
    fn test_placeholder_rejects_wrong_length() {
        let gate = PlaceholderGate::default();
        let input = B256::repeat_byte(0x11);
        assert!(!gate.verify(&[], &input));
        assert!(!gate.verify(&[0u8; PLACEHOLDER_PROOF_LEN - 1], &input));
        assert!(!gate.verify(&[0u8; PLACEHOLDER_PROOF_LEN + 1], &input));
    }

    #[test]
    fn test_placeholder_rejects_zero_public_input() {
        let gate = PlaceholderGate::default();
        assert!(!gate.verify(&gate.well_formed_proof(), &B256::ZERO));
    }

    #[test]
    fn test_gate_through_trait_object() {
        let gate: Box<dyn ProofGate> = Box::new(PlaceholderGate::new(4));
        assert!(gate.verify(&[1, 2, 3, 4], &B256::repeat_byte(1)));
        assert!(!gate.verify(&[1, 2, 3], &B256::repeat_byte(1)));
    }
}
