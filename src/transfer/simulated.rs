//! Simulated Backend
//!
//! Stand-in engine for demo mode and tests. Commitments are additively
//! homomorphic over the integers mod 2^128 so conservation checks behave
//! like the real engine's, and proofs are structure-checked 672-byte blobs
//! that open with an unmistakable tag. Nothing produced here can be
//! confused with real prover output.

use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{RangeProofBundle, NOMINAL_PROOF_SIZE};
use crate::common::{PrivacyError, Result};

/// Leading tag on every simulated proof blob
const PROOF_TAG: &[u8; 8] = b"SIMPROOF";

const COMMIT_DOMAIN: &[u8] = b"otus/sim-commit/v1";
const PROOF_DOMAIN: &[u8] = b"otus/sim-proof/v1";

pub struct SimulatedEngine;

impl SimulatedEngine {
    pub fn new() -> Self {
        Self
    }

    /// Commitment layout: bytes 0..16 carry `amount + blinding_lo` mod
    /// 2^128 little-endian, bytes 16..32 a tag hash over that value. The
    /// value half is what makes subtraction homomorphic; the tag half is
    /// a deterministic function of it, so commitment equality reduces to
    /// value-half equality.
    pub fn commit(&self, amount: u64, blinding: &[u8; 32]) -> [u8; 32] {
        let value = (amount as u128).wrapping_add(blinding_lo(blinding));
        encode_commitment(value)
    }

    pub fn generate(&self, amount: u64, bit_length: u8) -> Result<RangeProofBundle> {
        let mut blinding = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut blinding[..16]);

        let commitment = self.commit(amount, &blinding);
        let proof = build_proof(&commitment, bit_length);

        Ok(RangeProofBundle {
            commitment,
            proof,
            blinding,
        })
    }

    pub fn verify(&self, commitment: &[u8; 32], proof: &[u8], bit_length: u8) -> bool {
        if proof.len() != NOMINAL_PROOF_SIZE {
            return false;
        }
        if &proof[..PROOF_TAG.len()] != PROOF_TAG {
            return false;
        }

        // the whole blob is deterministic given (commitment, bit_length)
        proof == build_proof(commitment, bit_length).as_slice()
    }

    pub fn commitment_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> Result<[u8; 32]> {
        let a_value = decode_commitment(a)?;
        let b_value = decode_commitment(b)?;
        Ok(encode_commitment(a_value.wrapping_sub(b_value)))
    }

    pub fn blinding_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        let diff = blinding_lo(a).wrapping_sub(blinding_lo(b));
        let mut out = [0u8; 32];
        out[..16].copy_from_slice(&diff.to_le_bytes());
        out
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn blinding_lo(blinding: &[u8; 32]) -> u128 {
    let mut lo = [0u8; 16];
    lo.copy_from_slice(&blinding[..16]);
    u128::from_le_bytes(lo)
}

fn value_tag(value: u128) -> [u8; 16] {
    let mut hasher = Sha256::new();
    hasher.update(COMMIT_DOMAIN);
    hasher.update(value.to_le_bytes());
    let digest = hasher.finalize();

    let mut tag = [0u8; 16];
    tag.copy_from_slice(&digest[..16]);
    tag
}

fn encode_commitment(value: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&value.to_le_bytes());
    out[16..].copy_from_slice(&value_tag(value));
    out
}

fn decode_commitment(commitment: &[u8; 32]) -> Result<u128> {
    let mut lo = [0u8; 16];
    lo.copy_from_slice(&commitment[..16]);
    let value = u128::from_le_bytes(lo);

    if commitment[16..] != value_tag(value) {
        return Err(PrivacyError::validation("invalid commitment encoding"));
    }
    Ok(value)
}

/// Deterministic 672-byte pseudo-proof: tag, binding hash, then a hash
/// chain as filler up to the nominal Bulletproof size.
fn build_proof(commitment: &[u8; 32], bit_length: u8) -> Vec<u8> {
    let mut proof = Vec::with_capacity(NOMINAL_PROOF_SIZE);
    proof.extend_from_slice(PROOF_TAG);

    let mut hasher = Sha256::new();
    hasher.update(PROOF_DOMAIN);
    hasher.update(commitment);
    hasher.update([bit_length]);
    let mut block: [u8; 32] = hasher.finalize().into();
    proof.extend_from_slice(&block);

    while proof.len() < NOMINAL_PROOF_SIZE {
        block = Sha256::digest(block).into();
        let remaining = NOMINAL_PROOF_SIZE - proof.len();
        proof.extend_from_slice(&block[..remaining.min(32)]);
    }

    proof
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let engine = SimulatedEngine::new();
        let bundle = engine.generate(9_999, 64).unwrap();

        assert_eq!(bundle.proof.len(), NOMINAL_PROOF_SIZE);
        assert!(engine.verify(&bundle.commitment, &bundle.proof, 64));
    }

    #[test]
    fn test_proof_carries_tag() {
        let engine = SimulatedEngine::new();
        let bundle = engine.generate(1, 64).unwrap();
        assert_eq!(&bundle.proof[..8], b"SIMPROOF");
    }

    #[test]
    fn test_verify_rejects_mismatched_bit_length() {
        let engine = SimulatedEngine::new();
        let bundle = engine.generate(1, 64).unwrap();
        assert!(!engine.verify(&bundle.commitment, &bundle.proof, 32));
    }

    #[test]
    fn test_homomorphic_subtraction() {
        let engine = SimulatedEngine::new();

        let a = engine.generate(1_000, 64).unwrap();
        let b = engine.generate(250, 64).unwrap();

        let diff = engine.commitment_sub(&a.commitment, &b.commitment).unwrap();
        let expected = engine.commit(750, &engine.blinding_sub(&a.blinding, &b.blinding));
        assert_eq!(diff, expected);
    }

    #[test]
    fn test_corrupted_commitment_rejected() {
        let engine = SimulatedEngine::new();
        let bundle = engine.generate(5, 64).unwrap();

        let mut corrupted = bundle.commitment;
        corrupted[20] ^= 0xFF;
        assert!(engine.commitment_sub(&corrupted, &bundle.commitment).is_err());
    }
}
