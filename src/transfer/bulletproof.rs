//! Bulletproofs Backend
//!
//! Real range proofs over ristretto. A single-value proof for a 64-bit
//! range lands at the nominal 672-byte size.

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek_ng::ristretto::CompressedRistretto;
use curve25519_dalek_ng::scalar::Scalar;
use merlin::Transcript;
use rand::RngCore;

use super::RangeProofBundle;
use crate::common::{PrivacyError, Result};

/// Transcript domain label; prover and verifier must agree on it
const TRANSCRIPT_LABEL: &[u8] = b"otus/range-proof/v1";

pub struct BulletproofEngine {
    pc_gens: PedersenGens,
    bp_gens: BulletproofGens,
}

impl BulletproofEngine {
    pub fn new() -> Self {
        Self {
            pc_gens: PedersenGens::default(),
            bp_gens: BulletproofGens::new(64, 1),
        }
    }

    fn transcript() -> Transcript {
        Transcript::new(TRANSCRIPT_LABEL)
    }

    /// Random scalar with full 256-bit entropy (not just a lifted u64)
    fn random_scalar() -> Scalar {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        Scalar::from_bytes_mod_order_wide(&bytes)
    }

    pub fn generate(&self, amount: u64, bit_length: u8) -> Result<RangeProofBundle> {
        let blinding = Self::random_scalar();

        let mut transcript = Self::transcript();
        let (proof, committed) = RangeProof::prove_single(
            &self.bp_gens,
            &self.pc_gens,
            &mut transcript,
            amount,
            &blinding,
            bit_length as usize,
        )
        .map_err(|e| PrivacyError::BackendUnavailable(format!("range proof generation: {:?}", e)))?;

        Ok(RangeProofBundle {
            commitment: committed.to_bytes(),
            proof: proof.to_bytes(),
            blinding: blinding.to_bytes(),
        })
    }

    pub fn verify(&self, commitment: &[u8; 32], proof: &[u8], bit_length: u8) -> bool {
        let proof = match RangeProof::from_bytes(proof) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let committed = CompressedRistretto::from_slice(commitment);

        let mut transcript = Self::transcript();
        proof
            .verify_single(
                &self.bp_gens,
                &self.pc_gens,
                &mut transcript,
                &committed,
                bit_length as usize,
            )
            .is_ok()
    }

    pub fn commit(&self, amount: u64, blinding: &[u8; 32]) -> Result<[u8; 32]> {
        let blinding = Scalar::from_bytes_mod_order(*blinding);
        let point = self.pc_gens.commit(Scalar::from(amount), blinding);
        Ok(point.compress().to_bytes())
    }

    pub fn commitment_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> Result<[u8; 32]> {
        let a_point = CompressedRistretto::from_slice(a)
            .decompress()
            .ok_or_else(|| PrivacyError::validation("invalid commitment encoding"))?;
        let b_point = CompressedRistretto::from_slice(b)
            .decompress()
            .ok_or_else(|| PrivacyError::validation("invalid commitment encoding"))?;

        Ok((a_point - b_point).compress().to_bytes())
    }

    pub fn blinding_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        let a = Scalar::from_bytes_mod_order(*a);
        let b = Scalar::from_bytes_mod_order(*b);
        (a - b).to_bytes()
    }
}

impl Default for BulletproofEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::NOMINAL_PROOF_SIZE;

    #[test]
    fn test_proof_size_nominal() {
        let engine = BulletproofEngine::new();
        let bundle = engine.generate(1_000_000, 64).unwrap();
        assert_eq!(bundle.proof.len(), NOMINAL_PROOF_SIZE);
    }

    #[test]
    fn test_zero_and_max_provable() {
        let engine = BulletproofEngine::new();

        let zero = engine.generate(0, 64).unwrap();
        assert!(engine.verify(&zero.commitment, &zero.proof, 64));

        let max = engine.generate(u64::MAX, 64).unwrap();
        assert!(engine.verify(&max.commitment, &max.proof, 64));
    }

    #[test]
    fn test_small_ranges() {
        let engine = BulletproofEngine::new();

        let bundle = engine.generate(200, 8).unwrap();
        assert!(engine.verify(&bundle.commitment, &bundle.proof, 8));
        // proof for an 8-bit range does not verify against a 16-bit claim
        assert!(!engine.verify(&bundle.commitment, &bundle.proof, 16));
    }

    #[test]
    fn test_tampered_commitment_rejected() {
        let engine = BulletproofEngine::new();
        let bundle = engine.generate(777, 64).unwrap();

        let mut tampered = bundle.commitment;
        tampered[0] ^= 0x01;
        assert!(!engine.verify(&tampered, &bundle.proof, 64));
    }

    #[test]
    fn test_commitment_reproducible_from_blinding() {
        let engine = BulletproofEngine::new();
        let bundle = engine.generate(5_000, 64).unwrap();

        let recomputed = engine.commit(5_000, &bundle.blinding).unwrap();
        assert_eq!(recomputed, bundle.commitment);
    }
}
