//! Range-Proof Transfer Engine
//!
//! Hides the magnitude of a value transfer between two pool balances while
//! preserving conservation of value. Produces a Pedersen-style commitment
//! `C = amount·G + blinding·H` plus a proof that the committed value lies
//! in `[0, 2^bit_length)`.
//!
//! Two backends sit behind one tagged enum, selected once at startup and
//! never re-detected per call:
//! - `Real` - Bulletproofs over ristretto
//! - `Simulated` - additively homomorphic integer stand-in with clearly
//!   tagged pseudo-proofs, for demo mode and tests
//!
//! Verification failure is an ordinary `false`, never an error; failing
//! proofs are the expected outcome for adversarial input.

pub mod bulletproof;
pub mod simulated;

pub use bulletproof::BulletproofEngine;
pub use simulated::SimulatedEngine;

use crate::common::{PrivacyError, Result};
use crate::config::BackendMode;

/// Nominal size of a 64-bit range proof in bytes
pub const NOMINAL_PROOF_SIZE: usize = 672;

/// Default range width for transfers
pub const DEFAULT_BIT_LENGTH: u8 = 64;

/// Bit lengths the proving system accepts
pub const SUPPORTED_BIT_LENGTHS: [u8; 4] = [8, 16, 32, 64];

/// Output of proof generation: the amount commitment, the opaque proof
/// blob, and the blinding factor (returned to the caller, never stored).
#[derive(Clone)]
pub struct RangeProofBundle {
    pub commitment: [u8; 32],
    pub proof: Vec<u8>,
    pub blinding: [u8; 32],
}

impl std::fmt::Debug for RangeProofBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // blinding factor stays out of debug output
        f.debug_struct("RangeProofBundle")
            .field("commitment", &hex::encode(&self.commitment[..8]))
            .field("proof_len", &self.proof.len())
            .finish()
    }
}

/// Validate the requested range parameters, shared by both backends
pub(crate) fn check_range(amount: u64, bit_length: u8) -> Result<()> {
    if !SUPPORTED_BIT_LENGTHS.contains(&bit_length) {
        return Err(PrivacyError::AmountOutOfRange(format!(
            "unsupported bit length {} (supported: 8, 16, 32, 64)",
            bit_length
        )));
    }

    if bit_length < 64 && amount >= (1u64 << bit_length) {
        return Err(PrivacyError::AmountOutOfRange(format!(
            "amount {} exceeds 2^{} - 1",
            amount, bit_length
        )));
    }

    Ok(())
}

/// Range-proof backend, tagged variant fixed at configuration time
pub enum RangeProofBackend {
    Simulated(SimulatedEngine),
    Real(BulletproofEngine),
}

impl RangeProofBackend {
    pub fn from_mode(mode: BackendMode) -> Self {
        match mode {
            BackendMode::Simulated => RangeProofBackend::Simulated(SimulatedEngine::new()),
            BackendMode::Real => RangeProofBackend::Real(BulletproofEngine::new()),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, RangeProofBackend::Simulated(_))
    }

    /// Generate a range proof for `amount`.
    ///
    /// Precondition `0 <= amount < 2^bit_length`, else `AmountOutOfRange`.
    pub fn generate(&self, amount: u64, bit_length: u8) -> Result<RangeProofBundle> {
        check_range(amount, bit_length)?;

        match self {
            RangeProofBackend::Simulated(engine) => engine.generate(amount, bit_length),
            RangeProofBackend::Real(engine) => engine.generate(amount, bit_length),
        }
    }

    /// Verify a range proof. Deterministic and side-effect-free; returns
    /// false on any structurally invalid or failing proof.
    pub fn verify(&self, commitment: &[u8; 32], proof: &[u8], bit_length: u8) -> bool {
        if !SUPPORTED_BIT_LENGTHS.contains(&bit_length) {
            return false;
        }

        match self {
            RangeProofBackend::Simulated(engine) => engine.verify(commitment, proof, bit_length),
            RangeProofBackend::Real(engine) => engine.verify(commitment, proof, bit_length),
        }
    }

    /// Commit to an amount under a caller-supplied blinding factor
    pub fn commit(&self, amount: u64, blinding: &[u8; 32]) -> Result<[u8; 32]> {
        match self {
            RangeProofBackend::Simulated(engine) => Ok(engine.commit(amount, blinding)),
            RangeProofBackend::Real(engine) => engine.commit(amount, blinding),
        }
    }

    /// Homomorphic subtraction `a - b` of two commitments.
    ///
    /// The orchestrator uses this to check conservation before committing
    /// state: `old_balance - transfer == new_balance`.
    pub fn commitment_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> Result<[u8; 32]> {
        match self {
            RangeProofBackend::Simulated(engine) => engine.commitment_sub(a, b),
            RangeProofBackend::Real(engine) => engine.commitment_sub(a, b),
        }
    }

    /// Subtraction of blinding factors matching `commitment_sub`
    pub fn blinding_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        match self {
            RangeProofBackend::Simulated(engine) => engine.blinding_sub(a, b),
            RangeProofBackend::Real(engine) => engine.blinding_sub(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> Vec<RangeProofBackend> {
        vec![
            RangeProofBackend::from_mode(BackendMode::Simulated),
            RangeProofBackend::from_mode(BackendMode::Real),
        ]
    }

    #[test]
    fn test_round_trip_both_backends() {
        for backend in backends() {
            let bundle = backend.generate(1_234_567, 64).unwrap();
            assert!(backend.verify(&bundle.commitment, &bundle.proof, 64));
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        for backend in backends() {
            let err = backend.generate(300, 8).unwrap_err();
            assert!(matches!(err, PrivacyError::AmountOutOfRange(_)));

            let err = backend.generate(1, 63).unwrap_err();
            assert!(matches!(err, PrivacyError::AmountOutOfRange(_)));
        }
    }

    #[test]
    fn test_garbage_proof_fails_closed() {
        for backend in backends() {
            let bundle = backend.generate(42, 64).unwrap();

            // truncated blob
            assert!(!backend.verify(&bundle.commitment, &bundle.proof[..10], 64));
            // wrong commitment
            assert!(!backend.verify(&[0u8; 32], &bundle.proof, 64));
            // wrong range width
            assert!(!backend.verify(&bundle.commitment, &bundle.proof, 63));
        }
    }

    #[test]
    fn test_conservation_identity() {
        // old_balance - transfer == new_balance under matching blindings
        for backend in backends() {
            let old_balance = 10_000u64;
            let transfer = 3_500u64;

            let old = backend.generate(old_balance, 64).unwrap();
            let moved = backend.generate(transfer, 64).unwrap();

            let expected_new = backend
                .commitment_sub(&old.commitment, &moved.commitment)
                .unwrap();

            let new_blinding = backend.blinding_sub(&old.blinding, &moved.blinding);
            let new_commitment = backend
                .commit(old_balance - transfer, &new_blinding)
                .unwrap();

            assert_eq!(expected_new, new_commitment);
        }
    }

    #[test]
    fn test_simulated_flag() {
        assert!(RangeProofBackend::from_mode(BackendMode::Simulated).is_simulated());
        assert!(!RangeProofBackend::from_mode(BackendMode::Real).is_simulated());
    }
}
