//! Note Generation and Nullifier Derivation
//!
//! A shielded note binds `(amount, blinding, secret)` into a 32-byte
//! commitment. The secret stays with the depositor; the server only ever
//! sees the commitment until withdrawal time, when the matching nullifier
//! is derived from the secret and consumed.

use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{Commitment, MerkleRoot, Nullifier};

/// Domain separation tags
const COMMITMENT_DOMAIN: &[u8] = b"otus/commitment/v1";
const NULLIFIER_DOMAIN: &[u8] = b"otus/nullifier/v1";
const ROOT_DOMAIN: &[u8] = b"otus/root/v1";

/// Number of historical roots accepted alongside the current one
pub const ROOT_HISTORY_SIZE: usize = 100;

/// Maximum number of leaves in the accumulator (2^20 = ~1M)
pub const MAX_LEAVES: u64 = 1 << 20;

/// Root of the empty accumulator
pub const EMPTY_ROOT: MerkleRoot = [0u8; 32];

/// Owner-held 32-byte pre-image secret.
///
/// Never persisted server-side and never logged; `Debug` is redacted and
/// the bytes are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct NoteSecret([u8; 32]);

impl NoteSecret {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, String> {
        let bytes = hex::decode(hex_str).map_err(|e| format!("invalid secret hex: {}", e))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "secret must be exactly 32 bytes".to_string())?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for NoteSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteSecret(<redacted>)")
    }
}

impl Drop for NoteSecret {
    fn drop(&mut self) {
        self.0.fill(0);
    }
}

/// A freshly generated shielded note.
///
/// The commitment goes into the pool; the secret and blinding factor are
/// returned to the caller and dropped server-side after the response is
/// built.
pub struct ShieldedNote {
    pub commitment: Commitment,
    pub blinding: [u8; 32],
    pub secret: NoteSecret,
}

impl ShieldedNote {
    /// Generate a note for the given amount with fresh randomness
    pub fn generate(amount: u64, rng: &mut impl RngCore) -> Self {
        let mut blinding = [0u8; 32];
        rng.fill_bytes(&mut blinding);

        let mut secret_bytes = [0u8; 32];
        rng.fill_bytes(&mut secret_bytes);
        let secret = NoteSecret::from_bytes(secret_bytes);

        let commitment = commitment_of(amount, &blinding, &secret);

        Self {
            commitment,
            blinding,
            secret,
        }
    }

    /// Nullifier this note will consume at withdrawal
    pub fn nullifier(&self) -> Nullifier {
        nullifier_for(&self.secret)
    }
}

/// Compute the commitment binding `(amount, blinding, secret)`
pub fn commitment_of(amount: u64, blinding: &[u8; 32], secret: &NoteSecret) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(COMMITMENT_DOMAIN);
    hasher.update(amount.to_le_bytes());
    hasher.update(blinding);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Derive the nullifier from a note secret.
///
/// Deterministic: the same secret always yields the same nullifier, which
/// is what makes double-spends detectable.
pub fn nullifier_for(secret: &NoteSecret) -> Nullifier {
    let mut hasher = Sha256::new();
    hasher.update(NULLIFIER_DOMAIN);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Incremental accumulator update: `new_root = H(current_root, leaf)`
pub fn chain_root(current: &MerkleRoot, leaf: &Commitment) -> MerkleRoot {
    let mut hasher = Sha256::new();
    hasher.update(ROOT_DOMAIN);
    hasher.update(current);
    hasher.update(leaf);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_generation_distinct() {
        let mut rng = rand::thread_rng();
        let a = ShieldedNote::generate(1_000_000, &mut rng);
        let b = ShieldedNote::generate(1_000_000, &mut rng);

        assert_ne!(a.commitment, b.commitment);
        assert_ne!(a.nullifier(), b.nullifier());
    }

    #[test]
    fn test_commitment_binds_amount() {
        let blinding = [7u8; 32];
        let secret = NoteSecret::from_bytes([9u8; 32]);

        let c1 = commitment_of(100, &blinding, &secret);
        let c2 = commitment_of(101, &blinding, &secret);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_nullifier_deterministic() {
        let secret = NoteSecret::from_bytes([3u8; 32]);
        assert_eq!(nullifier_for(&secret), nullifier_for(&secret));

        let other = NoteSecret::from_bytes([4u8; 32]);
        assert_ne!(nullifier_for(&secret), nullifier_for(&other));
    }

    #[test]
    fn test_nullifier_domain_separated_from_commitment() {
        // A nullifier must never collide with a commitment over the same bytes
        let secret = NoteSecret::from_bytes([5u8; 32]);
        let n = nullifier_for(&secret);
        let c = commitment_of(0, &[0u8; 32], &secret);
        assert_ne!(n, c);
    }

    #[test]
    fn test_root_chaining_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];

        let r1 = chain_root(&chain_root(&EMPTY_ROOT, &a), &b);
        let r2 = chain_root(&chain_root(&EMPTY_ROOT, &b), &a);
        assert_ne!(r1, r2);
    }

    #[test]
    fn test_secret_hex_round_trip() {
        let secret = NoteSecret::from_bytes([0xAB; 32]);
        let parsed = NoteSecret::from_hex(&secret.to_hex()).unwrap();
        assert_eq!(secret, parsed);

        assert!(NoteSecret::from_hex("abcd").is_err());
        assert!(NoteSecret::from_hex("zz").is_err());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = NoteSecret::from_bytes([0xCD; 32]);
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("cd"));
        assert!(debug.contains("redacted"));
    }
}
