//! Shielded Pool Facade
//!
//! Typed interface over a `ShieldedStore` backend. Maps storage-level
//! duplicate errors onto the protocol-integrity errors the rest of the
//! system reasons about (`DuplicateCommitment`, `NullifierAlreadySpent`).

use std::sync::Arc;

use super::{Commitment, CommitmentId, MerkleRoot, Nullifier};
use crate::common::{PrivacyError, Result};
use crate::storage::{ShieldedStore, StorageError};

/// Append-only commitment/nullifier bookkeeping over a pluggable backend
#[derive(Clone)]
pub struct ShieldedPool {
    store: Arc<dyn ShieldedStore>,
}

impl ShieldedPool {
    pub fn new(store: Arc<dyn ShieldedStore>) -> Self {
        Self { store }
    }

    /// Insert a commitment into the append-only log.
    ///
    /// Returns the assigned leaf index. A duplicate 32-byte value is
    /// astronomically unlikely under honest use but rejected regardless.
    pub async fn insert_commitment(&self, commitment: &Commitment) -> Result<CommitmentId> {
        self.store
            .insert_commitment(commitment)
            .await
            .map_err(|e| match e {
                StorageError::Duplicate(_) => {
                    PrivacyError::DuplicateCommitment(hex::encode(&commitment[..8]))
                }
                other => other.into(),
            })
    }

    /// Consume a nullifier exactly once.
    ///
    /// The backing store performs the membership check and insert as one
    /// atomic step, so a concurrent second spend fails here rather than
    /// corrupting state.
    pub async fn spend_nullifier(&self, nullifier: &Nullifier) -> Result<()> {
        self.store
            .spend_nullifier(nullifier)
            .await
            .map_err(|e| match e {
                StorageError::Duplicate(_) => {
                    PrivacyError::NullifierAlreadySpent(hex::encode(&nullifier[..8]))
                }
                other => other.into(),
            })
    }

    pub async fn is_nullifier_spent(&self, nullifier: &Nullifier) -> Result<bool> {
        Ok(self.store.is_nullifier_spent(nullifier).await?)
    }

    /// Current accumulator root, the public input to withdrawal proofs
    pub async fn root(&self) -> Result<MerkleRoot> {
        Ok(self.store.current_root().await?)
    }

    /// Accept the current root or any within the recent history ring
    pub async fn is_known_root(&self, root: &MerkleRoot) -> Result<bool> {
        Ok(self.store.is_known_root(root).await?)
    }

    pub async fn commitment_count(&self) -> Result<u64> {
        Ok(self.store.commitment_count().await?)
    }

    pub async fn spent_nullifier_count(&self) -> Result<u64> {
        Ok(self.store.spent_nullifier_count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryShieldedStore;

    fn pool() -> ShieldedPool {
        ShieldedPool::new(Arc::new(MemoryShieldedStore::new()))
    }

    #[tokio::test]
    async fn test_duplicate_maps_to_domain_error() {
        let pool = pool();
        let c = [0x55u8; 32];

        pool.insert_commitment(&c).await.unwrap();
        let err = pool.insert_commitment(&c).await.unwrap_err();
        assert!(matches!(err, PrivacyError::DuplicateCommitment(_)));
    }

    #[tokio::test]
    async fn test_double_spend_maps_to_domain_error() {
        let pool = pool();
        let n = [0x66u8; 32];

        pool.spend_nullifier(&n).await.unwrap();
        assert_eq!(pool.spent_nullifier_count().await.unwrap(), 1);

        let err = pool.spend_nullifier(&n).await.unwrap_err();
        assert!(matches!(err, PrivacyError::NullifierAlreadySpent(_)));
        assert_eq!(pool.spent_nullifier_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_leaf_indices_sequential() {
        let pool = pool();

        let a = pool.insert_commitment(&[1u8; 32]).await.unwrap();
        let b = pool.insert_commitment(&[2u8; 32]).await.unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(pool.commitment_count().await.unwrap(), 2);
    }
}
