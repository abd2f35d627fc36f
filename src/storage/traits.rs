//! Storage Trait Definitions
//!
//! Defines abstract storage interfaces for the shielded pool sets and the
//! per-wallet pool balances. Implementations can use SQLite (production)
//! or in-memory (testing, demo).

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::tokens::SupportedToken;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("insufficient balance: {0}")]
    Insufficient(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable shielded-pool bookkeeping: append-only commitments plus the
/// spent-nullifier set.
///
/// Implementations:
/// - `SqliteShieldedStore` - production storage with SQLite
/// - `MemoryShieldedStore` - in-memory storage for testing and demo
///
/// Both `insert_commitment` and `spend_nullifier` must perform their
/// existence check and insert as one atomic step; a concurrent second spend
/// of the same nullifier resolves to exactly one success.
#[async_trait]
pub trait ShieldedStore: Send + Sync {
    /// Append a commitment; returns the assigned leaf index.
    /// Fails with `Duplicate` if the exact 32-byte value already exists.
    async fn insert_commitment(&self, commitment: &[u8; 32]) -> StorageResult<u64>;

    /// Check commitment membership
    async fn has_commitment(&self, commitment: &[u8; 32]) -> StorageResult<bool>;

    /// Consume a nullifier. Fails with `Duplicate` if already spent.
    async fn spend_nullifier(&self, nullifier: &[u8; 32]) -> StorageResult<()>;

    /// Check whether a nullifier has been consumed
    async fn is_nullifier_spent(&self, nullifier: &[u8; 32]) -> StorageResult<bool>;

    /// Current accumulator root
    async fn current_root(&self) -> StorageResult<[u8; 32]>;

    /// Whether the root is the current one or within the recent history ring
    async fn is_known_root(&self, root: &[u8; 32]) -> StorageResult<bool>;

    /// Number of commitments inserted
    async fn commitment_count(&self) -> StorageResult<u64>;

    /// Number of nullifiers consumed
    async fn spent_nullifier_count(&self) -> StorageResult<u64>;
}

/// Per-wallet pool balance record, in micro-units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolBalance {
    /// Spendable units
    pub available: u64,
    /// Lifetime deposited units (monotonic)
    pub deposited: u64,
}

/// Per-wallet-and-token pool balances.
///
/// Balances mutate only through verified deposit/withdraw/transfer
/// operations; `transfer` moves value between two wallets atomically so
/// conservation cannot be violated by a crash between debit and credit.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Add units to a wallet's balance (deposit settled)
    async fn credit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance>;

    /// Remove units from a wallet's balance (withdrawal settled).
    /// Fails with `Insufficient` if `available < amount`.
    async fn debit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance>;

    /// Atomic internal transfer between two wallets
    async fn transfer(
        &self,
        from: &str,
        to: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<()>;

    /// Current balance for a wallet (zero if unknown)
    async fn balance(&self, wallet: &str, token: SupportedToken) -> StorageResult<PoolBalance>;

    /// Sum of `available` across all wallets for a token (the TVL aggregate)
    async fn total_locked(&self, token: SupportedToken) -> StorageResult<u64>;
}
