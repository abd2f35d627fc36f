//! Storage Layer
//!
//! Abstract storage interfaces for the durable commitment/nullifier sets
//! and per-wallet pool balances, with in-memory (testing, demo) and SQLite
//! (production) implementations.

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::{MemoryBalanceStore, MemoryShieldedStore};
pub use sqlite::{SqliteBalanceStore, SqliteShieldedStore};
pub use traits::{BalanceStore, PoolBalance, ShieldedStore, StorageError, StorageResult};
