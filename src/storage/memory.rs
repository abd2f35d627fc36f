//! In-Memory Storage Implementations
//!
//! Thread-safe in-memory storage for testing and demo mode. Data is lost
//! when the service restarts.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{BalanceStore, PoolBalance, ShieldedStore, StorageError, StorageResult};
use crate::shielded::{chain_root, EMPTY_ROOT, MAX_LEAVES, ROOT_HISTORY_SIZE};
use crate::tokens::SupportedToken;

/// Inner accumulator state, guarded by a single lock so that the
/// membership check and insert of both sets are atomic.
struct ShieldedState {
    /// commitment -> leaf index
    commitments: HashMap<[u8; 32], u64>,
    /// spent nullifier set, O(1) membership
    nullifiers: HashSet<[u8; 32]>,
    current_root: [u8; 32],
    /// circular buffer of recent roots
    root_history: Vec<[u8; 32]>,
    root_history_index: usize,
}

impl ShieldedState {
    fn new() -> Self {
        Self {
            commitments: HashMap::new(),
            nullifiers: HashSet::new(),
            current_root: EMPTY_ROOT,
            root_history: vec![EMPTY_ROOT; ROOT_HISTORY_SIZE],
            root_history_index: 0,
        }
    }

    fn push_root(&mut self, new_root: [u8; 32]) {
        self.root_history[self.root_history_index % ROOT_HISTORY_SIZE] = self.current_root;
        self.root_history_index += 1;
        self.current_root = new_root;
    }
}

/// In-memory shielded store
#[derive(Clone)]
pub struct MemoryShieldedStore {
    state: Arc<RwLock<ShieldedState>>,
}

impl MemoryShieldedStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ShieldedState::new())),
        }
    }
}

impl Default for MemoryShieldedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShieldedStore for MemoryShieldedStore {
    async fn insert_commitment(&self, commitment: &[u8; 32]) -> StorageResult<u64> {
        let mut state = self.state.write().await;

        if state.commitments.contains_key(commitment) {
            return Err(StorageError::Duplicate(format!(
                "commitment {}",
                hex::encode(&commitment[..8])
            )));
        }

        let index = state.commitments.len() as u64;
        if index >= MAX_LEAVES {
            return Err(StorageError::InvalidData("commitment log full".to_string()));
        }

        let new_root = chain_root(&state.current_root, commitment);
        state.commitments.insert(*commitment, index);
        state.push_root(new_root);

        Ok(index)
    }

    async fn has_commitment(&self, commitment: &[u8; 32]) -> StorageResult<bool> {
        let state = self.state.read().await;
        Ok(state.commitments.contains_key(commitment))
    }

    async fn spend_nullifier(&self, nullifier: &[u8; 32]) -> StorageResult<()> {
        let mut state = self.state.write().await;

        if !state.nullifiers.insert(*nullifier) {
            return Err(StorageError::Duplicate(format!(
                "nullifier {}",
                hex::encode(&nullifier[..8])
            )));
        }

        Ok(())
    }

    async fn is_nullifier_spent(&self, nullifier: &[u8; 32]) -> StorageResult<bool> {
        let state = self.state.read().await;
        Ok(state.nullifiers.contains(nullifier))
    }

    async fn current_root(&self) -> StorageResult<[u8; 32]> {
        let state = self.state.read().await;
        Ok(state.current_root)
    }

    async fn is_known_root(&self, root: &[u8; 32]) -> StorageResult<bool> {
        let state = self.state.read().await;
        Ok(state.current_root == *root || state.root_history.contains(root))
    }

    async fn commitment_count(&self) -> StorageResult<u64> {
        let state = self.state.read().await;
        Ok(state.commitments.len() as u64)
    }

    async fn spent_nullifier_count(&self) -> StorageResult<u64> {
        let state = self.state.read().await;
        Ok(state.nullifiers.len() as u64)
    }
}

/// In-memory balance store
#[derive(Clone)]
pub struct MemoryBalanceStore {
    balances: Arc<RwLock<HashMap<(String, SupportedToken), PoolBalance>>>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn credit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance> {
        let mut balances = self.balances.write().await;
        let entry = balances
            .entry((wallet.to_string(), token))
            .or_insert_with(PoolBalance::default);

        entry.available = entry
            .available
            .checked_add(amount)
            .ok_or_else(|| StorageError::InvalidData("balance overflow".to_string()))?;
        entry.deposited = entry.deposited.saturating_add(amount);

        Ok(*entry)
    }

    async fn debit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance> {
        let mut balances = self.balances.write().await;
        let entry = balances
            .get_mut(&(wallet.to_string(), token))
            .ok_or_else(|| StorageError::Insufficient(format!("no balance for {}", wallet)))?;

        if entry.available < amount {
            return Err(StorageError::Insufficient(format!(
                "available {} < requested {}",
                entry.available, amount
            )));
        }

        entry.available -= amount;
        Ok(*entry)
    }

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<()> {
        // One write lock covers both sides so the transfer is atomic
        let mut balances = self.balances.write().await;

        let sender = balances
            .get_mut(&(from.to_string(), token))
            .ok_or_else(|| StorageError::Insufficient(format!("no balance for {}", from)))?;

        if sender.available < amount {
            return Err(StorageError::Insufficient(format!(
                "available {} < requested {}",
                sender.available, amount
            )));
        }
        sender.available -= amount;

        let recipient = balances
            .entry((to.to_string(), token))
            .or_insert_with(PoolBalance::default);
        recipient.available = recipient
            .available
            .checked_add(amount)
            .ok_or_else(|| StorageError::InvalidData("balance overflow".to_string()))?;

        Ok(())
    }

    async fn balance(&self, wallet: &str, token: SupportedToken) -> StorageResult<PoolBalance> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(&(wallet.to_string(), token))
            .copied()
            .unwrap_or_default())
    }

    async fn total_locked(&self, token: SupportedToken) -> StorageResult<u64> {
        let balances = self.balances.read().await;
        Ok(balances
            .iter()
            .filter(|((_, t), _)| *t == token)
            .map(|(_, b)| b.available)
            .sum())
    }
}
