//! Vault Registry
//!
//! Hands out one lock per vault: mutations to a given vault serialize,
//! while operations on different vaults proceed independently. Readers
//! see either pre- or post-mutation totals, never an intermediate value.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::Utc;

use super::accounting::{FeeSchedule, Vault, VaultInfo};
use crate::common::{PrivacyError, Result};

/// Shared handle to a single vault's critical section
pub type VaultHandle = Arc<RwLock<Vault>>;

#[derive(Clone, Default)]
pub struct VaultRegistry {
    vaults: Arc<RwLock<HashMap<String, VaultHandle>>>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self {
            vaults: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry seeded with the stock vault catalog
    pub async fn with_default_catalog() -> Self {
        let registry = Self::new();

        registry
            .create(
                "stable-yield",
                "Stable Yield",
                FeeSchedule {
                    management_fee_bps: 100,
                    performance_fee_bps: 1_000,
                    withdrawal_fee_bps: 10,
                },
                0,
            )
            .await
            .expect("fresh registry has no duplicates");

        registry
            .create(
                "locked-growth",
                "Locked Growth",
                FeeSchedule {
                    management_fee_bps: 200,
                    performance_fee_bps: 2_000,
                    withdrawal_fee_bps: 25,
                },
                7,
            )
            .await
            .expect("fresh registry has no duplicates");

        registry
    }

    pub async fn create(
        &self,
        id: &str,
        name: &str,
        fees: FeeSchedule,
        lock_period_days: u32,
    ) -> Result<VaultHandle> {
        let mut vaults = self.vaults.write().await;

        if vaults.contains_key(id) {
            return Err(PrivacyError::validation(format!("vault {} already exists", id)));
        }

        let handle = Arc::new(RwLock::new(Vault::new(
            id,
            name,
            fees,
            lock_period_days,
            Utc::now(),
        )));
        vaults.insert(id.to_string(), handle.clone());

        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Result<VaultHandle> {
        let vaults = self.vaults.read().await;
        vaults
            .get(id)
            .cloned()
            .ok_or_else(|| PrivacyError::validation(format!("unknown vault: {}", id)))
    }

    pub async fn list_info(&self) -> Vec<VaultInfo> {
        let handles: Vec<VaultHandle> = {
            let vaults = self.vaults.read().await;
            vaults.values().cloned().collect()
        };

        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            infos.push(handle.read().await.info());
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = VaultRegistry::new();
        registry
            .create("v1", "Vault One", FeeSchedule::default(), 0)
            .await
            .unwrap();

        let handle = registry.get("v1").await.unwrap();
        assert_eq!(handle.read().await.id(), "v1");

        assert!(registry.get("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let registry = VaultRegistry::new();
        registry
            .create("v1", "Vault One", FeeSchedule::default(), 0)
            .await
            .unwrap();

        let result = registry.create("v1", "Again", FeeSchedule::default(), 0).await;
        assert!(matches!(result, Err(PrivacyError::Validation(_))));
    }

    #[tokio::test]
    async fn test_default_catalog() {
        let registry = VaultRegistry::with_default_catalog().await;
        let infos = registry.list_info().await;

        assert_eq!(infos.len(), 2);
        assert!(infos.iter().any(|v| v.id == "stable-yield"));
        assert!(infos.iter().any(|v| v.lock_period_days == 7));
    }

    #[tokio::test]
    async fn test_concurrent_deposits_serialize_per_vault() {
        let registry = VaultRegistry::new();
        registry
            .create("v1", "Vault One", FeeSchedule::default(), 0)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let vault = registry.get("v1").await.unwrap();
                let mut vault = vault.write().await;
                let wallet = format!("wallet-{}", i);
                vault.deposit(&wallet, 1_000, Utc::now()).unwrap()
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let vault = registry.get("v1").await.unwrap();
        let vault = vault.read().await;
        assert_eq!(vault.total_assets(), 16_000);
        assert_eq!(vault.total_shares(), 16_000);
    }
}
