//! Privacy Service
//!
//! The single entry point for client-facing operations. Owns the in-flight
//! operation state and composes the commitment store, range-proof engine,
//! vault registry and ledger boundary.
//!
//! Ordering rule: artifact generation and the ledger call happen strictly
//! before any local state commit, so a failure or abort in between leaves
//! pool balances and vault totals untouched.

use rand::RngCore;
use std::str::FromStr;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use super::types::{
    ArtifactStatus, CommissionOutcome, DepositOutcome, OperationStage, VaultDepositOutcome,
    WithdrawOutcome,
};
use crate::common::{PrivacyError, Result};
use crate::config::{BackendMode, PrivacyConfig};
use crate::logging::log_security_event;
use crate::milestone::{MilestoneConfig, MilestoneProof, MilestoneStatus};
use crate::shielded::{nullifier_for, NoteSecret, ShieldedNote, ShieldedPool};
use crate::sol_client::{
    derive_pool_address, derive_vault_address, DemoLedgerClient, LedgerClient, PoolInstruction,
    SolConfig, SolLedgerClient,
};
use crate::storage::{
    BalanceStore, MemoryBalanceStore, MemoryShieldedStore, PoolBalance, ShieldedStore,
    SqliteBalanceStore, SqliteShieldedStore,
};
use crate::tokens::{format_units, SupportedToken};
use crate::transfer::{RangeProofBackend, RangeProofBundle, DEFAULT_BIT_LENGTH};
use crate::vault::{VaultInfo, VaultRegistry};

pub struct PrivacyService {
    config: PrivacyConfig,
    shielded: ShieldedPool,
    balances: Arc<dyn BalanceStore>,
    vaults: VaultRegistry,
    range_proofs: RangeProofBackend,
    milestones: MilestoneConfig,
    ledger: Arc<dyn LedgerClient>,
}

impl PrivacyService {
    pub fn new(
        config: PrivacyConfig,
        shielded: ShieldedPool,
        balances: Arc<dyn BalanceStore>,
        vaults: VaultRegistry,
        ledger: Arc<dyn LedgerClient>,
    ) -> Self {
        let range_proofs = RangeProofBackend::from_mode(config.backend);

        Self {
            config,
            shielded,
            balances,
            vaults,
            range_proofs,
            milestones: MilestoneConfig::default(),
            ledger,
        }
    }

    /// Build the full service from configuration: stores, ledger client and
    /// vault catalog. The backend tag in `config` decides everything once;
    /// nothing is re-detected later.
    pub async fn from_config(config: PrivacyConfig) -> Result<Arc<Self>> {
        let (shielded_store, balance_store): (Arc<dyn ShieldedStore>, Arc<dyn BalanceStore>) =
            match &config.db_path {
                Some(path) => (
                    Arc::new(SqliteShieldedStore::new(path)?),
                    Arc::new(SqliteBalanceStore::new(path)?),
                ),
                None => (
                    Arc::new(MemoryShieldedStore::new()),
                    Arc::new(MemoryBalanceStore::new()),
                ),
            };

        let ledger: Arc<dyn LedgerClient> = match (config.backend, &config.signer_key) {
            (BackendMode::Real, Some(key)) => Arc::new(SolLedgerClient::new(
                SolConfig {
                    rpc_url: config.solana_rpc.clone(),
                    program_id: config.program_id.clone(),
                },
                key,
            )?),
            _ => Arc::new(DemoLedgerClient::new()),
        };

        let vaults = VaultRegistry::with_default_catalog().await;

        Ok(Arc::new(Self::new(
            config,
            ShieldedPool::new(shielded_store),
            balance_store,
            vaults,
            ledger,
        )))
    }

    pub fn config(&self) -> &PrivacyConfig {
        &self.config
    }

    pub fn vault_registry(&self) -> &VaultRegistry {
        &self.vaults
    }

    fn base_status(&self) -> ArtifactStatus {
        if self.range_proofs.is_simulated() {
            ArtifactStatus::Simulated
        } else {
            ArtifactStatus::Real
        }
    }

    fn trace_stage(&self, operation_id: &str, stage: OperationStage) {
        tracing::debug!(
            target: "privacy::orchestrator",
            operation_id,
            stage = %stage,
            "stage transition"
        );
    }

    /// Derive the pool PDA for a token mint
    fn pool_account(&self, token: SupportedToken) -> Result<String> {
        let program = Pubkey::from_str(&self.config.program_id)
            .map_err(|e| PrivacyError::ledger(format!("invalid program id: {}", e)))?;
        let mint = Pubkey::from_str(token.mint(self.config.network))
            .map_err(|e| PrivacyError::ledger(format!("invalid mint: {}", e)))?;
        Ok(derive_pool_address(&program, &mint).0.to_string())
    }

    fn vault_account(&self, vault_id: &str) -> Result<String> {
        let program = Pubkey::from_str(&self.config.program_id)
            .map_err(|e| PrivacyError::ledger(format!("invalid program id: {}", e)))?;
        Ok(derive_vault_address(&program, vault_id).0.to_string())
    }

    /// Generate a range proof, falling back to an explicitly labeled
    /// simulated artifact when the real prover is unavailable. The owned
    /// fallback engine is returned so verification and conservation checks
    /// run against the engine that actually produced the bundle.
    fn generate_proof_with_fallback(
        &self,
        amount: u64,
    ) -> Result<(RangeProofBundle, Option<RangeProofBackend>, ArtifactStatus)> {
        match self.range_proofs.generate(amount, DEFAULT_BIT_LENGTH) {
            Ok(bundle) => Ok((bundle, None, self.base_status())),
            Err(PrivacyError::BackendUnavailable(reason)) => {
                tracing::warn!(
                    target: "privacy::orchestrator",
                    %reason,
                    "real prover unavailable, producing simulated artifact"
                );
                let engine = RangeProofBackend::from_mode(BackendMode::Simulated);
                let bundle = engine.generate(amount, DEFAULT_BIT_LENGTH)?;
                Ok((bundle, Some(engine), ArtifactStatus::Simulated))
            }
            Err(other) => Err(other),
        }
    }

    // ========================================================================
    // Shielded deposit
    // ========================================================================

    pub async fn deposit(
        &self,
        wallet: &str,
        amount: u64,
        token: SupportedToken,
    ) -> Result<DepositOutcome> {
        let operation_id = uuid::Uuid::new_v4().to_string();

        self.trace_stage(&operation_id, OperationStage::ValidatingInput);
        validate_wallet(wallet, "wallet")?;
        validate_amount(amount)?;

        self.trace_stage(&operation_id, OperationStage::GeneratingArtifact);
        let note = ShieldedNote::generate(amount, &mut rand::thread_rng());

        let tx_reference = self
            .ledger
            .submit_instruction(
                vec![self.pool_account(token)?],
                PoolInstruction::RecordCommitment {
                    commitment: note.commitment,
                },
            )
            .await?;

        self.trace_stage(&operation_id, OperationStage::Committing);
        let leaf_index = self.shielded.insert_commitment(&note.commitment).await?;
        self.balances.credit(wallet, token, amount).await?;

        self.trace_stage(&operation_id, OperationStage::Completed);
        let status = self.base_status();
        let message = match status {
            ArtifactStatus::Real => {
                format!("Deposited {} to shielded pool", format_units(amount, token))
            }
            ArtifactStatus::Simulated => format!(
                "Simulated deposit of {} to shielded pool",
                format_units(amount, token)
            ),
        };

        Ok(DepositOutcome {
            operation_id,
            tx_reference,
            commitment: hex::encode(note.commitment),
            leaf_index,
            secret: note.secret.to_hex(),
            status,
            message,
        })
    }

    // ========================================================================
    // Shielded withdrawal
    // ========================================================================

    pub async fn withdraw(
        &self,
        wallet: &str,
        recipient: Option<&str>,
        amount: u64,
        token: SupportedToken,
        secret: Option<&str>,
    ) -> Result<WithdrawOutcome> {
        let operation_id = uuid::Uuid::new_v4().to_string();

        self.trace_stage(&operation_id, OperationStage::ValidatingInput);
        validate_wallet(wallet, "wallet")?;
        let recipient = recipient.unwrap_or(wallet);
        validate_wallet(recipient, "recipient")?;
        validate_amount(amount)?;

        let balance = self.balances.balance(wallet, token).await?;
        if balance.available < amount {
            return Err(PrivacyError::validation(format!(
                "insufficient pool balance: available {}, requested {}",
                balance.available, amount
            )));
        }

        self.trace_stage(&operation_id, OperationStage::GeneratingArtifact);
        // The note secret stays borrowed for nullifier derivation and is
        // dropped right after; it is never stored or logged.
        let nullifier = match (secret, self.base_status()) {
            (Some(secret_hex), _) => {
                let secret = NoteSecret::from_hex(secret_hex).map_err(PrivacyError::Validation)?;
                nullifier_for(&secret)
            }
            (None, ArtifactStatus::Simulated) => {
                // demo surface: synthesize a fresh nullifier for the
                // simulated flow; the result stays labeled simulated
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
            (None, ArtifactStatus::Real) => {
                return Err(PrivacyError::validation("note secret required for withdrawal"));
            }
        };

        if self.shielded.is_nullifier_spent(&nullifier).await? {
            log_security_event(
                "withdrawal_replay",
                &hex::encode(&nullifier[..8]),
                Some(&operation_id),
            );
            return Err(PrivacyError::NullifierAlreadySpent(hex::encode(
                &nullifier[..8],
            )));
        }

        // the withdrawal proof is bound to a root the store recognizes
        let root = self.shielded.root().await?;

        let tx_reference = self
            .ledger
            .submit_instruction(
                vec![self.pool_account(token)?],
                PoolInstruction::SpendNullifier {
                    nullifier,
                    root,
                    recipient: recipient.to_string(),
                },
            )
            .await?;

        self.trace_stage(&operation_id, OperationStage::Committing);
        // authoritative double-spend gate: atomic check-and-insert
        if let Err(err) = self.shielded.spend_nullifier(&nullifier).await {
            if matches!(err, PrivacyError::NullifierAlreadySpent(_)) {
                log_security_event(
                    "withdrawal_double_spend",
                    &hex::encode(&nullifier[..8]),
                    Some(&operation_id),
                );
            }
            return Err(err);
        }
        self.balances.debit(wallet, token, amount).await?;

        self.trace_stage(&operation_id, OperationStage::Completed);
        let status = self.base_status();
        let message = match status {
            ArtifactStatus::Real => format!(
                "Withdrew {} from shielded pool to {}",
                format_units(amount, token),
                recipient
            ),
            ArtifactStatus::Simulated => format!(
                "Simulated withdrawal of {} from shielded pool",
                format_units(amount, token)
            ),
        };

        Ok(WithdrawOutcome {
            operation_id,
            tx_reference,
            status,
            message,
        })
    }

    // ========================================================================
    // Shielded vault deposit
    // ========================================================================

    pub async fn vault_deposit(
        &self,
        wallet: &str,
        vault_id: &str,
        amount: u64,
        token: SupportedToken,
    ) -> Result<VaultDepositOutcome> {
        let operation_id = uuid::Uuid::new_v4().to_string();

        self.trace_stage(&operation_id, OperationStage::ValidatingInput);
        validate_wallet(wallet, "wallet")?;
        validate_amount(amount)?;
        let vault = self.vaults.get(vault_id).await?;

        self.trace_stage(&operation_id, OperationStage::GeneratingArtifact);
        let note = ShieldedNote::generate(amount, &mut rand::thread_rng());

        let tx_reference = self
            .ledger
            .submit_instruction(
                vec![self.pool_account(token)?, self.vault_account(vault_id)?],
                PoolInstruction::RecordCommitment {
                    commitment: note.commitment,
                },
            )
            .await?;

        self.trace_stage(&operation_id, OperationStage::Committing);
        self.shielded.insert_commitment(&note.commitment).await?;

        // single writer per vault: the accounting update runs as one
        // atomic step inside the vault's critical section
        let shares_minted = {
            let mut vault = vault.write().await;
            vault.deposit(wallet, amount, chrono::Utc::now())?
        };

        self.trace_stage(&operation_id, OperationStage::Completed);
        let status = self.base_status();
        let message = match status {
            ArtifactStatus::Real => format!(
                "Privately deposited {} to vault {}",
                format_units(amount, token),
                vault_id
            ),
            ArtifactStatus::Simulated => format!(
                "Simulated private deposit of {} to vault {}",
                format_units(amount, token),
                vault_id
            ),
        };

        Ok(VaultDepositOutcome {
            operation_id,
            tx_reference,
            commitment: hex::encode(note.commitment),
            vault_id: vault_id.to_string(),
            shares_minted,
            status,
            message,
        })
    }

    // ========================================================================
    // Hidden commission
    // ========================================================================

    pub async fn pay_commission(
        &self,
        from_wallet: &str,
        to_wallet: &str,
        amount: u64,
        token: SupportedToken,
    ) -> Result<CommissionOutcome> {
        let operation_id = uuid::Uuid::new_v4().to_string();

        self.trace_stage(&operation_id, OperationStage::ValidatingInput);
        validate_wallet(from_wallet, "fromWallet")?;
        validate_wallet(to_wallet, "toWallet")?;
        if from_wallet == to_wallet {
            return Err(PrivacyError::validation("sender and recipient must differ"));
        }
        validate_amount(amount)?;

        let sender_balance = self.balances.balance(from_wallet, token).await?;
        if sender_balance.available < amount {
            return Err(PrivacyError::validation(format!(
                "insufficient pool balance: available {}, requested {}",
                sender_balance.available, amount
            )));
        }

        self.trace_stage(&operation_id, OperationStage::GeneratingArtifact);
        let (bundle, fallback, status) = self.generate_proof_with_fallback(amount)?;
        let engine = fallback.as_ref().unwrap_or(&self.range_proofs);

        if !engine.verify(&bundle.commitment, &bundle.proof, DEFAULT_BIT_LENGTH) {
            return Err(PrivacyError::backend(
                "generated range proof failed self-verification",
            ));
        }

        // conservation: old_balance - transfer must equal new_balance under
        // the homomorphic combination, checked before any state commit
        let mut old_blinding = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut old_blinding);
        let old_commitment = engine.commit(sender_balance.available, &old_blinding)?;
        let new_commitment = engine.commit(
            sender_balance.available - amount,
            &engine.blinding_sub(&old_blinding, &bundle.blinding),
        )?;
        let combined = engine.commitment_sub(&old_commitment, &bundle.commitment)?;
        if combined != new_commitment {
            return Err(PrivacyError::backend("conservation check failed"));
        }

        let tx_reference = self
            .ledger
            .submit_instruction(
                vec![self.pool_account(token)?],
                PoolInstruction::RecordTransferProof {
                    commitment: bundle.commitment,
                },
            )
            .await?;

        self.trace_stage(&operation_id, OperationStage::Committing);
        self.balances
            .transfer(from_wallet, to_wallet, token, amount)
            .await?;

        self.trace_stage(&operation_id, OperationStage::Completed);
        let message = match status {
            ArtifactStatus::Real => format!(
                "Hidden commission paid to {}...",
                &to_wallet[..8.min(to_wallet.len())]
            ),
            ArtifactStatus::Simulated => format!(
                "Simulated hidden commission to {}...",
                &to_wallet[..8.min(to_wallet.len())]
            ),
        };

        Ok(CommissionOutcome {
            operation_id,
            tx_reference,
            proof_reference: hex::encode(bundle.commitment),
            status,
            message,
        })
    }

    // ========================================================================
    // Milestones, balances, vault listing
    // ========================================================================

    pub async fn check_milestones(&self, token: SupportedToken) -> Result<Vec<MilestoneStatus>> {
        let tvl = self.balances.total_locked(token).await?;
        Ok(self.milestones.check_milestones(tvl))
    }

    pub async fn milestone_proof(
        &self,
        threshold: u64,
        token: SupportedToken,
    ) -> Result<MilestoneProof> {
        let tvl = self.balances.total_locked(token).await?;

        match self.milestones.generate_proof(threshold, tvl, &self.range_proofs) {
            Err(PrivacyError::BackendUnavailable(reason)) => {
                tracing::warn!(
                    target: "privacy::orchestrator",
                    %reason,
                    "real prover unavailable, producing simulated milestone proof"
                );
                let engine = RangeProofBackend::from_mode(BackendMode::Simulated);
                self.milestones.generate_proof(threshold, tvl, &engine)
            }
            other => other,
        }
    }

    pub async fn balance(&self, wallet: &str, token: SupportedToken) -> Result<PoolBalance> {
        validate_wallet(wallet, "wallet")?;
        Ok(self.balances.balance(wallet, token).await?)
    }

    pub async fn vaults(&self) -> Vec<VaultInfo> {
        self.vaults.list_info().await
    }
}

fn validate_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(PrivacyError::validation("amount must be positive"));
    }
    Ok(())
}

fn validate_wallet(wallet: &str, field: &str) -> Result<()> {
    let valid_len = (32..=44).contains(&wallet.len());
    let valid_chars = wallet
        .chars()
        .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'));

    if !valid_len || !valid_chars {
        return Err(PrivacyError::validation(format!(
            "invalid {}: expected base58 address",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::sol_client::MockLedgerClient;

    const WALLET_A: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    const WALLET_B: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    fn test_config() -> PrivacyConfig {
        PrivacyConfig {
            network: Network::Devnet,
            solana_rpc: "http://localhost:8899".to_string(),
            program_id: "EHHETRGEjk4E3AHanetjienJzzN5MhidSSoJvPzZMK8T".to_string(),
            backend: BackendMode::Simulated,
            backend_forced_simulated: false,
            signer_key: None,
            db_path: None,
            api_port: 0,
            log_level: "info".to_string(),
        }
    }

    async fn test_service() -> PrivacyService {
        PrivacyService::new(
            test_config(),
            ShieldedPool::new(Arc::new(MemoryShieldedStore::new())),
            Arc::new(MemoryBalanceStore::new()),
            VaultRegistry::with_default_catalog().await,
            Arc::new(DemoLedgerClient::new()),
        )
    }

    async fn service_with_ledger(ledger: Arc<dyn LedgerClient>) -> PrivacyService {
        PrivacyService::new(
            test_config(),
            ShieldedPool::new(Arc::new(MemoryShieldedStore::new())),
            Arc::new(MemoryBalanceStore::new()),
            VaultRegistry::with_default_catalog().await,
            ledger,
        )
    }

    #[tokio::test]
    async fn test_deposit_labeled_simulated() {
        let service = test_service().await;

        let outcome = service
            .deposit(WALLET_A, 5_000_000, SupportedToken::Usdc)
            .await
            .unwrap();

        assert_eq!(outcome.status, ArtifactStatus::Simulated);
        assert!(outcome.tx_reference.starts_with("demo-tx-"));
        assert_eq!(outcome.leaf_index, 0);
        assert_eq!(outcome.commitment.len(), 64);
        assert_eq!(outcome.secret.len(), 64);

        let balance = service.balance(WALLET_A, SupportedToken::Usdc).await.unwrap();
        assert_eq!(balance.available, 5_000_000);
    }

    #[tokio::test]
    async fn test_deposit_validation_has_no_side_effects() {
        let service = test_service().await;

        assert!(service.deposit("bad", 1_000, SupportedToken::Usdc).await.is_err());
        assert!(service.deposit(WALLET_A, 0, SupportedToken::Usdc).await.is_err());

        assert_eq!(service.shielded.commitment_count().await.unwrap(), 0);
        let balance = service.balance(WALLET_A, SupportedToken::Usdc).await.unwrap();
        assert_eq!(balance.available, 0);
    }

    #[tokio::test]
    async fn test_withdraw_with_secret_and_replay_rejected() {
        let service = test_service().await;

        let deposit = service
            .deposit(WALLET_A, 3_000_000, SupportedToken::Usdc)
            .await
            .unwrap();

        let outcome = service
            .withdraw(
                WALLET_A,
                Some(WALLET_B),
                1_000_000,
                SupportedToken::Usdc,
                Some(&deposit.secret),
            )
            .await
            .unwrap();
        assert!(outcome.tx_reference.starts_with("demo-tx-"));

        let balance = service.balance(WALLET_A, SupportedToken::Usdc).await.unwrap();
        assert_eq!(balance.available, 2_000_000);

        // same secret again: nullifier already spent, balance unchanged
        let err = service
            .withdraw(
                WALLET_A,
                None,
                1_000_000,
                SupportedToken::Usdc,
                Some(&deposit.secret),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::NullifierAlreadySpent(_)));

        let balance = service.balance(WALLET_A, SupportedToken::Usdc).await.unwrap();
        assert_eq!(balance.available, 2_000_000);
    }

    #[tokio::test]
    async fn test_withdraw_without_secret_in_simulated_mode() {
        let service = test_service().await;
        service
            .deposit(WALLET_A, 2_000_000, SupportedToken::Usd1)
            .await
            .unwrap();

        let outcome = service
            .withdraw(WALLET_A, None, 500_000, SupportedToken::Usd1, None)
            .await
            .unwrap();
        assert_eq!(outcome.status, ArtifactStatus::Simulated);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_balance() {
        let service = test_service().await;

        let err = service
            .withdraw(WALLET_A, None, 1, SupportedToken::Usdc, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_vault_deposit_mints_shares() {
        let service = test_service().await;

        let outcome = service
            .vault_deposit(WALLET_A, "stable-yield", 1_000_000, SupportedToken::Usdc)
            .await
            .unwrap();

        // bootstrap deposit: 1:1
        assert_eq!(outcome.shares_minted, 1_000_000);
        assert_eq!(outcome.vault_id, "stable-yield");

        let vault = service.vaults.get("stable-yield").await.unwrap();
        let vault = vault.read().await;
        assert_eq!(vault.total_assets(), 1_000_000);
        assert_eq!(vault.shares_of(WALLET_A), 1_000_000);
    }

    #[tokio::test]
    async fn test_vault_deposit_unknown_vault() {
        let service = test_service().await;

        let err = service
            .vault_deposit(WALLET_A, "no-such-vault", 1_000, SupportedToken::Usdc)
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ledger_failure_before_commit_leaves_state_unchanged() {
        let mut mock = MockLedgerClient::new();
        mock.expect_submit_instruction()
            .returning(|_, _| Err(PrivacyError::ledger("injected failure")));

        let service = service_with_ledger(Arc::new(mock)).await;

        let err = service
            .vault_deposit(WALLET_A, "stable-yield", 1_000_000, SupportedToken::Usdc)
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::Ledger(_)));

        // failure was injected between artifact generation and commit:
        // nothing may have been applied
        assert_eq!(service.shielded.commitment_count().await.unwrap(), 0);
        let vault = service.vaults.get("stable-yield").await.unwrap();
        let vault = vault.read().await;
        assert_eq!(vault.total_assets(), 0);
        assert_eq!(vault.total_shares(), 0);
    }

    #[tokio::test]
    async fn test_commission_moves_balance_and_hides_amount() {
        let service = test_service().await;
        service
            .deposit(WALLET_A, 10_000_000, SupportedToken::Usdc)
            .await
            .unwrap();

        let outcome = service
            .pay_commission(WALLET_A, WALLET_B, 2_500_000, SupportedToken::Usdc)
            .await
            .unwrap();

        assert_eq!(outcome.proof_reference.len(), 64);
        // the amount is never exposed by the result record
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("2500000"));

        let from = service.balance(WALLET_A, SupportedToken::Usdc).await.unwrap();
        let to = service.balance(WALLET_B, SupportedToken::Usdc).await.unwrap();
        assert_eq!(from.available, 7_500_000);
        assert_eq!(to.available, 2_500_000);
    }

    #[tokio::test]
    async fn test_commission_to_self_rejected() {
        let service = test_service().await;
        let err = service
            .pay_commission(WALLET_A, WALLET_A, 100, SupportedToken::Usdc)
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_milestones_follow_tvl() {
        let service = test_service().await;

        // 600K tokens locked
        service
            .deposit(WALLET_A, 600_000 * 1_000_000, SupportedToken::Usdc)
            .await
            .unwrap();

        let statuses = service.check_milestones(SupportedToken::Usdc).await.unwrap();
        let reached: Vec<(u64, bool)> =
            statuses.iter().map(|s| (s.threshold, s.reached)).collect();
        assert_eq!(
            reached,
            vec![
                (100_000, true),
                (500_000, true),
                (1_000_000, false),
                (5_000_000, false)
            ]
        );

        let proof = service
            .milestone_proof(500_000, SupportedToken::Usdc)
            .await
            .unwrap();
        assert!(proof.reached);
        assert!(proof.simulated);

        let err = service
            .milestone_proof(42, SupportedToken::Usdc)
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::ThresholdNotConfigured(42)));
    }
}
