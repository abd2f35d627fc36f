//! Ledger/Program Boundary
//!
//! The core treats the on-chain program as an opaque instruction-execution
//! service: it derives deterministic pool addresses (fixed seed + owner or
//! mint key), supplies `(accounts, instruction_args)` and receives a
//! transaction reference or failure. Nothing here interprets ledger
//! internals beyond success/failure.

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::str::FromStr;

use crate::common::{PrivacyError, Result};

/// Seed prefix for pool PDAs
pub const POOL_SEED: &[u8] = b"privacy_pool";

/// Seed prefix for vault PDAs
pub const VAULT_SEED: &[u8] = b"vault";

/// Opaque transaction reference returned by the ledger
pub type TxReference = String;

/// Instruction payloads, borsh-encoded for the program boundary.
///
/// Amounts never ride along in shielded instructions; only commitments,
/// nullifiers and proof references cross this boundary.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub enum PoolInstruction {
    RecordCommitment {
        commitment: [u8; 32],
    },
    SpendNullifier {
        nullifier: [u8; 32],
        /// Accumulator root the withdrawal proof was built against
        root: [u8; 32],
        recipient: String,
    },
    RecordTransferProof {
        commitment: [u8; 32],
    },
}

/// Derive the shielded pool address for a token mint
pub fn derive_pool_address(program_id: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POOL_SEED, mint.as_ref()], program_id)
}

/// Derive the vault state address for a vault id
pub fn derive_vault_address(program_id: &Pubkey, vault_id: &str) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, vault_id.as_bytes()], program_id)
}

fn parse_pubkey(s: &str) -> Result<Pubkey> {
    Pubkey::from_str(s).map_err(|e| PrivacyError::ledger(format!("invalid address {}: {}", s, e)))
}

/// Opaque instruction-execution service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit one instruction against the given accounts; returns the
    /// transaction reference on success.
    async fn submit_instruction(
        &self,
        accounts: Vec<String>,
        args: PoolInstruction,
    ) -> Result<TxReference>;
}

// ============================================================================
// Real client
// ============================================================================

#[derive(Clone, Debug)]
pub struct SolConfig {
    pub rpc_url: String,
    pub program_id: String,
}

/// Relayer client submitting instructions over RPC
pub struct SolLedgerClient {
    rpc: RpcClient,
    payer: Keypair,
    program_id: Pubkey,
}

impl SolLedgerClient {
    pub fn new(config: SolConfig, signer_key_base58: &str) -> Result<Self> {
        let rpc = RpcClient::new_with_commitment(config.rpc_url, CommitmentConfig::confirmed());

        let bytes = bs58::decode(signer_key_base58)
            .into_vec()
            .map_err(|e| PrivacyError::ledger(format!("invalid signer key: {}", e)))?;
        let payer = Keypair::try_from(bytes.as_slice())
            .map_err(|e| PrivacyError::ledger(format!("invalid signer key: {}", e)))?;

        let program_id = parse_pubkey(&config.program_id)?;

        Ok(Self {
            rpc,
            payer,
            program_id,
        })
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn pool_address_for_mint(&self, mint: &str) -> Result<Pubkey> {
        let mint = parse_pubkey(mint)?;
        Ok(derive_pool_address(&self.program_id, &mint).0)
    }
}

#[async_trait]
impl LedgerClient for SolLedgerClient {
    async fn submit_instruction(
        &self,
        accounts: Vec<String>,
        args: PoolInstruction,
    ) -> Result<TxReference> {
        let mut metas = Vec::with_capacity(accounts.len() + 1);
        metas.push(AccountMeta::new(self.payer.pubkey(), true));
        for account in &accounts {
            metas.push(AccountMeta::new(parse_pubkey(account)?, false));
        }

        let data = borsh::to_vec(&args)
            .map_err(|e| PrivacyError::ledger(format!("instruction encoding: {}", e)))?;

        let instruction = Instruction {
            program_id: self.program_id,
            accounts: metas,
            data,
        };

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .map_err(|e| PrivacyError::ledger(format!("blockhash fetch: {}", e)))?;

        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );

        let signature = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .map_err(|e| PrivacyError::ledger(format!("transaction submit: {}", e)))?;

        Ok(signature.to_string())
    }
}

// ============================================================================
// Demo client
// ============================================================================

/// Ledger stand-in for simulated mode. References carry a recognizable
/// `demo-tx-` prefix so simulated flows stay identifiable end-to-end.
#[derive(Default)]
pub struct DemoLedgerClient;

impl DemoLedgerClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LedgerClient for DemoLedgerClient {
    async fn submit_instruction(
        &self,
        _accounts: Vec<String>,
        _args: PoolInstruction,
    ) -> Result<TxReference> {
        Ok(format!("demo-tx-{}", uuid::Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_address_deterministic() {
        let program = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let (a, _) = derive_pool_address(&program, &mint);
        let (b, _) = derive_pool_address(&program, &mint);
        assert_eq!(a, b);

        let other_mint = Pubkey::new_unique();
        let (c, _) = derive_pool_address(&program, &other_mint);
        assert_ne!(a, c);
    }

    #[test]
    fn test_vault_address_varies_by_id() {
        let program = Pubkey::new_unique();
        let (a, _) = derive_vault_address(&program, "stable-yield");
        let (b, _) = derive_vault_address(&program, "locked-growth");
        assert_ne!(a, b);
    }

    #[test]
    fn test_instruction_round_trip() {
        let args = PoolInstruction::SpendNullifier {
            nullifier: [7u8; 32],
            root: [9u8; 32],
            recipient: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string(),
        };

        let bytes = borsh::to_vec(&args).unwrap();
        let decoded = PoolInstruction::try_from_slice(&bytes).unwrap();
        match decoded {
            PoolInstruction::SpendNullifier {
                nullifier,
                root,
                recipient,
            } => {
                assert_eq!(nullifier, [7u8; 32]);
                assert_eq!(root, [9u8; 32]);
                assert!(recipient.starts_with("9xQeW"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_demo_references_labeled() {
        let client = DemoLedgerClient::new();
        let tx = client
            .submit_instruction(
                vec![],
                PoolInstruction::RecordCommitment { commitment: [0u8; 32] },
            )
            .await
            .unwrap();
        assert!(tx.starts_with("demo-tx-"));
    }
}
