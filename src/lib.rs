//! Otus Privacy - Shielded Pool and Vault Accounting Engine
//!
//! Privacy-preserving deposit/withdrawal and share-accounting layer for a
//! pooled stablecoin vault on Solana.
//!
//! ## Components
//!
//! 1. **Commitment Store** (`shielded`) - append-only commitment log with
//!    nullifier double-spend protection
//! 2. **Range-Proof Transfer Engine** (`transfer`) - amount-hidden transfers
//!    (Bulletproofs or a labeled simulated backend)
//! 3. **Vault Accounting Engine** (`vault`) - proportional share accounting
//!    with fee schedule and lock periods
//! 4. **Milestone Proof Generator** (`milestone`) - TVL threshold proofs
//!    that withhold the aggregate
//! 5. **Privacy Orchestrator** (`orchestrator`) - composes the above behind
//!    the client-facing operations
//!
//! The cryptographic backend (simulated vs. real) is selected once from
//! configuration; every result record labels which one produced it.

pub mod api;
pub mod common;
pub mod config;
pub mod logging;
pub mod milestone;
pub mod orchestrator;
pub mod shielded;
pub mod sol_client;
pub mod storage;
pub mod tokens;
pub mod transfer;
pub mod vault;

// Re-exports: error taxonomy
pub use common::{PrivacyError, Result};

// Re-exports: configuration
pub use config::{BackendMode, Network, PrivacyConfig};

// Re-exports: shielded pool primitives
pub use shielded::{Commitment, CommitmentId, MerkleRoot, NoteSecret, Nullifier, ShieldedNote, ShieldedPool};

// Re-exports: orchestrator
pub use orchestrator::{ArtifactStatus, OperationStage, PrivacyService};

// Re-exports: ledger boundary
pub use sol_client::{
    derive_pool_address, derive_vault_address, DemoLedgerClient, LedgerClient, PoolInstruction,
    SolLedgerClient, TxReference,
};

// Re-exports: tokens
pub use tokens::SupportedToken;
