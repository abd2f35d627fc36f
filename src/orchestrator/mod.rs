//! Privacy Orchestrator
//!
//! Composes the commitment store, range-proof engine, vault accounting and
//! milestone generator behind the client-facing operations. Every
//! operation walks the same stage machine:
//!
//! `Requested -> ValidatingInput -> GeneratingArtifact -> Committing ->
//! Completed | Failed`
//!
//! Artifact generation strictly precedes any state commit, so an abort or
//! failure between the two leaves pool and vault state untouched.

pub mod service;
pub mod types;

pub use service::PrivacyService;
pub use types::{
    ArtifactStatus, CommissionOutcome, DepositOutcome, OperationStage, VaultDepositOutcome,
    WithdrawOutcome,
};
