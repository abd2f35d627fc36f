//! Operation Stage Machine and Result Records

use serde::Serialize;
use std::fmt;

/// Stages every client-facing operation walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStage {
    Requested,
    ValidatingInput,
    GeneratingArtifact,
    Committing,
    Completed,
    Failed,
}

impl fmt::Display for OperationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStage::Requested => "requested",
            OperationStage::ValidatingInput => "validating_input",
            OperationStage::GeneratingArtifact => "generating_artifact",
            OperationStage::Committing => "committing",
            OperationStage::Completed => "completed",
            OperationStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Whether an operation's artifact came from the real cryptographic
/// backend or the labeled simulated one. Present on every result record;
/// a simulated artifact is never passed off as real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Real,
    Simulated,
}

impl ArtifactStatus {
    pub fn is_simulated(&self) -> bool {
        matches!(self, ArtifactStatus::Simulated)
    }
}

/// Result of a shielded pool deposit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositOutcome {
    pub operation_id: String,
    pub tx_reference: String,
    /// Hex commitment inserted into the pool
    pub commitment: String,
    /// Leaf index assigned by the commitment log
    pub leaf_index: u64,
    /// Hex note secret, returned to the caller and held nowhere else
    pub secret: String,
    pub status: ArtifactStatus,
    pub message: String,
}

/// Result of a shielded pool withdrawal
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawOutcome {
    pub operation_id: String,
    pub tx_reference: String,
    pub status: ArtifactStatus,
    pub message: String,
}

/// Result of a shielded vault deposit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDepositOutcome {
    pub operation_id: String,
    pub tx_reference: String,
    pub commitment: String,
    pub vault_id: String,
    pub shares_minted: u64,
    pub status: ArtifactStatus,
    pub message: String,
}

/// Result of a hidden commission payment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionOutcome {
    pub operation_id: String,
    pub tx_reference: String,
    /// Hex of the amount commitment; the amount itself never appears
    pub proof_reference: String,
    pub status: ArtifactStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&OperationStage::GeneratingArtifact).unwrap();
        assert_eq!(json, "\"generating_artifact\"");
    }

    #[test]
    fn test_artifact_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ArtifactStatus::Simulated).unwrap(),
            "\"simulated\""
        );
        assert!(ArtifactStatus::Simulated.is_simulated());
        assert!(!ArtifactStatus::Real.is_simulated());
    }
}
