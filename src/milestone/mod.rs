//! Milestone Proof Generation
//!
//! Publishes a comparison proof over the undisclosed TVL aggregate: the
//! artifact asserts `TVL >= threshold` without carrying the value. When a
//! milestone is reached, the generator commits to `TVL - threshold` and
//! range-proves the difference non-negative; the aggregate itself never
//! appears in the artifact and is never logged alongside it.

use serde::Serialize;

use crate::common::{PrivacyError, Result};
use crate::tokens::MICRO_UNITS_PER_TOKEN;
use crate::transfer::{RangeProofBackend, DEFAULT_BIT_LENGTH};

/// Stock milestone ladder, in whole tokens
pub const DEFAULT_MILESTONES: [(u64, &str); 4] = [
    (100_000, "100K"),
    (500_000, "500K"),
    (1_000_000, "1M"),
    (5_000_000, "5M"),
];

/// Reached/not-reached status for one threshold
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneStatus {
    /// Threshold in whole tokens
    pub threshold: u64,
    pub label: String,
    pub reached: bool,
}

/// Publishable milestone artifact. Carries the statement and the proof,
/// never the aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneProof {
    pub threshold: u64,
    pub reached: bool,
    /// Commitment to `TVL - threshold` (hex), present when reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
    /// Range proof blob (base64), present when reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
    pub simulated: bool,
}

/// Configured milestone set: ascending, deduplicated
#[derive(Debug, Clone)]
pub struct MilestoneConfig {
    thresholds: Vec<(u64, String)>,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_MILESTONES
                .iter()
                .map(|(t, l)| (*t, l.to_string()))
                .collect(),
        )
    }
}

impl MilestoneConfig {
    pub fn new(mut thresholds: Vec<(u64, String)>) -> Self {
        thresholds.sort_by_key(|(t, _)| *t);
        thresholds.dedup_by_key(|(t, _)| *t);
        Self { thresholds }
    }

    pub fn contains(&self, threshold: u64) -> bool {
        self.thresholds.iter().any(|(t, _)| *t == threshold)
    }

    /// Pure comparison against every configured threshold
    pub fn check_milestones(&self, aggregate_micro: u64) -> Vec<MilestoneStatus> {
        self.thresholds
            .iter()
            .map(|(threshold, label)| MilestoneStatus {
                threshold: *threshold,
                label: label.clone(),
                reached: aggregate_micro >= threshold * MICRO_UNITS_PER_TOKEN,
            })
            .collect()
    }

    /// Build the proof artifact for one threshold.
    ///
    /// Fails with `ThresholdNotConfigured` for an unrecognized threshold.
    /// A milestone that is not reached yields a `reached: false` statement
    /// with no proof blob; that is an ordinary outcome, not an error.
    pub fn generate_proof(
        &self,
        threshold: u64,
        aggregate_micro: u64,
        backend: &RangeProofBackend,
    ) -> Result<MilestoneProof> {
        if !self.contains(threshold) {
            return Err(PrivacyError::ThresholdNotConfigured(threshold));
        }

        let threshold_micro = threshold * MICRO_UNITS_PER_TOKEN;
        if aggregate_micro < threshold_micro {
            return Ok(MilestoneProof {
                threshold,
                reached: false,
                commitment: None,
                proof: None,
                simulated: backend.is_simulated(),
            });
        }

        let surplus = aggregate_micro - threshold_micro;
        let bundle = backend.generate(surplus, DEFAULT_BIT_LENGTH)?;

        use base64::Engine as _;
        Ok(MilestoneProof {
            threshold,
            reached: true,
            commitment: Some(hex::encode(bundle.commitment)),
            proof: Some(base64::engine::general_purpose::STANDARD.encode(&bundle.proof)),
            simulated: backend.is_simulated(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendMode;
    use crate::tokens::to_micro;

    fn backend() -> RangeProofBackend {
        RangeProofBackend::from_mode(BackendMode::Simulated)
    }

    #[test]
    fn test_monotonic_check() {
        let config = MilestoneConfig::default();
        let statuses = config.check_milestones(to_micro(600_000.0));

        let by_threshold: Vec<(u64, bool)> =
            statuses.iter().map(|s| (s.threshold, s.reached)).collect();
        assert_eq!(
            by_threshold,
            vec![
                (100_000, true),
                (500_000, true),
                (1_000_000, false),
                (5_000_000, false)
            ]
        );
    }

    #[test]
    fn test_exact_threshold_counts_as_reached() {
        let config = MilestoneConfig::default();
        let statuses = config.check_milestones(to_micro(500_000.0));
        assert!(statuses.iter().find(|s| s.threshold == 500_000).unwrap().reached);
    }

    #[test]
    fn test_unconfigured_threshold_rejected() {
        let config = MilestoneConfig::default();
        let err = config
            .generate_proof(123_456, to_micro(600_000.0), &backend())
            .unwrap_err();
        assert!(matches!(err, PrivacyError::ThresholdNotConfigured(123_456)));
    }

    #[test]
    fn test_proof_artifact_withholds_aggregate() {
        let config = MilestoneConfig::default();
        let aggregate = to_micro(600_000.0);
        let proof = config
            .generate_proof(500_000, aggregate, &backend())
            .unwrap();

        assert!(proof.reached);
        assert!(proof.commitment.is_some());
        assert!(proof.proof.is_some());

        // the serialized artifact must not contain the aggregate value
        let json = serde_json::to_string(&proof).unwrap();
        assert!(!json.contains(&aggregate.to_string()));
        assert!(!json.contains("600000"));
    }

    #[test]
    fn test_unreached_milestone_has_no_proof() {
        let config = MilestoneConfig::default();
        let proof = config
            .generate_proof(1_000_000, to_micro(600_000.0), &backend())
            .unwrap();

        assert!(!proof.reached);
        assert!(proof.commitment.is_none());
        assert!(proof.proof.is_none());
    }

    #[test]
    fn test_thresholds_sorted_and_deduplicated() {
        let config = MilestoneConfig::new(vec![
            (500, "B".to_string()),
            (100, "A".to_string()),
            (500, "B2".to_string()),
        ]);
        let statuses = config.check_milestones(0);
        let thresholds: Vec<u64> = statuses.iter().map(|s| s.threshold).collect();
        assert_eq!(thresholds, vec![100, 500]);
    }
}
