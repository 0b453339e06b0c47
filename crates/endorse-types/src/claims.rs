use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::intoto::{DigestSet, Statement};

/// Predicate type of claim statements.
pub const CLAIM_V1: &str = "https://github.com/project-oak/transparent-release/claim/v1";
/// Claim type of endorsement claims.
pub const ENDORSEMENT_V2: &str = "https://github.com/project-oak/transparent-release/endorsement/v2";
/// Evidence role recorded for provenances.
pub const PROVENANCE_ROLE: &str = "Provenance";

/// Where a provenance was loaded from, and the SHA-256 of the bytes fetched
/// from there.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceData {
    pub uri: String,
    pub sha256_digest: String,
}

/// Time window in which a claim is valid.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimValidity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl ClaimValidity {
    /// Window of `duration` starting at `not_before`. Returns `None` unless
    /// `duration` is positive and the end does not overflow.
    pub fn new(not_before: DateTime<Utc>, duration: Duration) -> Option<Self> {
        if duration <= Duration::zero() {
            return None;
        }
        let not_after = not_before.checked_add_signed(duration)?;
        Some(Self {
            not_before,
            not_after,
        })
    }

    /// Window of `duration` starting now.
    pub fn starting_now(duration: Duration) -> Option<Self> {
        Self::new(Utc::now(), duration)
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// What was verified before an endorsement is issued. Carries provenance
/// source metadata only, never provenance content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedProvenanceSet {
    pub digests: DigestSet,
    pub binary_name: String,
    pub provenances: Vec<ProvenanceData>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPredicate {
    pub claim_type: String,
    pub issued_on: DateTime<Utc>,
    pub validity: ClaimValidity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<ClaimEvidence>,
}

/// A document relied upon when issuing a claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimEvidence {
    pub role: String,
    pub uri: String,
    pub digest: DigestSet,
}

pub type EndorsementStatement = Statement<ClaimPredicate>;
