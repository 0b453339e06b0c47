use std::time::Duration;

use chrono::{DateTime, Utc};
use endorse_core::types::claims::ClaimValidity;
use endorse_core::types::intoto::DigestSet;
use endorse_core::{EndorseError, LoadError, TransportError, VerificationOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An endorsement request as read from a request file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EndorsementRequest {
    pub binary_name: String,
    /// Expected digests of the binary; must contain `sha2-256`.
    pub digests: DigestSet,
    /// Provenance URIs, in the order their evidence is recorded.
    pub provenances: Vec<String>,
    #[serde(default)]
    pub policy: VerificationOptions,
    pub validity: ValiditySpec,
    /// Overall budget for loading the provenances.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl EndorsementRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Validity window of the issued claim: `days` days starting at
/// `not_before`, or at issuance when unset.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ValiditySpec {
    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,
    pub days: u32,
}

impl ValiditySpec {
    pub fn claim_validity(&self) -> Result<ClaimValidity, HostError> {
        let not_before = self.not_before.unwrap_or_else(Utc::now);
        ClaimValidity::new(not_before, chrono::Duration::days(i64::from(self.days))).ok_or_else(
            || HostError::InvalidRequest(format!("invalid validity of {} days", self.days)),
        )
    }
}

/// Errors surfaced by the endorsement host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Endorse(#[from] EndorseError),
    #[error("loading `{uri}` did not complete: {message}")]
    Join { uri: String, message: String },
    #[error("could not build the HTTP client: {0}")]
    Client(#[from] TransportError),
    #[error("building the HTTP client did not complete: {0}")]
    ClientSetup(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] serde_yaml_bw::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HostError {
    pub fn join(uri: impl Into<String>, err: tokio::task::JoinError) -> Self {
        HostError::Join {
            uri: uri.into(),
            message: err.to_string(),
        }
    }
}
