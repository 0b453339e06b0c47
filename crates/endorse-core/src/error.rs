use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain the raw bytes behind a provenance URI.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not parse the URI `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URI scheme `{scheme}` in `{uri}`")]
    UnsupportedScheme { uri: String, scheme: String },
    #[error("invalid scheme `file` and host `{host}` combination in `{uri}`")]
    InvalidFileHost { uri: String, host: String },
    #[error("`{uri}` does not name a local file path")]
    InvalidFilePath { uri: String },
    #[error("`{}` does not exist (from `{uri}`)", .path.display())]
    NotFound { uri: String, path: PathBuf },
    #[error("I/O error while reading `{uri}`: {source}")]
    Io {
        uri: String,
        #[source]
        source: io::Error,
    },
    #[error("could not fetch `{uri}` over HTTP: {source}")]
    Transport {
        uri: String,
        #[source]
        source: TransportError,
    },
    #[error("fetching `{uri}` was cancelled")]
    Cancelled { uri: String },
    #[error("deadline exceeded before fetching `{uri}`")]
    DeadlineExceeded { uri: String },
}

impl FetchError {
    /// The URI the failed fetch was attempted for.
    pub fn uri(&self) -> &str {
        match self {
            Self::InvalidUri { uri, .. }
            | Self::UnsupportedScheme { uri, .. }
            | Self::InvalidFileHost { uri, .. }
            | Self::InvalidFilePath { uri }
            | Self::NotFound { uri, .. }
            | Self::Io { uri, .. }
            | Self::Transport { uri, .. }
            | Self::Cancelled { uri }
            | Self::DeadlineExceeded { uri } => uri,
        }
    }

    pub(crate) fn transport(uri: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            uri: uri.into(),
            source,
        }
    }
}

/// Errors reported by a [`Transport`](crate::fetch::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Failure to read bytes as one particular document format.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported statement type `{0}`")]
    UnsupportedStatementType(String),
    #[error("statement has an empty predicate type")]
    MissingPredicateType,
    #[error("statement has no subjects")]
    NoSubjects,
    #[error("unsupported DSSE payload type `{0}`")]
    UnsupportedPayloadType(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("envelope payload is not a valid statement: {0}")]
    Payload(#[source] Box<DocumentError>),
}

/// A parsed document could not be converted to the canonical provenance
/// representation.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("unsupported predicate type `{0}`")]
    UnsupportedPredicateType(String),
    #[error("unsupported build type `{build_type}` for predicate type `{predicate_type}`")]
    UnsupportedBuildType {
        predicate_type: String,
        build_type: String,
    },
    #[error("expected exactly one subject, found {0}")]
    SubjectCount(usize),
    #[error("subject `{0}` has no sha256 digest")]
    MissingSha256Digest(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid predicate: {0}")]
    Predicate(#[from] serde_json::Error),
}

/// Failure to load a single provenance. Every variant identifies the URI.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't load the provenance bytes: {0}")]
    Fetch(#[from] FetchError),
    #[error(
        "couldn't parse bytes from `{uri}` into a validated provenance: \
         parsing bytes as an in-toto statement: {statement}; \
         parsing bytes as a DSSE envelope: {envelope}"
    )]
    NeitherFormatParsed {
        uri: String,
        statement: DocumentError,
        envelope: DocumentError,
    },
    #[error("couldn't map provenance from `{uri}` to internal representation: {source}")]
    Mapping {
        uri: String,
        #[source]
        source: MappingError,
    },
}

impl LoadError {
    pub fn uri(&self) -> &str {
        match self {
            Self::Fetch(err) => err.uri(),
            Self::NeitherFormatParsed { uri, .. } | Self::Mapping { uri, .. } => uri,
        }
    }

    pub(crate) fn mapping(uri: impl Into<String>, source: MappingError) -> Self {
        Self::Mapping {
            uri: uri.into(),
            source,
        }
    }
}

/// A verification check did not hold for the given provenances.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("expected at least {required} provenances, got {actual}")]
    TooFewProvenances { required: u64, actual: usize },
    #[error("expected at most {allowed} provenances, got {actual}")]
    TooManyProvenances { allowed: u64, actual: usize },
    #[error("provenance #{index}: binary name `{actual}` does not match `{expected}`")]
    BinaryNameMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("provenance #{index}: {format} digest `{actual}` does not match `{expected}`")]
    BinaryDigestMismatch {
        index: usize,
        format: String,
        expected: String,
        actual: String,
    },
    #[error("no expected digest given for format `{0}`")]
    MissingExpectedDigest(String),
    #[error("unsupported digest format `{0}`")]
    UnsupportedDigestFormat(String),
    #[error("{formats} digest formats given for {digests} digests")]
    DigestCountMismatch { formats: usize, digests: usize },
    #[error("provenance #{0} does not record a build command")]
    MissingBuildCommand(usize),
    #[error("provenance #{index}: repository `{expected}` not among {actual:?}")]
    RepositoryMismatch {
        index: usize,
        expected: String,
        actual: Vec<String>,
    },
    #[error("provenance #{index}: builder {actual:?} is not the trusted builder `{expected}`")]
    UntrustedBuilder {
        index: usize,
        expected: String,
        actual: Option<String>,
    },
    #[error("{} of {total} checks failed:\n- {}",
            .errors.len(),
            .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n- ")
    )]
    AllOf {
        total: usize,
        errors: Vec<PolicyError>,
    },
}

/// Which verification phase of the endorsement gate failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationPhase {
    /// The mandatory binary name and digest check.
    Identity,
    /// The caller-supplied verification options.
    Policy,
}

impl fmt::Display for VerificationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Policy => f.write_str("policy"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EndorseError {
    #[error("no provenances given for `{binary_name}`")]
    NoProvenances { binary_name: String },
    #[error("failed to verify provenances for `{binary_name}` ({phase} check): {source}")]
    Verification {
        binary_name: String,
        phase: VerificationPhase,
        #[source]
        source: PolicyError,
    },
}

impl EndorseError {
    pub fn verification(
        binary_name: impl Into<String>,
        phase: VerificationPhase,
        source: PolicyError,
    ) -> Self {
        Self::Verification {
            binary_name: binary_name.into(),
            phase,
            source,
        }
    }

    /// The failed phase, if this is a verification failure.
    pub fn phase(&self) -> Option<VerificationPhase> {
        match self {
            Self::Verification { phase, .. } => Some(*phase),
            Self::NoProvenances { .. } => None,
        }
    }
}
