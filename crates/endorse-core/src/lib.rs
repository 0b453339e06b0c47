//! Loading of supply-chain provenances and the verification gate in front of
//! endorsement issuance.
//!
//! Provenances are fetched from `file`, `http` or `https` URIs, parsed as a
//! bare in-toto statement or a DSSE envelope, and mapped into
//! [`ProvenanceIR`]. [`generate_endorsement`] then checks that every
//! provenance names the expected binary and digest before evaluating the
//! caller's [`VerificationOptions`].

mod cancel;
pub mod claims;
mod config;
pub mod document;
mod endorser;
mod error;
mod fetch;
mod loader;
pub mod model;
pub mod verifier;

pub use cancel::Cancellation;
pub use claims::{ClaimIssuer, EndorsementIssuer};
pub use config::FetchConfig;
pub use endorser::{generate_endorsement, generate_endorsement_with};
pub use error::{
    DocumentError, EndorseError, FetchError, LoadError, MappingError, PolicyError,
    TransportError, VerificationPhase,
};
pub use fetch::{Fetcher, ReqwestTransport, Transport};
pub use loader::{ParsedProvenance, ProvenanceLoader, parse_provenance};
pub use model::ProvenanceIR;
pub use verifier::{DefaultVerifier, ProvenanceVerifier, VerificationOptions};

pub use endorse_types as types;
