//! Wire types shared by the endorsement core and its hosts.

pub mod claims;
pub mod dsse;
pub mod intoto;

pub use claims::{
    ClaimEvidence, ClaimPredicate, ClaimValidity, EndorsementStatement, ProvenanceData,
    VerifiedProvenanceSet,
};
pub use dsse::{Envelope, Signature};
pub use intoto::{DigestSet, Statement, Subject};
