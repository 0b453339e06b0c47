use endorse_types::claims::{
    ClaimValidity, EndorsementStatement, ProvenanceData, VerifiedProvenanceSet,
};
use endorse_types::intoto::DigestSet;
use tracing::instrument;

use crate::claims::{ClaimIssuer, EndorsementIssuer};
use crate::error::{EndorseError, VerificationPhase};
use crate::loader::ParsedProvenance;
use crate::model::ProvenanceIR;
use crate::verifier::{DefaultVerifier, ProvenanceVerifier, VerificationOptions};

/// Generate an endorsement statement for `binary_name` valid for `validity`,
/// using `provenances` as evidence.
///
/// The provenances must first agree with `binary_name` and the `sha2-256`
/// entry of `digests`; only then is `policy` evaluated.
pub fn generate_endorsement(
    binary_name: &str,
    digests: &DigestSet,
    policy: &VerificationOptions,
    validity: &ClaimValidity,
    provenances: &[ParsedProvenance],
) -> Result<EndorsementStatement, EndorseError> {
    generate_endorsement_with(
        &DefaultVerifier,
        &EndorsementIssuer::default(),
        binary_name,
        digests,
        policy,
        validity,
        provenances,
    )
}

/// [`generate_endorsement`] with an explicit verifier and claim issuer.
#[instrument(skip_all, fields(binary_name = %binary_name, provenances = provenances.len()))]
pub fn generate_endorsement_with<V, I>(
    verifier: &V,
    issuer: &I,
    binary_name: &str,
    digests: &DigestSet,
    policy: &VerificationOptions,
    validity: &ClaimValidity,
    provenances: &[ParsedProvenance],
) -> Result<I::Statement, EndorseError>
where
    V: ProvenanceVerifier + ?Sized,
    I: ClaimIssuer + ?Sized,
{
    if provenances.is_empty() {
        return Err(EndorseError::NoProvenances {
            binary_name: binary_name.to_string(),
        });
    }

    let (provenance_irs, provenances_data): (Vec<ProvenanceIR>, Vec<ProvenanceData>) =
        provenances
            .iter()
            .map(|p| (p.provenance().clone(), p.source_metadata().clone()))
            .unzip();

    let identity = VerificationOptions::identity(binary_name, digests).map_err(|err| {
        EndorseError::verification(binary_name, VerificationPhase::Identity, err)
    })?;
    verifier
        .verify(&provenance_irs, &identity)
        .map_err(|err| EndorseError::verification(binary_name, VerificationPhase::Identity, err))?;

    verifier
        .verify(&provenance_irs, policy)
        .map_err(|err| EndorseError::verification(binary_name, VerificationPhase::Policy, err))?;

    tracing::debug!("provenances verified, issuing endorsement");
    let verified = VerifiedProvenanceSet {
        digests: digests.clone(),
        binary_name: binary_name.to_string(),
        provenances: provenances_data,
    };
    Ok(issuer.issue(validity, verified))
}
