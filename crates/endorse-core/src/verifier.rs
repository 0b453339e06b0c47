use endorse_types::intoto::{DigestSet, SHA2_256};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::model::ProvenanceIR;

/// Checks to run over a set of provenances.
///
/// Every check that is present must hold for the set to verify. Absent checks
/// are skipped, so the default value accepts any set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerificationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance_count_at_least: Option<VerifyProvenanceCountAtLeast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance_count_at_most: Option<VerifyProvenanceCountAtMost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_with_binary_name: Option<VerifyAllWithBinaryName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_with_binary_digests: Option<VerifyAllWithBinaryDigests>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_with_build_command: Option<VerifyAllWithBuildCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_with_repository: Option<VerifyAllWithRepository>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_with_trusted_builder: Option<VerifyAllWithTrustedBuilder>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyProvenanceCountAtLeast {
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyProvenanceCountAtMost {
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllWithBinaryName {
    pub binary_name: String,
}

/// Digests are matched pairwise with `formats`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllWithBinaryDigests {
    pub formats: Vec<String>,
    pub digests: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllWithBuildCommand {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllWithRepository {
    pub repository_uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllWithTrustedBuilder {
    pub trusted_builder: String,
}

impl VerificationOptions {
    /// The check every endorsement must pass: all provenances name
    /// `binary_name` and record the expected `sha2-256` digest.
    pub fn identity(binary_name: &str, digests: &DigestSet) -> Result<Self, PolicyError> {
        let digest = digests
            .get(SHA2_256)
            .ok_or_else(|| PolicyError::MissingExpectedDigest(SHA2_256.to_string()))?;

        Ok(Self {
            all_with_binary_name: Some(VerifyAllWithBinaryName {
                binary_name: binary_name.to_string(),
            }),
            all_with_binary_digests: Some(VerifyAllWithBinaryDigests {
                formats: vec![SHA2_256.to_string()],
                digests: vec![digest.clone()],
            }),
            ..Self::default()
        })
    }
}

/// Evaluates [`VerificationOptions`] against a set of provenances.
pub trait ProvenanceVerifier {
    fn verify(
        &self,
        provenances: &[ProvenanceIR],
        options: &VerificationOptions,
    ) -> Result<(), PolicyError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultVerifier;

impl ProvenanceVerifier for DefaultVerifier {
    fn verify(
        &self,
        provenances: &[ProvenanceIR],
        options: &VerificationOptions,
    ) -> Result<(), PolicyError> {
        let mut results = Vec::new();

        if let Some(check) = &options.provenance_count_at_least {
            results.push(count_at_least(provenances, check));
        }
        if let Some(check) = &options.provenance_count_at_most {
            results.push(count_at_most(provenances, check));
        }
        if let Some(check) = &options.all_with_binary_name {
            results.push(all_with_binary_name(provenances, check));
        }
        if let Some(check) = &options.all_with_binary_digests {
            results.push(all_with_binary_digests(provenances, check));
        }
        if options.all_with_build_command.is_some() {
            results.push(all_with_build_command(provenances));
        }
        if let Some(check) = &options.all_with_repository {
            results.push(all_with_repository(provenances, check));
        }
        if let Some(check) = &options.all_with_trusted_builder {
            results.push(all_with_trusted_builder(provenances, check));
        }

        let total = results.len();
        let mut errors: Vec<PolicyError> = results.into_iter().filter_map(Result::err).collect();
        tracing::debug!(checks = total, failed = errors.len(), "verified provenances");

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(PolicyError::AllOf { total, errors }),
        }
    }
}

fn count_at_least(
    provenances: &[ProvenanceIR],
    check: &VerifyProvenanceCountAtLeast,
) -> Result<(), PolicyError> {
    if (provenances.len() as u64) < check.count {
        return Err(PolicyError::TooFewProvenances {
            required: check.count,
            actual: provenances.len(),
        });
    }
    Ok(())
}

fn count_at_most(
    provenances: &[ProvenanceIR],
    check: &VerifyProvenanceCountAtMost,
) -> Result<(), PolicyError> {
    if (provenances.len() as u64) > check.count {
        return Err(PolicyError::TooManyProvenances {
            allowed: check.count,
            actual: provenances.len(),
        });
    }
    Ok(())
}

fn all_with_binary_name(
    provenances: &[ProvenanceIR],
    check: &VerifyAllWithBinaryName,
) -> Result<(), PolicyError> {
    for (index, provenance) in provenances.iter().enumerate() {
        if provenance.binary_name() != check.binary_name {
            return Err(PolicyError::BinaryNameMismatch {
                index,
                expected: check.binary_name.clone(),
                actual: provenance.binary_name().to_string(),
            });
        }
    }
    Ok(())
}

fn all_with_binary_digests(
    provenances: &[ProvenanceIR],
    check: &VerifyAllWithBinaryDigests,
) -> Result<(), PolicyError> {
    if check.formats.len() != check.digests.len() {
        return Err(PolicyError::DigestCountMismatch {
            formats: check.formats.len(),
            digests: check.digests.len(),
        });
    }

    for (format, expected) in check.formats.iter().zip(&check.digests) {
        if format != SHA2_256 {
            return Err(PolicyError::UnsupportedDigestFormat(format.clone()));
        }
        for (index, provenance) in provenances.iter().enumerate() {
            if provenance.binary_sha256_digest() != expected.as_str() {
                return Err(PolicyError::BinaryDigestMismatch {
                    index,
                    format: format.clone(),
                    expected: expected.clone(),
                    actual: provenance.binary_sha256_digest().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn all_with_build_command(provenances: &[ProvenanceIR]) -> Result<(), PolicyError> {
    for (index, provenance) in provenances.iter().enumerate() {
        if provenance.build_cmd().is_none_or(<[String]>::is_empty) {
            return Err(PolicyError::MissingBuildCommand(index));
        }
    }
    Ok(())
}

fn all_with_repository(
    provenances: &[ProvenanceIR],
    check: &VerifyAllWithRepository,
) -> Result<(), PolicyError> {
    for (index, provenance) in provenances.iter().enumerate() {
        if !provenance
            .repo_uris()
            .iter()
            .any(|uri| *uri == check.repository_uri)
        {
            return Err(PolicyError::RepositoryMismatch {
                index,
                expected: check.repository_uri.clone(),
                actual: provenance.repo_uris().to_vec(),
            });
        }
    }
    Ok(())
}

fn all_with_trusted_builder(
    provenances: &[ProvenanceIR],
    check: &VerifyAllWithTrustedBuilder,
) -> Result<(), PolicyError> {
    for (index, provenance) in provenances.iter().enumerate() {
        if provenance.trusted_builder() != Some(check.trusted_builder.as_str()) {
            return Err(PolicyError::UntrustedBuilder {
                index,
                expected: check.trusted_builder.clone(),
                actual: provenance.trusted_builder().map(str::to_string),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance(name: &str, digest: &str) -> ProvenanceIR {
        ProvenanceIR::new(name, digest, "https://example.com/build")
    }

    fn digests(sha256: &str) -> DigestSet {
        DigestSet::from([(SHA2_256.to_string(), sha256.to_string())])
    }

    #[test]
    fn default_options_accept_anything() {
        let provenances = [provenance("a", "1"), provenance("b", "2")];
        assert!(
            DefaultVerifier
                .verify(&provenances, &VerificationOptions::default())
                .is_ok()
        );
    }

    #[test]
    fn identity_accepts_matching_provenances() {
        let options = VerificationOptions::identity("app", &digests("d0")).expect("options");
        let provenances = [provenance("app", "d0"), provenance("app", "d0")];
        assert!(DefaultVerifier.verify(&provenances, &options).is_ok());
    }

    #[test]
    fn identity_reports_name_mismatch_with_index() {
        let options = VerificationOptions::identity("app", &digests("d0")).expect("options");
        let provenances = [provenance("app", "d0"), provenance("other", "d0")];
        match DefaultVerifier.verify(&provenances, &options) {
            Err(PolicyError::BinaryNameMismatch { index, actual, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(actual, "other");
            }
            other => panic!("expected name mismatch, got {other:?}"),
        }
    }

    #[test]
    fn identity_reports_every_failing_check() {
        let options = VerificationOptions::identity("app", &digests("d0")).expect("options");
        let provenances = [provenance("other", "ff")];
        match DefaultVerifier.verify(&provenances, &options) {
            Err(PolicyError::AllOf { total, errors }) => {
                assert_eq!(total, 2);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected aggregated failure, got {other:?}"),
        }
    }

    #[test]
    fn identity_requires_sha2_256() {
        let only_sha512 = DigestSet::from([("sha2-512".to_string(), "00".to_string())]);
        assert!(matches!(
            VerificationOptions::identity("app", &only_sha512),
            Err(PolicyError::MissingExpectedDigest(_))
        ));
    }

    #[test]
    fn count_bounds() {
        let options = VerificationOptions {
            provenance_count_at_least: Some(VerifyProvenanceCountAtLeast { count: 2 }),
            ..Default::default()
        };
        assert!(matches!(
            DefaultVerifier.verify(&[provenance("a", "1")], &options),
            Err(PolicyError::TooFewProvenances {
                required: 2,
                actual: 1
            })
        ));

        let options = VerificationOptions {
            provenance_count_at_most: Some(VerifyProvenanceCountAtMost { count: 1 }),
            ..Default::default()
        };
        assert!(matches!(
            DefaultVerifier.verify(&[provenance("a", "1"), provenance("a", "1")], &options),
            Err(PolicyError::TooManyProvenances { .. })
        ));
    }

    #[test]
    fn unsupported_digest_format() {
        let options = VerificationOptions {
            all_with_binary_digests: Some(VerifyAllWithBinaryDigests {
                formats: vec!["md5".into()],
                digests: vec!["00".into()],
            }),
            ..Default::default()
        };
        assert!(matches!(
            DefaultVerifier.verify(&[provenance("a", "1")], &options),
            Err(PolicyError::UnsupportedDigestFormat(_))
        ));
    }

    #[test]
    fn build_command_repository_and_builder() {
        let good = provenance("app", "d0")
            .with_build_cmd(vec!["make".into()])
            .with_repo_uri("https://github.com/org/app")
            .with_trusted_builder("builder");
        let options = VerificationOptions {
            all_with_build_command: Some(VerifyAllWithBuildCommand {}),
            all_with_repository: Some(VerifyAllWithRepository {
                repository_uri: "https://github.com/org/app".into(),
            }),
            all_with_trusted_builder: Some(VerifyAllWithTrustedBuilder {
                trusted_builder: "builder".into(),
            }),
            ..Default::default()
        };
        assert!(DefaultVerifier.verify(&[good.clone()], &options).is_ok());

        let bare = provenance("app", "d0");
        match DefaultVerifier.verify(&[good, bare], &options) {
            Err(PolicyError::AllOf { total: 3, errors }) => {
                assert!(matches!(errors[0], PolicyError::MissingBuildCommand(1)));
                assert!(matches!(
                    errors[1],
                    PolicyError::RepositoryMismatch { index: 1, .. }
                ));
                assert!(matches!(
                    errors[2],
                    PolicyError::UntrustedBuilder { index: 1, .. }
                ));
            }
            other => panic!("expected three failures, got {other:?}"),
        }
    }

    #[test]
    fn options_parse_from_json() {
        let options: VerificationOptions = serde_json::from_str(
            r#"{"provenance_count_at_least": {"count": 1}, "all_with_build_command": {}}"#,
        )
        .expect("options");
        assert_eq!(options.provenance_count_at_least.map(|c| c.count), Some(1));
        assert!(options.all_with_build_command.is_some());
        assert!(options.all_with_binary_name.is_none());
    }

    #[test]
    fn options_reject_unknown_checks() {
        let result: Result<VerificationOptions, _> =
            serde_json::from_str(r#"{"all_with_magic": {}}"#);
        assert!(result.is_err());
    }
}
