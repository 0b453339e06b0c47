use chrono::{DateTime, Utc};
use endorse_types::claims::{
    CLAIM_V1, ClaimEvidence, ClaimPredicate, ClaimValidity, ENDORSEMENT_V2,
    EndorsementStatement, PROVENANCE_ROLE, VerifiedProvenanceSet,
};
use endorse_types::intoto::{DigestSet, STATEMENT_INTOTO_V01, Statement, Subject};

/// Builds the statement issued for a verified set of provenances.
pub trait ClaimIssuer {
    type Statement;

    fn issue(&self, validity: &ClaimValidity, verified: VerifiedProvenanceSet) -> Self::Statement;
}

/// Issues endorsement claims as in-toto v0.1 statements.
#[derive(Clone, Copy, Debug, Default)]
pub struct EndorsementIssuer {
    issued_on: Option<DateTime<Utc>>,
}

impl EndorsementIssuer {
    /// Issuer that stamps every claim with `issued_on` instead of the
    /// current time.
    pub fn issued_on(issued_on: DateTime<Utc>) -> Self {
        Self {
            issued_on: Some(issued_on),
        }
    }
}

impl ClaimIssuer for EndorsementIssuer {
    type Statement = EndorsementStatement;

    fn issue(
        &self,
        validity: &ClaimValidity,
        verified: VerifiedProvenanceSet,
    ) -> EndorsementStatement {
        let evidence = verified
            .provenances
            .into_iter()
            .map(|provenance| ClaimEvidence {
                role: PROVENANCE_ROLE.to_string(),
                uri: provenance.uri,
                digest: DigestSet::from([("sha256".to_string(), provenance.sha256_digest)]),
            })
            .collect();

        Statement {
            statement_type: STATEMENT_INTOTO_V01.to_string(),
            predicate_type: CLAIM_V1.to_string(),
            subject: vec![Subject {
                name: verified.binary_name,
                digest: verified.digests,
            }],
            predicate: ClaimPredicate {
                claim_type: ENDORSEMENT_V2.to_string(),
                issued_on: self.issued_on.unwrap_or_else(Utc::now),
                validity: validity.clone(),
                evidence,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use endorse_types::claims::ProvenanceData;

    #[test]
    fn endorsement_records_subject_validity_and_evidence() {
        let issued_on = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let validity = ClaimValidity::new(issued_on, Duration::days(90)).unwrap();
        let digests = DigestSet::from([("sha2-256".to_string(), "d0".to_string())]);
        let verified = VerifiedProvenanceSet {
            digests: digests.clone(),
            binary_name: "app".into(),
            provenances: vec![ProvenanceData {
                uri: "https://example.com/p.json".into(),
                sha256_digest: "e1".into(),
            }],
        };

        let statement = EndorsementIssuer::issued_on(issued_on).issue(&validity, verified);

        assert_eq!(statement.statement_type, STATEMENT_INTOTO_V01);
        assert_eq!(statement.predicate_type, CLAIM_V1);
        assert_eq!(statement.subject[0].name, "app");
        assert_eq!(statement.subject[0].digest, digests);
        assert_eq!(statement.predicate.claim_type, ENDORSEMENT_V2);
        assert_eq!(statement.predicate.issued_on, issued_on);
        assert_eq!(statement.predicate.validity, validity);
        assert_eq!(statement.predicate.evidence.len(), 1);
        assert_eq!(statement.predicate.evidence[0].role, PROVENANCE_ROLE);
        assert_eq!(
            statement.predicate.evidence[0].digest.get("sha256"),
            Some(&"e1".to_string())
        );

        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json["predicate"]["claimType"], ENDORSEMENT_V2);
        assert!(json["predicate"]["validity"]["notAfter"].is_string());
    }
}
