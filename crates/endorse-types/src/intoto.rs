use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Statement type URI for in-toto v0.1 statements.
pub const STATEMENT_INTOTO_V01: &str = "https://in-toto.io/Statement/v0.1";
/// Statement type URI for in-toto v1 statements.
pub const STATEMENT_INTOTO_V1: &str = "https://in-toto.io/Statement/v1";

/// Digest algorithm name used by endorsement callers for SHA-256.
pub const SHA2_256: &str = "sha2-256";

/// Map from algorithm name to lowercase hex-encoded digest.
pub type DigestSet = BTreeMap<String, String>;

/// A software artifact identified by its name and digests.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub digest: DigestSet,
}

/// A statement binding a predicate to one or more subjects.
///
/// The predicate defaults to raw JSON so that documents can be parsed before
/// their predicate type is known.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Statement<P = Value> {
    #[serde(rename = "_type")]
    pub statement_type: String,
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    pub subject: Vec<Subject>,
    pub predicate: P,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statement_uses_intoto_field_names() {
        let statement = Statement {
            statement_type: STATEMENT_INTOTO_V01.to_string(),
            predicate_type: "https://slsa.dev/provenance/v0.2".to_string(),
            subject: vec![Subject {
                name: "app".to_string(),
                digest: DigestSet::from([("sha256".to_string(), "ab".to_string())]),
            }],
            predicate: json!({}),
        };

        let value = serde_json::to_value(&statement).unwrap();
        assert_eq!(value["_type"], STATEMENT_INTOTO_V01);
        assert_eq!(value["predicateType"], "https://slsa.dev/provenance/v0.2");
        assert_eq!(value["subject"][0]["digest"]["sha256"], "ab");
    }
}
