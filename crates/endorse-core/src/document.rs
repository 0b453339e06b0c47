//! Parsing of provenance documents into validated in-toto statements.
//!
//! Two encodings are understood: a bare statement, and a DSSE envelope whose
//! payload is a statement. Envelope signatures are not checked here.

use endorse_types::dsse::{Envelope, IN_TOTO_PAYLOAD_TYPE};
use endorse_types::intoto::{STATEMENT_INTOTO_V01, STATEMENT_INTOTO_V1, Statement};

use crate::error::DocumentError;

/// Which encoding a provenance document was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Statement,
    DsseEnvelope,
}

/// An in-toto statement whose envelope fields have been checked. The
/// predicate is kept as raw JSON until it is mapped by predicate type.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedProvenance {
    statement: Statement,
    format: DocumentFormat,
}

impl ValidatedProvenance {
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn predicate_type(&self) -> &str {
        &self.statement.predicate_type
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Parse `bytes` as a bare in-toto statement.
pub fn parse_statement_data(bytes: &[u8]) -> Result<ValidatedProvenance, DocumentError> {
    let statement = validate_statement(bytes)?;
    Ok(ValidatedProvenance {
        statement,
        format: DocumentFormat::Statement,
    })
}

/// Parse `bytes` as a DSSE envelope carrying an in-toto statement.
pub fn parse_envelope(bytes: &[u8]) -> Result<ValidatedProvenance, DocumentError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.payload_type != IN_TOTO_PAYLOAD_TYPE {
        return Err(DocumentError::UnsupportedPayloadType(envelope.payload_type));
    }

    let payload = envelope.decode_payload()?;
    let statement =
        validate_statement(&payload).map_err(|err| DocumentError::Payload(Box::new(err)))?;
    Ok(ValidatedProvenance {
        statement,
        format: DocumentFormat::DsseEnvelope,
    })
}

fn validate_statement(bytes: &[u8]) -> Result<Statement, DocumentError> {
    let statement: Statement = serde_json::from_slice(bytes)?;

    if statement.statement_type != STATEMENT_INTOTO_V01
        && statement.statement_type != STATEMENT_INTOTO_V1
    {
        return Err(DocumentError::UnsupportedStatementType(
            statement.statement_type,
        ));
    }
    if statement.predicate_type.is_empty() {
        return Err(DocumentError::MissingPredicateType);
    }
    if statement.subject.is_empty() {
        return Err(DocumentError::NoSubjects);
    }

    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement_json() -> serde_json::Value {
        json!({
            "_type": STATEMENT_INTOTO_V01,
            "predicateType": "https://slsa.dev/provenance/v0.2",
            "subject": [{"name": "app", "digest": {"sha256": "aa"}}],
            "predicate": {}
        })
    }

    #[test]
    fn parses_bare_statement() {
        let bytes = serde_json::to_vec(&statement_json()).unwrap();
        let validated = parse_statement_data(&bytes).expect("statement");
        assert_eq!(validated.format(), DocumentFormat::Statement);
        assert_eq!(validated.predicate_type(), "https://slsa.dev/provenance/v0.2");
        assert_eq!(validated.statement().subject[0].name, "app");
    }

    #[test]
    fn accepts_v1_statement_type() {
        let mut value = statement_json();
        value["_type"] = json!(STATEMENT_INTOTO_V1);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(parse_statement_data(&bytes).is_ok());
    }

    #[test]
    fn rejects_unknown_statement_type() {
        let mut value = statement_json();
        value["_type"] = json!("https://example.com/Statement/v9");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            parse_statement_data(&bytes),
            Err(DocumentError::UnsupportedStatementType(_))
        ));
    }

    #[test]
    fn rejects_statement_without_subjects() {
        let mut value = statement_json();
        value["subject"] = json!([]);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            parse_statement_data(&bytes),
            Err(DocumentError::NoSubjects)
        ));
    }

    #[test]
    fn envelope_is_not_a_statement() {
        let payload = serde_json::to_vec(&statement_json()).unwrap();
        let envelope = Envelope::unsigned(IN_TOTO_PAYLOAD_TYPE, &payload);
        let bytes = serde_json::to_vec(&envelope).unwrap();

        assert!(matches!(
            parse_statement_data(&bytes),
            Err(DocumentError::Json(_))
        ));
        let validated = parse_envelope(&bytes).expect("envelope");
        assert_eq!(validated.format(), DocumentFormat::DsseEnvelope);
        assert_eq!(validated.statement().subject[0].name, "app");
    }

    #[test]
    fn envelope_with_foreign_payload_type_is_rejected() {
        let payload = serde_json::to_vec(&statement_json()).unwrap();
        let envelope = Envelope::unsigned("application/octet-stream", &payload);
        let bytes = serde_json::to_vec(&envelope).unwrap();

        assert!(matches!(
            parse_envelope(&bytes),
            Err(DocumentError::UnsupportedPayloadType(_))
        ));
    }

    #[test]
    fn envelope_payload_must_be_a_statement() {
        let envelope = Envelope::unsigned(IN_TOTO_PAYLOAD_TYPE, b"{\"hello\": 1}");
        let bytes = serde_json::to_vec(&envelope).unwrap();

        assert!(matches!(
            parse_envelope(&bytes),
            Err(DocumentError::Payload(_))
        ));
    }
}
