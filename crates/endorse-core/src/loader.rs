use endorse_types::claims::ProvenanceData;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::cancel::Cancellation;
use crate::document::{ValidatedProvenance, parse_envelope, parse_statement_data};
use crate::error::LoadError;
use crate::fetch::Fetcher;
use crate::model::{ProvenanceIR, from_validated_provenance};

/// A provenance in canonical form together with where it was loaded from.
///
/// For a provenance wrapped in a DSSE envelope, the source metadata
/// describes the envelope document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedProvenance {
    provenance: ProvenanceIR,
    source_metadata: ProvenanceData,
}

impl ParsedProvenance {
    pub fn new(provenance: ProvenanceIR, source_metadata: ProvenanceData) -> Self {
        Self {
            provenance,
            source_metadata,
        }
    }

    pub fn provenance(&self) -> &ProvenanceIR {
        &self.provenance
    }

    pub fn source_metadata(&self) -> &ProvenanceData {
        &self.source_metadata
    }
}

/// Fetches provenance documents and normalizes them into
/// [`ParsedProvenance`] values.
#[derive(Clone, Debug)]
pub struct ProvenanceLoader {
    fetcher: Fetcher,
}

impl ProvenanceLoader {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Load the provenance behind `uri`, a local `file` URI or an HTTP(S)
    /// endpoint.
    #[instrument(skip(self, cancel))]
    pub fn load_provenance(
        &self,
        uri: &str,
        cancel: &Cancellation,
    ) -> Result<ParsedProvenance, LoadError> {
        let bytes = self.fetcher.fetch_bytes(uri, cancel)?;
        parse_provenance(uri, &bytes)
    }

    /// Load every URI in order. Stops at the first failure, which is
    /// returned as is; on success the result lines up index for index with
    /// `uris`.
    pub fn load_provenances<S: AsRef<str>>(
        &self,
        uris: &[S],
        cancel: &Cancellation,
    ) -> Result<Vec<ParsedProvenance>, LoadError> {
        let mut provenances = Vec::with_capacity(uris.len());
        for uri in uris {
            provenances.push(self.load_provenance(uri.as_ref(), cancel)?);
        }
        Ok(provenances)
    }
}

/// Normalize already fetched `bytes`, recording `uri` as their source.
pub fn parse_provenance(uri: &str, bytes: &[u8]) -> Result<ParsedProvenance, LoadError> {
    let validated = parse_validated(uri, bytes)?;
    let provenance =
        from_validated_provenance(&validated).map_err(|err| LoadError::mapping(uri, err))?;

    Ok(ParsedProvenance {
        provenance,
        source_metadata: ProvenanceData {
            uri: uri.to_string(),
            sha256_digest: compute_digest(bytes),
        },
    })
}

fn parse_validated(uri: &str, bytes: &[u8]) -> Result<ValidatedProvenance, LoadError> {
    let statement_err = match parse_statement_data(bytes) {
        Ok(validated) => return Ok(validated),
        Err(err) => err,
    };
    tracing::debug!(error = %statement_err, "not a bare statement, trying DSSE envelope");

    parse_envelope(bytes).map_err(|envelope_err| {
        tracing::warn!(uri, "provenance is neither a statement nor a DSSE envelope");
        LoadError::NeitherFormatParsed {
            uri: uri.to_string(),
            statement: statement_err,
            envelope: envelope_err,
        }
    })
}

fn compute_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hasher.finalize();
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        assert_eq!(
            compute_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn garbage_reports_both_causes() {
        let err = parse_provenance("file:///tmp/p.json", b"not json").expect_err("garbage");
        match &err {
            LoadError::NeitherFormatParsed {
                uri,
                statement,
                envelope,
            } => {
                assert_eq!(uri, "file:///tmp/p.json");
                let message = err.to_string();
                assert!(message.contains(&statement.to_string()));
                assert!(message.contains(&envelope.to_string()));
                assert!(message.contains("in-toto statement"));
                assert!(message.contains("DSSE envelope"));
            }
            other => panic!("expected both formats to fail, got {other:?}"),
        }
    }
}
