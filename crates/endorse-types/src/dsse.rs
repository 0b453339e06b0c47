//! Dead Simple Signing Envelope (DSSE) types.
//!
//! Only the envelope shape is modelled here; signatures are carried through
//! untouched and never checked.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STD_ENGINE};
use serde::{Deserialize, Serialize};

/// Payload type of an envelope wrapping an in-toto statement.
pub const IN_TOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// A DSSE envelope holding a base64-encoded payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub payload_type: String,
    pub payload: String,
    pub signatures: Vec<Signature>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    #[serde(default)]
    pub keyid: String,
    pub sig: String,
}

impl Envelope {
    /// Wrap `payload` in an envelope without signatures.
    pub fn unsigned(payload_type: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            payload_type: payload_type.into(),
            payload: BASE64_STD_ENGINE.encode(payload),
            signatures: Vec::new(),
        }
    }

    /// Decode the standard-base64 payload.
    pub fn decode_payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STD_ENGINE.decode(self.payload.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_with_empty_keyid() {
        let json = r#"{"payloadType":"application/vnd.in-toto+json","payload":"dGVzdA==","signatures":[{"sig":"c2ln","keyid":""}]}"#;

        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.payload_type, IN_TOTO_PAYLOAD_TYPE);
        assert_eq!(envelope.signatures[0].keyid, "");
        assert_eq!(envelope.decode_payload().unwrap(), b"test");
    }

    #[test]
    fn missing_keyid_defaults_to_empty() {
        let json = r#"{"payloadType":"x","payload":"","signatures":[{"sig":"c2ln"}]}"#;

        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.signatures[0].keyid.is_empty());
    }

    #[test]
    fn rejects_invalid_base64_payload() {
        let envelope = Envelope {
            payload_type: IN_TOTO_PAYLOAD_TYPE.to_string(),
            payload: "not base64!".to_string(),
            signatures: Vec::new(),
        };

        assert!(envelope.decode_payload().is_err());
    }
}
