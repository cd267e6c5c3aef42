use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::verb::VerbRef;

/// The `Call` request: a verb identity and the raw request bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    /// The verb to invoke.
    pub verb: VerbRef,
    /// The request payload, sent verbatim.
    #[serde(with = "base64_bytes")]
    pub body: Bytes,
}

impl CallRequest {
    /// Creates a request from the editor text, without validating it.
    pub fn new(verb: VerbRef, text: impl Into<String>) -> Self {
        Self {
            verb,
            body: Bytes::from(text.into()),
        }
    }
}

/// The `Call` response: exactly one of a body or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallResponse {
    /// The verb succeeded, with its encoded response.
    Body(#[serde(with = "base64_bytes")] Bytes),
    /// The verb failed.
    Error(CallError),
}

/// An error reported by the remote verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallError {
    /// The message, displayed as-is.
    pub message: String,
    /// Remote stack trace, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Error body of a Connect call answered with a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct ConnectError {
    #[serde(default)]
    pub(super) code: String,
    #[serde(default)]
    pub(super) message: String,
}

/// Protobuf JSON encodes `bytes` as base64, padded, standard or URL-safe alphabet.
mod base64_bytes {
    use super::*;

    pub(super) fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(&text)
            .or_else(|_| URL_SAFE.decode(&text))
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_call_request() {
        let request = CallRequest::new(VerbRef::new("echo", "echo"), r#"{"name":"sam"}"#);

        let json = serde_json::to_string(&request).expect("serialize");

        insta::assert_snapshot!(json, @r#"{"verb":{"module":"echo","name":"echo"},"body":"eyJuYW1lIjoic2FtIn0="}"#);
    }

    #[test]
    fn should_omit_absent_identity_parts() {
        let verb = VerbRef {
            module: None,
            name: Some("echo".to_string()),
        };
        let request = CallRequest::new(verb, "");

        let json = serde_json::to_string(&request).expect("serialize");

        insta::assert_snapshot!(json, @r#"{"verb":{"name":"echo"},"body":""}"#);
    }

    #[test]
    fn should_deserialize_body_response() {
        let json = r#"{"body":"eyJtZXNzYWdlIjoiSGVsbG8sIHNhbSEifQ=="}"#;

        let response = serde_json::from_str::<CallResponse>(json).expect("deserialize");

        assert_eq!(
            response,
            CallResponse::Body(Bytes::from_static(br#"{"message":"Hello, sam!"}"#))
        );
    }

    #[test]
    fn should_deserialize_error_response() {
        let json = r#"{"error":{"message":"database unavailable"}}"#;

        let response = serde_json::from_str::<CallResponse>(json).expect("deserialize");

        assert_eq!(
            response,
            CallResponse::Error(CallError {
                message: "database unavailable".to_string(),
                stack: None,
            })
        );
    }

    #[test]
    fn should_reject_response_without_variant() {
        for json in [r"{}", r#"{"other":1}"#, r#"{"body":"not base64 !"}"#] {
            let result = serde_json::from_str::<CallResponse>(json);
            assert!(result.is_err(), "{json} should be rejected");
        }
    }

    #[test]
    fn should_accept_url_safe_base64() {
        // `>>>` is `Pj4-` in the URL-safe alphabet
        let response = serde_json::from_str::<CallResponse>(r#"{"body":"Pj4-"}"#).expect("deserialize");

        assert_eq!(response, CallResponse::Body(Bytes::from_static(b">>>")));
    }
}
