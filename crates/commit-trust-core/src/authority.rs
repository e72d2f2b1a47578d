//! Contract with the remote key authority.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TrustResult;

/// The authority's verdict for one key id and committer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Absent means not authorized.
    #[serde(default)]
    pub authorized: bool,

    /// Human-readable explanation, surfaced verbatim on denial.
    #[serde(default)]
    pub message: String,

    /// The authority's copy of the signing key.
    #[serde(default)]
    pub pgp_key: CandidateKey,
}

/// A public key as held by the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateKey {
    #[serde(default)]
    pub id: String,

    /// Base64 of the binary transferable public key.
    #[serde(default)]
    pub base64_key: String,
}

impl Authorization {
    pub fn granted(key_id: impl Into<String>, base64_key: impl Into<String>) -> Self {
        Self {
            authorized: true,
            message: String::new(),
            pgp_key: CandidateKey {
                id: key_id.into(),
                base64_key: base64_key.into(),
            },
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            authorized: false,
            message: message.into(),
            pgp_key: CandidateKey::default(),
        }
    }
}

/// Answers whether a key may sign commits for a committer.
///
/// Implementations perform exactly one request per call and never retry.
/// Transport failures are reported as [`crate::TrustError::Transport`].
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    async fn get_authorization(
        &self,
        issuer_key_id: &str,
        committer_email: &str,
    ) -> TrustResult<Authorization>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_response() {
        let json = r#"{
            "authorized": true,
            "message": "ok",
            "pgp_key": {"id": "FC1B547C8D8172C8", "base64_key": "AAAA"}
        }"#;

        let auth: Authorization = serde_json::from_str(json).unwrap();
        assert_eq!(auth, {
            let mut expected = Authorization::granted("FC1B547C8D8172C8", "AAAA");
            expected.message = "ok".to_string();
            expected
        });
    }

    #[test]
    fn test_decode_denial_without_key() {
        let auth: Authorization =
            serde_json::from_str(r#"{"authorized": false, "message": "revoked"}"#).unwrap();
        assert_eq!(auth, Authorization::denied("revoked"));
    }

    #[test]
    fn test_missing_authorized_is_denial() {
        let auth: Authorization = serde_json::from_str(r#"{"message": "no such key"}"#).unwrap();
        assert!(!auth.authorized);
        assert_eq!(auth, Authorization::denied("no such key"));

        let auth: Authorization = serde_json::from_str("{}").unwrap();
        assert_eq!(auth, Authorization::denied(""));
    }
}
