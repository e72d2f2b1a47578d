//! OpenPGP keyrings and detached signature verification.
//!
//! A [`Keyring`] is the parsed form of one armored (or base64-wrapped binary)
//! public key block. It may hold several certificates; verification succeeds
//! when any of them produced the signature.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sequoia_openpgp as openpgp;
use serde::{Deserialize, Serialize};

use openpgp::cert::{Cert, CertParser};
use openpgp::parse::stream::{
    DetachedVerifierBuilder, GoodChecksum, MessageLayer, MessageStructure, VerificationHelper,
};
use openpgp::parse::Parse;
use openpgp::policy::{Policy, StandardPolicy};
use openpgp::{Fingerprint, KeyHandle};

use crate::error::KeyringError;
use crate::signature::format_key_id;

/// Identity of the certificate that produced a verified signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    /// Primary key id (16 uppercase hex characters).
    pub key_id: String,

    /// Primary key fingerprint, standard base64 of the fingerprint bytes.
    pub fingerprint: String,

    /// Primary user id of the certificate, empty if it has none.
    pub user_id: String,
}

/// A set of OpenPGP certificates parsed from one key block.
#[derive(Debug, Clone)]
pub struct Keyring {
    certs: Vec<Cert>,
}

impl Keyring {
    /// Parse an ASCII-armored public key block.
    pub fn from_armored(text: &str) -> Result<Self, KeyringError> {
        Self::from_bytes(text.as_bytes())
    }

    /// Parse a base64-encoded binary transferable public key.
    ///
    /// Line breaks inside the encoded text are ignored.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyringError> {
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64
            .decode(compact)
            .map_err(|e| KeyringError::Decode(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse armored or binary key material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyringError> {
        let certs = CertParser::from_bytes(bytes)
            .map_err(|e| KeyringError::Parse(e.to_string()))?
            .collect::<openpgp::Result<Vec<Cert>>>()
            .map_err(|e| KeyringError::Parse(e.to_string()))?;

        if certs.is_empty() {
            return Err(KeyringError::Empty);
        }

        Ok(Self { certs })
    }

    /// Number of certificates in the keyring.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Primary key ids of every certificate, in keyring order.
    pub fn key_ids(&self) -> Vec<String> {
        self.certs.iter().map(primary_key_id).collect()
    }

    /// Check that `signature` (armored, detached) covers `payload` and was
    /// produced by a key in this keyring.
    pub fn verify_detached(
        &self,
        payload: &[u8],
        signature: &[u8],
    ) -> Result<SignerIdentity, KeyringError> {
        let policy = StandardPolicy::new();
        let helper = KeyringHelper {
            certs: &self.certs,
            signer: None,
        };

        let mut verifier = DetachedVerifierBuilder::from_bytes(signature)
            .map_err(verify_error)?
            .with_policy(&policy, None, helper)
            .map_err(verify_error)?;
        verifier.verify_bytes(payload).map_err(verify_error)?;

        let fingerprint = verifier
            .into_helper()
            .signer
            .ok_or_else(|| KeyringError::Verify("no valid signature from keyring".to_string()))?;

        self.identity(&fingerprint, &policy)
    }

    fn identity(
        &self,
        fingerprint: &Fingerprint,
        policy: &dyn Policy,
    ) -> Result<SignerIdentity, KeyringError> {
        let cert = self
            .certs
            .iter()
            .find(|cert| &cert.fingerprint() == fingerprint)
            .ok_or_else(|| KeyringError::Verify(format!("unknown signer {}", fingerprint)))?;

        let user_id = cert
            .with_policy(policy, None)
            .ok()
            .and_then(|valid| {
                valid
                    .primary_userid()
                    .ok()
                    .map(|uid| String::from_utf8_lossy(uid.userid().value()).into_owned())
            })
            .unwrap_or_default();

        Ok(SignerIdentity {
            key_id: primary_key_id(cert),
            fingerprint: BASE64.encode(fingerprint.as_bytes()),
            user_id,
        })
    }
}

fn primary_key_id(cert: &Cert) -> String {
    let key_id = cert.keyid();
    format_key_id(&key_id).unwrap_or_else(|| key_id.to_hex())
}

fn verify_error(err: anyhow::Error) -> KeyringError {
    KeyringError::Verify(err.to_string())
}

/// Hands the keyring to the verifier and records which certificate produced
/// the first good signature.
struct KeyringHelper<'a> {
    certs: &'a [Cert],
    signer: Option<Fingerprint>,
}

impl VerificationHelper for KeyringHelper<'_> {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
        Ok(self.certs.to_vec())
    }

    fn check(&mut self, structure: MessageStructure<'_>) -> openpgp::Result<()> {
        for layer in structure.into_iter() {
            if let MessageLayer::SignatureGroup { results } = layer {
                for result in results {
                    if let Ok(GoodChecksum { ka, .. }) = result {
                        self.signer = Some(ka.cert().fingerprint());
                        return Ok(());
                    }
                }
            }
        }

        Err(anyhow::anyhow!("no valid signature from keyring"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{armored_public_key, generate_cert, sign_detached};

    #[test]
    fn test_parse_armored_key() {
        let cert = generate_cert("Alice <alice@example.com>");
        let keyring = Keyring::from_armored(&armored_public_key(&cert)).unwrap();
        assert_eq!(keyring.len(), 1);
        assert_eq!(keyring.key_ids()[0].len(), 16);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(Keyring::from_armored("not a key").is_err());
        assert!(matches!(
            Keyring::from_base64("%%%"),
            Err(KeyringError::Decode(_))
        ));
    }

    #[test]
    fn test_base64_binary_key_with_line_breaks() {
        let cert = generate_cert("Bob <bob@example.com>");
        let encoded = crate::test_support::base64_public_key(&cert);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(64)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let keyring = Keyring::from_base64(&wrapped).unwrap();
        assert_eq!(keyring.len(), 1);
    }

    #[test]
    fn test_verify_reports_signer() {
        let cert = generate_cert("Alice <alice@example.com>");
        let payload = b"tree abc\n\nmessage\n";
        let signature = sign_detached(&cert, payload);

        let keyring = Keyring::from_armored(&armored_public_key(&cert)).unwrap();
        let signer = keyring
            .verify_detached(payload, signature.as_bytes())
            .unwrap();

        assert_eq!(signer.key_id, keyring.key_ids()[0]);
        assert_eq!(signer.user_id, "Alice <alice@example.com>");
        assert_eq!(
            signer.fingerprint,
            BASE64.encode(cert.fingerprint().as_bytes())
        );
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let cert = generate_cert("Alice <alice@example.com>");
        let signature = sign_detached(&cert, b"original payload");

        let keyring = Keyring::from_armored(&armored_public_key(&cert)).unwrap();
        let result = keyring.verify_detached(b"original payloaD", signature.as_bytes());
        assert!(matches!(result, Err(KeyringError::Verify(_))));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let signer = generate_cert("Alice <alice@example.com>");
        let other = generate_cert("Mallory <mallory@example.com>");
        let signature = sign_detached(&signer, b"payload");

        let keyring = Keyring::from_armored(&armored_public_key(&other)).unwrap();
        assert!(keyring
            .verify_detached(b"payload", signature.as_bytes())
            .is_err());
    }
}
