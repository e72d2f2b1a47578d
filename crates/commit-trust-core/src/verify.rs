//! Trust checks that run without the remote authority, plus verification of
//! the key the authority hands back.

use crate::allowlist::ResolvedKey;
use crate::commit::CommitRecord;
use crate::error::{TrustError, TrustResult};
use crate::keyring::{Keyring, SignerIdentity};

/// Result of trying the allowlisted third-party keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThirdPartyCheck {
    /// A keyring validated the signature.
    Verified {
        /// Index of the allowlist entry that matched.
        index: usize,
        signer: SignerIdentity,
    },
    /// The commit is signed but no keyring validated it.
    NoMatch,
    /// The commit carries no signature.
    Unsigned,
}

/// Case-insensitive match of `committer_email` against the allowlist.
pub fn verify_by_email(committer_email: &str, allowed: &[String]) -> bool {
    let committer = committer_email.to_lowercase();
    allowed
        .iter()
        .any(|email| email.to_lowercase() == committer)
}

/// Try each keyring in order and stop at the first one that validates.
pub fn verify_by_third_party_keys(commit: &CommitRecord, keys: &[ResolvedKey]) -> ThirdPartyCheck {
    let Some(signature) = commit.signature_bytes() else {
        return ThirdPartyCheck::Unsigned;
    };

    for key in keys {
        match key
            .keyring
            .verify_detached(&commit.unsigned_payload, signature)
        {
            Ok(signer) => {
                return ThirdPartyCheck::Verified {
                    index: key.index,
                    signer,
                }
            }
            Err(e) => {
                tracing::debug!(index = key.index, error = %e, "third-party key did not verify");
            }
        }
    }

    ThirdPartyCheck::NoMatch
}

/// Verify `signature` over `payload` with a base64 transferable public key.
///
/// Every failure, including an undecodable key, is a signature mismatch.
pub fn verify_signature_by_key(
    base64_key: &str,
    signature: &[u8],
    payload: &[u8],
) -> TrustResult<SignerIdentity> {
    let keyring = Keyring::from_base64(base64_key).map_err(|e| TrustError::SignatureMismatch {
        reason: format!("authorized key is unusable: {}", e),
    })?;

    keyring
        .verify_detached(payload, signature)
        .map_err(|e| TrustError::SignatureMismatch {
            reason: e.to_string(),
        })
}
