//! Commit records and the commit source seam.

use bstr::{BStr, ByteSlice};
use chrono::{DateTime, FixedOffset, TimeZone};
use gix_object::{CommitRef, WriteTo};

use crate::error::{TrustError, TrustResult};

/// Header carrying the armored commit signature.
const SIGNATURE_HEADER: &[u8] = b"gpgsig";

/// Author or committer of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// A commit as fetched from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Commit hash (hex).
    pub hash: String,

    /// Tree hash (hex).
    pub tree_hash: String,

    /// Parent hashes, in commit order.
    pub parent_hashes: Vec<String>,

    pub author: Identity,

    pub committer: Identity,

    pub message: String,

    /// Armored detached signature, if the commit is signed.
    pub signature: Option<String>,

    /// Canonical encoding of the commit without its signature header.
    /// This is the exact payload the signature covers.
    pub unsigned_payload: Vec<u8>,
}

impl CommitRecord {
    /// Decode a raw git commit object (the output of `git cat-file commit`).
    pub fn from_raw_object(hash: &str, raw: &[u8]) -> TrustResult<Self> {
        let mut commit = CommitRef::from_bytes(raw).map_err(|e| TrustError::CommitAccess {
            message: format!("failed to decode commit {}: {}", hash, e),
        })?;

        let signature = commit
            .extra_headers
            .iter()
            .find(|(k, _)| k.as_bytes() == SIGNATURE_HEADER)
            .map(|(_, v)| v.to_str_lossy().into_owned());

        commit
            .extra_headers
            .retain(|(k, _)| k.as_bytes() != SIGNATURE_HEADER);

        let mut unsigned_payload = Vec::new();
        commit
            .write_to(&mut unsigned_payload)
            .map_err(|e| TrustError::CommitAccess {
                message: format!("failed to encode commit {}: {}", hash, e),
            })?;

        Ok(Self {
            hash: hash.to_string(),
            tree_hash: commit.tree.to_string(),
            parent_hashes: commit.parents.iter().map(|p| p.to_string()).collect(),
            author: identity(
                commit.author.name,
                commit.author.email,
                commit.author.time.seconds,
                commit.author.time.offset,
            )?,
            committer: identity(
                commit.committer.name,
                commit.committer.email,
                commit.committer.time.seconds,
                commit.committer.time.offset,
            )?,
            message: commit.message.to_str_lossy().into_owned(),
            signature: signature.filter(|s| !s.trim().is_empty()),
            unsigned_payload,
        })
    }

    /// Whether a signature is attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signature bytes, if any.
    pub fn signature_bytes(&self) -> Option<&[u8]> {
        self.signature.as_deref().map(str::as_bytes)
    }
}

fn identity(name: &BStr, email: &BStr, seconds: i64, offset: i32) -> TrustResult<Identity> {
    let zone = FixedOffset::east_opt(offset).ok_or_else(|| TrustError::CommitAccess {
        message: format!("invalid timezone offset: {}", offset),
    })?;
    let timestamp = zone
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| TrustError::CommitAccess {
            message: format!("invalid timestamp: {}", seconds),
        })?;

    Ok(Identity {
        name: name.to_str_lossy().into_owned(),
        email: email.to_str_lossy().into_owned(),
        timestamp,
    })
}

/// Retrieves commits by reference.
pub trait CommitSource {
    /// Resolve `reference` and return the commit it points at.
    fn get_commit(&self, reference: &str) -> TrustResult<CommitRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNED: &[u8] = b"tree 1b99d17009234a86e65e830c7a7ae6f7d182b8ef
parent d45e77738bda2d17b10f87d05167a12fa5be8d63
author Dev One <dev@example.com> 1673558348 +0100
committer Dev One <dev@example.com> 1673912904 +0100
gpgsig -----BEGIN PGP SIGNATURE-----
\x20
 iQIzBAABCgAdFiEE4kC1fixGMLp2ji8m/BtUfI2BcsgFAmPF4koACgkQ/BtUfI2B
 -----END PGP SIGNATURE-----

Add feature
";

    const UNSIGNED: &[u8] = b"tree 1b99d17009234a86e65e830c7a7ae6f7d182b8ef
parent d45e77738bda2d17b10f87d05167a12fa5be8d63
author Dev One <dev@example.com> 1673558348 +0100
committer Dev One <dev@example.com> 1673912904 +0100

Add feature
";

    #[test]
    fn test_signature_header_removed_from_payload() {
        let commit = CommitRecord::from_raw_object("abc123", SIGNED).unwrap();

        assert_eq!(commit.unsigned_payload, UNSIGNED);
        let signature = commit.signature.as_deref().unwrap();
        assert!(signature.starts_with("-----BEGIN PGP SIGNATURE-----"));
        assert!(signature.trim_end().ends_with("-----END PGP SIGNATURE-----"));
    }

    #[test]
    fn test_fields_decoded() {
        let commit = CommitRecord::from_raw_object("abc123", SIGNED).unwrap();

        assert_eq!(commit.hash, "abc123");
        assert_eq!(commit.tree_hash, "1b99d17009234a86e65e830c7a7ae6f7d182b8ef");
        assert_eq!(
            commit.parent_hashes,
            vec!["d45e77738bda2d17b10f87d05167a12fa5be8d63".to_string()]
        );
        assert_eq!(commit.committer.email, "dev@example.com");
        assert_eq!(commit.committer.name, "Dev One");
        assert_eq!(commit.committer.timestamp.timestamp(), 1673912904);
        assert_eq!(commit.committer.timestamp.offset().local_minus_utc(), 3600);
        assert_eq!(commit.message, "Add feature\n");
    }

    #[test]
    fn test_unsigned_commit() {
        let commit = CommitRecord::from_raw_object("abc123", UNSIGNED).unwrap();

        assert!(!commit.is_signed());
        assert!(commit.signature_bytes().is_none());
        assert_eq!(commit.unsigned_payload, UNSIGNED);
    }

    #[test]
    fn test_garbage_is_commit_access_error() {
        let result = CommitRecord::from_raw_object("abc123", b"not a commit");
        assert!(matches!(result, Err(TrustError::CommitAccess { .. })));
    }
}
