//! The terminal result of one verification run.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::commit::{CommitRecord, Identity};
use crate::error::TrustError;

/// Version of the outcome document.
pub const OUTCOME_VERSION: &str = "1";

/// PASS or FAIL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Which trust source accepted the commit.
///
/// Serialized with a `verified_by` tag. Key-based variants nest their fields
/// under `third_party_key` or `bi_managed_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verified_by", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationDetails {
    EmailAddress {
        email_address: String,
    },
    ThirdPartyKey {
        third_party_key: ThirdPartyKeyDetails,
    },
    BiManagedKey {
        bi_managed_key: BiManagedKeyDetails,
    },
}

/// The allowlisted key that produced the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyKeyDetails {
    pub key_id: String,
    pub fingerprint: String,
    pub user_id: String,
}

/// The authority-managed key that produced the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiManagedKeyDetails {
    pub key_id: String,
    pub email_address: String,
}

impl VerificationDetails {
    pub fn third_party_key(
        key_id: impl Into<String>,
        fingerprint: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::ThirdPartyKey {
            third_party_key: ThirdPartyKeyDetails {
                key_id: key_id.into(),
                fingerprint: fingerprint.into(),
                user_id: user_id.into(),
            },
        }
    }

    pub fn bi_managed_key(key_id: impl Into<String>, email_address: impl Into<String>) -> Self {
        Self::BiManagedKey {
            bi_managed_key: BiManagedKeyDetails {
                key_id: key_id.into(),
                email_address: email_address.into(),
            },
        }
    }

    pub fn verified_by(&self) -> &'static str {
        match self {
            Self::EmailAddress { .. } => "EMAIL_ADDRESS",
            Self::ThirdPartyKey { .. } => "THIRD_PARTY_KEY",
            Self::BiManagedKey { .. } => "BI_MANAGED_KEY",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::EmailAddress { email_address } => {
                format!("committer email {} is allowlisted", email_address)
            }
            Self::ThirdPartyKey { third_party_key } => format!(
                "signed by allowlisted third-party key {}",
                third_party_key.key_id
            ),
            Self::BiManagedKey { bi_managed_key } => format!(
                "signed by key {} authorized for {}",
                bi_managed_key.key_id, bi_managed_key.email_address
            ),
        }
    }
}

/// Author or committer as reported in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub email_address: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl From<&Identity> for Actor {
    fn from(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            email_address: identity.email.clone(),
            timestamp: identity.timestamp,
        }
    }
}

/// The commit metadata published with an outcome. Never carries the
/// signature text or the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSnapshot {
    pub commit_hash: String,
    pub tree_hash: String,
    pub parent_hashes: Vec<String>,
    pub author: Actor,
    pub committer: Actor,
    pub signed: bool,
}

impl From<&CommitRecord> for CommitSnapshot {
    fn from(commit: &CommitRecord) -> Self {
        Self {
            commit_hash: commit.hash.clone(),
            tree_hash: commit.tree_hash.clone(),
            parent_hashes: commit
                .parent_hashes
                .iter()
                .filter(|h| !h.is_empty())
                .cloned()
                .collect(),
            author: Actor::from(&commit.author),
            committer: Actor::from(&commit.committer),
            signed: commit.is_signed(),
        }
    }
}

/// One error line in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub desc: String,
}

impl From<&TrustError> for OutcomeError {
    fn from(err: &TrustError) -> Self {
        Self {
            desc: err.to_string(),
        }
    }
}

/// Result of a verification run.
///
/// Built through [`Outcome::pass`] or [`Outcome::fail`] so that a PASS always
/// carries its details and a FAIL always carries at least one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub version: String,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub commit: Option<CommitSnapshot>,
    pub result: Verdict,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verification_details: Option<VerificationDetails>,
    #[serde(default)]
    pub errors: Vec<OutcomeError>,
}

impl Outcome {
    /// A PASS outcome. `warnings` are non-fatal errors gathered along the way.
    pub fn pass(
        repository: &str,
        commit: Option<&CommitRecord>,
        details: VerificationDetails,
        warnings: &[TrustError],
    ) -> Self {
        Self {
            version: OUTCOME_VERSION.to_string(),
            repository: repository.to_string(),
            commit: commit.map(CommitSnapshot::from),
            result: Verdict::Pass,
            desc: details.describe(),
            verification_details: Some(details),
            errors: warnings.iter().map(OutcomeError::from).collect(),
        }
    }

    /// A FAIL outcome ending with `fatal`.
    pub fn fail(
        repository: &str,
        commit: Option<&CommitRecord>,
        prior: &[TrustError],
        fatal: &TrustError,
    ) -> Self {
        let mut errors: Vec<OutcomeError> = prior.iter().map(OutcomeError::from).collect();
        errors.push(OutcomeError::from(fatal));

        Self {
            version: OUTCOME_VERSION.to_string(),
            repository: repository.to_string(),
            commit: commit.map(CommitSnapshot::from),
            result: Verdict::Fail,
            desc: fatal.to_string(),
            verification_details: None,
            errors,
        }
    }

    /// A FAIL outcome for several fatal errors found at once, e.g. every
    /// missing configuration value.
    pub fn fail_all(repository: &str, errors: &[TrustError]) -> Option<Self> {
        let (last, prior) = errors.split_last()?;
        let mut outcome = Self::fail(repository, None, prior, last);
        outcome.desc = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Some(outcome)
    }

    pub fn passed(&self) -> bool {
        self.result == Verdict::Pass
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self.result {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }

    /// Single-line JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
