//! Commit trust decisions.
//!
//! Given a commit and an allowlist, [`DecisionEngine`] decides whether the
//! commit is trusted. Sources are tried in a fixed order and the first one
//! that accepts the commit wins:
//!
//! 1. the committer email is allowlisted,
//! 2. an allowlisted third-party key produced the signature,
//! 3. the remote authority authorizes the signing key and the signature
//!    verifies against the key it returns.
//!
//! Fetching commits and talking to the authority happen behind
//! [`CommitSource`] and [`AuthorizationProvider`].

pub mod allowlist;
pub mod authority;
pub mod commit;
pub mod engine;
pub mod error;
pub mod events;
pub mod keyring;
pub mod outcome;
pub mod signature;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use allowlist::{Allowlist, EffectiveAllowlist, EmailEntry, ResolvedKey, ThirdPartyKeyEntry};
pub use authority::{Authorization, AuthorizationProvider, CandidateKey};
pub use commit::{CommitRecord, CommitSource, Identity};
pub use engine::DecisionEngine;
pub use error::{KeyringError, SignatureParseError, TrustError, TrustResult};
pub use events::{MemoryEmitter, NullEmitter, PipelineEmitter, PipelineEvent, Stage, TracingEmitter};
pub use keyring::{Keyring, SignerIdentity};
pub use outcome::{
    Actor, BiManagedKeyDetails, CommitSnapshot, Outcome, OutcomeError, ThirdPartyKeyDetails,
    Verdict, VerificationDetails, OUTCOME_VERSION,
};
pub use signature::SignatureEnvelope;
