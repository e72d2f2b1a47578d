//! Error taxonomy for a verification run.
//!
//! Every fatal error ends the run with a FAIL outcome. The only non-fatal
//! variant is [`TrustError::AllowlistEntry`], which is accumulated while the
//! allowlist is resolved and never changes a PASS result.

/// Errors raised while deciding whether a commit is trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    /// Required configuration is missing or invalid.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The commit could not be read from the repository.
    #[error("failed to get commit: {message}")]
    CommitAccess { message: String },

    /// The allowlist file could not be read or decoded.
    #[error("failed to get allowlist: {message}")]
    AllowlistLoad { message: String },

    /// A single allowlist entry is malformed. Non-fatal.
    #[error("invalid allowlist entry: {message}")]
    AllowlistEntry { message: String },

    /// No bypass applied and the commit carries no signature.
    #[error("commit is not signed")]
    Unsigned,

    /// The attached signature is malformed.
    #[error("failed to parse signature: {0}")]
    SignatureParse(#[from] SignatureParseError),

    /// The remote authority could not be reached or answered badly.
    #[error("failed to get authorization: {message}")]
    Transport { message: String },

    /// The remote authority refused the key. Carries its message verbatim.
    #[error("authorization denied: {message}")]
    AuthorityDenied { message: String },

    /// The signature does not verify against the authorized key.
    #[error("signature verification failed: {reason}")]
    SignatureMismatch { reason: String },
}

impl TrustError {
    /// Whether the error terminates the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AllowlistEntry { .. })
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::CommitAccess { .. } => "commit_access",
            Self::AllowlistLoad { .. } => "allowlist_load",
            Self::AllowlistEntry { .. } => "allowlist_entry",
            Self::Unsigned => "unsigned_commit",
            Self::SignatureParse(_) => "signature_parse",
            Self::Transport { .. } => "transport",
            Self::AuthorityDenied { .. } => "authority_denied",
            Self::SignatureMismatch { .. } => "signature_mismatch",
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            _ => 1,
        }
    }
}

/// Reasons a detached signature envelope is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureParseError {
    #[error("failed to decode armored signature: {0}")]
    Armor(String),

    #[error("failed to read signature packet: {0}")]
    Packet(String),

    #[error("packet is not a signature")]
    NotASignature,

    #[error("signature contains unexpected packets")]
    UnexpectedPackets,

    #[error("signature missing issuer key id subpacket")]
    MissingIssuerKeyId,
}

/// Errors raised while loading OpenPGP key material or checking a signature
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyringError {
    #[error("failed to decode key: {0}")]
    Decode(String),

    #[error("failed to parse key: {0}")]
    Parse(String),

    #[error("key block contains no public keys")]
    Empty,

    #[error("{0}")]
    Verify(String),
}

/// Result type for trust operations.
pub type TrustResult<T> = Result<T, TrustError>;
