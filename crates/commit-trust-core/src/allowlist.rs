//! Allowlist configuration and per-repository resolution.
//!
//! ```yaml
//! email_addresses:
//!   - email_address: release-bot@example.com
//!     repositories: [web, api]
//!   - email_address: admin@example.com      # all repositories
//! third_party_keys:
//!   - key: |
//!       -----BEGIN PGP PUBLIC KEY BLOCK-----
//!       ...
//!       -----END PGP PUBLIC KEY BLOCK-----
//!     repositories: [web]
//! ```
//!
//! Entries may also be written as bare strings, which apply to every
//! repository.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TrustError, TrustResult};
use crate::keyring::Keyring;

/// HTML `type=email` grammar.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

const MIN_EMAIL_LEN: usize = 3;
const MAX_EMAIL_LEN: usize = 254;

static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Raw allowlist as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowlist {
    /// Committer emails allowed to bypass signature verification.
    #[serde(default)]
    pub email_addresses: Vec<EmailEntry>,

    /// Armored public keys allowed to sign commits.
    #[serde(default)]
    pub third_party_keys: Vec<ThirdPartyKeyEntry>,
}

/// An allowlisted committer email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EmailEntryRepr")]
pub struct EmailEntry {
    pub email_address: String,

    /// Repositories the entry applies to. Empty means all.
    #[serde(default)]
    pub repositories: BTreeSet<String>,
}

/// An allowlisted third-party public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ThirdPartyKeyRepr")]
pub struct ThirdPartyKeyEntry {
    /// Armored public key block.
    pub key: String,

    /// Repositories the entry applies to. Empty means all.
    #[serde(default)]
    pub repositories: BTreeSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmailEntryRepr {
    Bare(String),
    Scoped {
        email_address: String,
        #[serde(default)]
        repositories: BTreeSet<String>,
    },
}

impl From<EmailEntryRepr> for EmailEntry {
    fn from(repr: EmailEntryRepr) -> Self {
        match repr {
            EmailEntryRepr::Bare(email_address) => Self {
                email_address,
                repositories: BTreeSet::new(),
            },
            EmailEntryRepr::Scoped {
                email_address,
                repositories,
            } => Self {
                email_address,
                repositories,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThirdPartyKeyRepr {
    Bare(String),
    Scoped {
        key: String,
        #[serde(default)]
        repositories: BTreeSet<String>,
    },
}

impl From<ThirdPartyKeyRepr> for ThirdPartyKeyEntry {
    fn from(repr: ThirdPartyKeyRepr) -> Self {
        match repr {
            ThirdPartyKeyRepr::Bare(key) => Self {
                key,
                repositories: BTreeSet::new(),
            },
            ThirdPartyKeyRepr::Scoped { key, repositories } => Self { key, repositories },
        }
    }
}

fn in_scope(repositories: &BTreeSet<String>, repository: &str) -> bool {
    repositories.is_empty() || repositories.contains(repository)
}

impl EmailEntry {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            repositories: BTreeSet::new(),
        }
    }

    /// Restrict the entry to the given repositories.
    pub fn scoped_to<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories = repositories.into_iter().map(Into::into).collect();
        self
    }

    pub fn applies_to(&self, repository: &str) -> bool {
        in_scope(&self.repositories, repository)
    }
}

impl ThirdPartyKeyEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repositories: BTreeSet::new(),
        }
    }

    /// Restrict the entry to the given repositories.
    pub fn scoped_to<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories = repositories.into_iter().map(Into::into).collect();
        self
    }

    pub fn applies_to(&self, repository: &str) -> bool {
        in_scope(&self.repositories, repository)
    }
}

/// A third-party keyring that survived resolution.
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    /// Position of the source entry in `third_party_keys`.
    pub index: usize,
    pub keyring: Keyring,
}

/// The allowlist entries that apply to one repository.
#[derive(Debug, Clone, Default)]
pub struct EffectiveAllowlist {
    pub email_addresses: Vec<String>,
    pub third_party_keys: Vec<ResolvedKey>,
    /// Non-fatal errors for entries that were dropped.
    pub errors: Vec<TrustError>,
}

impl EffectiveAllowlist {
    pub fn is_empty(&self) -> bool {
        self.email_addresses.is_empty() && self.third_party_keys.is_empty()
    }
}

impl Allowlist {
    /// Load an allowlist from a YAML file.
    pub fn from_file(path: &Path) -> TrustResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| TrustError::AllowlistLoad {
            message: format!(
                "failed to read allowlist configuration file at '{}': {}",
                path.display(),
                e
            ),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse an allowlist from a YAML string. An empty document is an empty
    /// allowlist.
    pub fn from_yaml(yaml: &str) -> TrustResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| TrustError::AllowlistLoad {
            message: format!("failed to parse allowlist configuration: {}", e),
        })
    }

    /// Keep the entries that apply to `repository` and drop malformed ones.
    ///
    /// Resolution never stops at a bad entry: each one becomes a non-fatal
    /// error in the returned [`EffectiveAllowlist`].
    pub fn resolve(&self, repository: &str) -> EffectiveAllowlist {
        let mut effective = EffectiveAllowlist::default();

        for (index, entry) in self.email_addresses.iter().enumerate() {
            if !entry.applies_to(repository) {
                continue;
            }
            match validate_email(&entry.email_address) {
                Ok(()) => effective
                    .email_addresses
                    .push(entry.email_address.clone()),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping allowlist email");
                    effective.errors.push(TrustError::AllowlistEntry {
                        message: format!("email_addresses[{}]: {}", index, e),
                    });
                }
            }
        }

        for (index, entry) in self.third_party_keys.iter().enumerate() {
            if !entry.applies_to(repository) {
                continue;
            }
            match Keyring::from_armored(&entry.key) {
                Ok(keyring) => effective.third_party_keys.push(ResolvedKey { index, keyring }),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping allowlist key");
                    effective.errors.push(TrustError::AllowlistEntry {
                        message: format!("third_party_keys[{}]: {}", index, e),
                    });
                }
            }
        }

        effective
    }
}

/// Check that `email` is a syntactically valid address.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || format!("invalid email address format: {:?}", email);

    if email.len() < MIN_EMAIL_LEN || email.len() > MAX_EMAIL_LEN {
        return Err(invalid());
    }

    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .ok_or_else(|| "email pattern failed to compile".to_string())?;

    if !regex.is_match(email) {
        return Err(invalid());
    }
    Ok(())
}
