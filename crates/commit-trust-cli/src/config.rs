//! Run configuration assembled from flags and environment.

use std::path::PathBuf;

use commit_trust_authority::AuthorityConfig;
use commit_trust_core::TrustError;

use crate::args::Cli;

/// Everything one verification run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub repo_path: PathBuf,
    pub commit_ref: String,
    pub repository: String,
    pub api_token: String,
    pub api_base_url: String,
    pub allowlist_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            repo_path: cli.path.clone(),
            commit_ref: cli.commit_ref.trim().to_string(),
            repository: cli.repository.clone().unwrap_or_default().trim().to_string(),
            api_token: cli.api_token.clone().unwrap_or_default().trim().to_string(),
            api_base_url: cli.api_base_url.trim().to_string(),
            allowlist_path: cli
                .allowlist
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            timeout_secs: cli.timeout_secs,
        }
    }
}

impl RunConfig {
    /// Every problem with the configuration, in field order.
    pub fn validate(&self) -> Vec<TrustError> {
        let mut errors = Vec::new();
        let mut missing = |field: &str| {
            errors.push(TrustError::Config {
                message: format!("missing config field: {}", field),
            })
        };

        if self.repo_path.as_os_str().is_empty() {
            missing("path");
        }
        if self.commit_ref.is_empty() {
            missing("ref");
        }
        if self.api_token.is_empty() {
            missing("api token");
        }
        if self.api_base_url.is_empty() {
            missing("api base url");
        }
        if self.repository.is_empty() {
            missing("repository");
        }

        if self.timeout_secs == 0 {
            errors.push(TrustError::Config {
                message: "timeout must be at least one second".to_string(),
            });
        }
        errors
    }

    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig::default()
            .with_base_url(self.api_base_url.clone())
            .with_token(self.api_token.clone())
            .with_timeout_secs(self.timeout_secs)
    }
}
