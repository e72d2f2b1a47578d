//! Error types for the authority client.

use commit_trust_core::TrustError;

/// Longest response body kept in an error.
const MAX_BODY_EXCERPT: usize = 512;

/// Authority client errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The token was rejected.
    #[error("unauthorized: HTTP {status}: {body}")]
    Unauthorized { status: u16, body: String },

    /// Network error or timeout.
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-200 response.
    #[error("bad response: HTTP {status}: {body}")]
    BadResponse { status: u16, body: String },

    /// The response body is not a valid authorization.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl AuthorityError {
    /// Build the error for a non-200 status.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let body = excerpt(body);
        match status {
            401 | 403 => Self::Unauthorized { status, body },
            _ => Self::BadResponse { status, body },
        }
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_EXCERPT {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
    short.push_str("...");
    short
}

impl From<reqwest::Error> for AuthorityError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

impl From<AuthorityError> for TrustError {
    fn from(err: AuthorityError) -> Self {
        TrustError::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for authority operations.
pub type AuthorityResult<T> = Result<T, AuthorityError>;
