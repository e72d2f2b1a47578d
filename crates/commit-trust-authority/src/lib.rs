//! Client for the remote key authority.
//!
//! The authority answers one question: may the key with a given id sign
//! commits for a given committer email? [`AuthorityClient`] asks it over
//! HTTP and implements [`commit_trust_core::AuthorizationProvider`].
//!
//! # Example
//!
//! ```no_run
//! use commit_trust_authority::{AuthorityClient, AuthorityConfig};
//!
//! # async fn example() -> Result<(), commit_trust_authority::AuthorityError> {
//! let client = AuthorityClient::new(AuthorityConfig::from_env())?;
//! let authorization = client
//!     .fetch_authorization("FC1B547C8D8172C8", "dev@example.com")
//!     .await?;
//! println!("authorized: {}", authorization.authorized);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{AuthorityClient, AUTHORITY_USER_AGENT};
pub use config::AuthorityConfig;
pub use error::{AuthorityError, AuthorityResult};
