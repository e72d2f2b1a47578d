use std::path::PathBuf;

use clap::Parser;
use commit_trust_authority::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "commit-trust",
    version,
    about = "Decide whether a git commit is trusted: allowlisted committer, allowlisted third-party key, or a key authorized by the key management API"
)]
pub struct Cli {
    /// Path to a clone of the repository
    #[arg(long, env = "REPO_PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit to verify (e.g. HEAD or a full hash)
    #[arg(long = "ref", env = "COMMIT_REF", default_value = "HEAD")]
    pub commit_ref: String,

    /// Repository name, matched against allowlist scopes
    #[arg(long, env = "REPOSITORY")]
    pub repository: Option<String>,

    /// Bearer token for the key management API
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Base URL of the key management API
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Allowlist configuration file (YAML)
    #[arg(long, env = "ALLOWLIST_CONFIG_FILE_PATH")]
    pub allowlist: Option<PathBuf>,

    /// Timeout for the authorization request, in seconds
    #[arg(long, env = "API_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Pretty-print the outcome on stdout
    #[arg(long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "commit-trust",
            "--path",
            "/tmp/repo",
            "--ref",
            "main",
            "--repository",
            "web",
            "--api-token",
            "secret",
            "--allowlist",
            "allowlist.yaml",
            "--timeout-secs",
            "5",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.path, PathBuf::from("/tmp/repo"));
        assert_eq!(cli.commit_ref, "main");
        assert_eq!(cli.repository.as_deref(), Some("web"));
        assert_eq!(cli.api_token.as_deref(), Some("secret"));
        assert_eq!(cli.allowlist, Some(PathBuf::from("allowlist.yaml")));
        assert_eq!(cli.timeout_secs, 5);
        assert!(cli.pretty);
    }
}
