//! One verification run: configuration, commit, allowlist, decision.

use std::future::Future;
use std::sync::Arc;

use commit_trust_authority::{AuthorityClient, AuthorityError};
use commit_trust_core::{
    Allowlist, CommitSource, DecisionEngine, Outcome, PipelineEmitter, TracingEmitter, TrustError,
};
use tracing::info;

use crate::config::RunConfig;
use crate::exit_codes;
use crate::git::GitCommitSource;

/// Outcome of a run and the exit code it maps to.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub exit_code: i32,
}

impl RunReport {
    fn decided(outcome: Outcome) -> Self {
        let exit_code = if outcome.passed() {
            exit_codes::PASS
        } else {
            exit_codes::FAIL
        };
        Self { outcome, exit_code }
    }

    fn config_error(outcome: Outcome) -> Self {
        Self {
            outcome,
            exit_code: exit_codes::CONFIG_ERROR,
        }
    }
}

/// Verify the configured commit. Resolves once a decision is made or
/// `cancelled` fires during the authorization request.
pub async fn run<F>(config: &RunConfig, cancelled: F) -> RunReport
where
    F: Future<Output = ()>,
{
    run_with(
        config,
        &GitCommitSource::new(&config.repo_path),
        Arc::new(TracingEmitter),
        cancelled,
    )
    .await
}

pub async fn run_with<F>(
    config: &RunConfig,
    source: &dyn CommitSource,
    emitter: Arc<dyn PipelineEmitter>,
    cancelled: F,
) -> RunReport
where
    F: Future<Output = ()>,
{
    let repository = config.repository.as_str();

    let errors = config.validate();
    if let Some(outcome) = Outcome::fail_all(repository, &errors) {
        return RunReport::config_error(outcome);
    }

    let client = match AuthorityClient::new(config.authority_config()) {
        Ok(client) => client,
        Err(e) => {
            let err = config_error(e);
            return RunReport::config_error(Outcome::fail(repository, None, &[], &err));
        }
    };

    let commit = match source.get_commit(&config.commit_ref) {
        Ok(commit) => commit,
        Err(e) => return RunReport::decided(Outcome::fail(repository, None, &[], &e)),
    };
    info!(hash = %commit.hash, committer = %commit.committer.email, "verifying commit");

    let allowlist = match &config.allowlist_path {
        Some(path) => match Allowlist::from_file(path) {
            Ok(allowlist) => allowlist,
            Err(e) => {
                return RunReport::decided(Outcome::fail(repository, Some(&commit), &[], &e))
            }
        },
        None => Allowlist::default(),
    };
    let effective = allowlist.resolve(repository);

    let engine = DecisionEngine::new(repository, Arc::new(client)).with_emitter(emitter);
    let outcome = engine.run_until(&commit, &effective, cancelled).await;
    RunReport::decided(outcome)
}

fn config_error(err: AuthorityError) -> TrustError {
    match err {
        AuthorityError::Config { message } => TrustError::Config { message },
        other => TrustError::from(other),
    }
}
