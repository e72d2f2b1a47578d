//! The decision pipeline.
//!
//! A run walks a fixed sequence of stages, each of which either decides the
//! outcome or hands over to the next one:
//!
//! ```text
//! CheckEmailBypass -> CheckThirdPartyKeys -> RequireSignature
//!     -> ParseSignature -> RemoteAuthorize -> VerifySignature -> Pass | Fail
//! ```
//!
//! There is no backtracking and nothing is retried. Only `RemoteAuthorize`
//! waits on I/O.

use std::future::Future;
use std::pin::{pin, Pin};
use std::sync::Arc;

use crate::allowlist::EffectiveAllowlist;
use crate::authority::{Authorization, AuthorizationProvider};
use crate::commit::CommitRecord;
use crate::error::TrustError;
use crate::events::{NullEmitter, PipelineEmitter, PipelineEvent, Stage, TracingEmitter};
use crate::outcome::{Outcome, VerificationDetails};
use crate::signature::SignatureEnvelope;
use crate::verify::{
    verify_by_email, verify_by_third_party_keys, verify_signature_by_key, ThirdPartyCheck,
};

/// Pipeline position plus whatever the previous stage produced.
#[derive(Debug)]
enum State {
    CheckEmailBypass,
    CheckThirdPartyKeys,
    RequireSignature,
    ParseSignature,
    RemoteAuthorize {
        envelope: SignatureEnvelope,
    },
    VerifySignature {
        envelope: SignatureEnvelope,
        authorization: Authorization,
    },
    Pass(VerificationDetails),
    Fail(TrustError),
}

impl State {
    fn stage(&self) -> Option<Stage> {
        match self {
            Self::CheckEmailBypass => Some(Stage::CheckEmailBypass),
            Self::CheckThirdPartyKeys => Some(Stage::CheckThirdPartyKeys),
            Self::RequireSignature => Some(Stage::RequireSignature),
            Self::ParseSignature => Some(Stage::ParseSignature),
            Self::RemoteAuthorize { .. } => Some(Stage::RemoteAuthorize),
            Self::VerifySignature { .. } => Some(Stage::VerifySignature),
            Self::Pass(_) | Self::Fail(_) => None,
        }
    }
}

/// Decides whether commits to one repository are trusted.
pub struct DecisionEngine {
    repository: String,
    authority: Arc<dyn AuthorizationProvider>,
    emitter: Arc<dyn PipelineEmitter>,
}

impl DecisionEngine {
    /// Engine that reports progress through `tracing`.
    pub fn new(repository: impl Into<String>, authority: Arc<dyn AuthorizationProvider>) -> Self {
        Self {
            repository: repository.into(),
            authority,
            emitter: Arc::new(TracingEmitter),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn PipelineEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Silence progress events.
    pub fn quiet(self) -> Self {
        self.with_emitter(Arc::new(NullEmitter))
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Run the pipeline to completion.
    pub async fn run(&self, commit: &CommitRecord, allowlist: &EffectiveAllowlist) -> Outcome {
        self.run_until(commit, allowlist, std::future::pending::<()>())
            .await
    }

    /// Run the pipeline, aborting the authority call once `cancelled`
    /// resolves. A cancelled run fails with a transport error.
    pub async fn run_until<F>(
        &self,
        commit: &CommitRecord,
        allowlist: &EffectiveAllowlist,
        cancelled: F,
    ) -> Outcome
    where
        F: Future<Output = ()>,
    {
        let mut cancelled = pin!(cancelled);
        let mut state = State::CheckEmailBypass;

        let outcome = loop {
            if let Some(stage) = state.stage() {
                self.emitter.emit(&PipelineEvent::StageEntered { stage });
            }

            state = match state {
                State::Pass(details) => {
                    break Outcome::pass(&self.repository, Some(commit), details, &allowlist.errors)
                }
                State::Fail(err) => {
                    break Outcome::fail(&self.repository, Some(commit), &allowlist.errors, &err)
                }
                other => {
                    self.step(other, commit, allowlist, cancelled.as_mut())
                        .await
                }
            };
        };

        self.emitter.emit(&PipelineEvent::Finished {
            passed: outcome.passed(),
            desc: outcome.desc.clone(),
        });
        outcome
    }

    async fn step<F>(
        &self,
        state: State,
        commit: &CommitRecord,
        allowlist: &EffectiveAllowlist,
        cancelled: Pin<&mut F>,
    ) -> State
    where
        F: Future<Output = ()>,
    {
        let email = commit.committer.email.as_str();

        match state {
            State::CheckEmailBypass => {
                let matched = verify_by_email(email, &allowlist.email_addresses);
                self.emitter.emit(&PipelineEvent::EmailBypass {
                    email: email.to_string(),
                    matched,
                });
                if matched {
                    State::Pass(VerificationDetails::EmailAddress {
                        email_address: email.to_string(),
                    })
                } else {
                    State::CheckThirdPartyKeys
                }
            }

            State::CheckThirdPartyKeys => {
                let check = verify_by_third_party_keys(commit, &allowlist.third_party_keys);
                self.emitter.emit(&PipelineEvent::ThirdPartyKeys {
                    checked: allowlist.third_party_keys.len(),
                    matched_key_id: match &check {
                        ThirdPartyCheck::Verified { signer, .. } => Some(signer.key_id.clone()),
                        _ => None,
                    },
                    signed: check != ThirdPartyCheck::Unsigned,
                });
                match check {
                    ThirdPartyCheck::Verified { signer, .. } => {
                        State::Pass(VerificationDetails::third_party_key(
                            signer.key_id,
                            signer.fingerprint,
                            signer.user_id,
                        ))
                    }
                    ThirdPartyCheck::NoMatch | ThirdPartyCheck::Unsigned => State::RequireSignature,
                }
            }

            State::RequireSignature => {
                if commit.is_signed() {
                    State::ParseSignature
                } else {
                    State::Fail(TrustError::Unsigned)
                }
            }

            State::ParseSignature => {
                let Some(signature) = commit.signature_bytes() else {
                    return State::Fail(TrustError::Unsigned);
                };
                match SignatureEnvelope::parse(signature) {
                    Ok(envelope) => State::RemoteAuthorize { envelope },
                    Err(e) => State::Fail(e.into()),
                }
            }

            State::RemoteAuthorize { envelope } => {
                self.emitter.emit(&PipelineEvent::AuthorizationRequested {
                    key_id: envelope.issuer_key_id.clone(),
                    email: email.to_string(),
                });

                let result = tokio::select! {
                    biased;
                    _ = cancelled => Err(TrustError::Transport {
                        message: "authorization request cancelled".to_string(),
                    }),
                    result = self.authority.get_authorization(&envelope.issuer_key_id, email) => result,
                };

                match result {
                    Ok(authorization) => {
                        self.emitter.emit(&PipelineEvent::AuthorizationReceived {
                            key_id: envelope.issuer_key_id.clone(),
                            authorized: authorization.authorized,
                        });
                        if authorization.authorized {
                            State::VerifySignature {
                                envelope,
                                authorization,
                            }
                        } else {
                            State::Fail(TrustError::AuthorityDenied {
                                message: authorization.message,
                            })
                        }
                    }
                    Err(e) => State::Fail(e),
                }
            }

            State::VerifySignature {
                envelope,
                authorization,
            } => match verify_signature_by_key(
                &authorization.pgp_key.base64_key,
                &envelope.raw,
                &commit.unsigned_payload,
            ) {
                Ok(_) => State::Pass(VerificationDetails::bi_managed_key(
                    envelope.issuer_key_id,
                    email,
                )),
                Err(e) => State::Fail(e),
            },

            terminal @ (State::Pass(_) | State::Fail(_)) => terminal,
        }
    }
}
