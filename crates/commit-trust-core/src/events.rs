//! Pipeline progress events.
//!
//! The engine never logs directly. It hands every event to an injected
//! [`PipelineEmitter`], so callers choose between structured logs, silence,
//! or capture.

use std::sync::Mutex;

use serde::Serialize;

/// Steps of the decision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CheckEmailBypass,
    CheckThirdPartyKeys,
    RequireSignature,
    ParseSignature,
    RemoteAuthorize,
    VerifySignature,
}

/// Something observable that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageEntered {
        stage: Stage,
    },
    EmailBypass {
        email: String,
        matched: bool,
    },
    ThirdPartyKeys {
        checked: usize,
        matched_key_id: Option<String>,
        signed: bool,
    },
    AuthorizationRequested {
        key_id: String,
        email: String,
    },
    AuthorizationReceived {
        key_id: String,
        authorized: bool,
    },
    Finished {
        passed: bool,
        desc: String,
    },
}

/// Receives pipeline events.
pub trait PipelineEmitter: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingEmitter;

impl PipelineEmitter for TracingEmitter {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageEntered { stage } => {
                tracing::debug!(?stage, "entering stage");
            }
            PipelineEvent::EmailBypass { email, matched } => {
                tracing::info!(%email, matched, "checked email allowlist");
            }
            PipelineEvent::ThirdPartyKeys {
                checked,
                matched_key_id,
                signed,
            } => {
                tracing::info!(checked, ?matched_key_id, signed, "checked third-party keys");
            }
            PipelineEvent::AuthorizationRequested { key_id, email } => {
                tracing::info!(%key_id, %email, "requesting authorization");
            }
            PipelineEvent::AuthorizationReceived { key_id, authorized } => {
                tracing::info!(%key_id, authorized, "authorization received");
            }
            PipelineEvent::Finished { passed, desc } => {
                if *passed {
                    tracing::info!(%desc, "commit trusted");
                } else {
                    tracing::warn!(%desc, "commit not trusted");
                }
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullEmitter;

impl PipelineEmitter for NullEmitter {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Stages entered, in order.
    pub fn stages(&self) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::StageEntered { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl PipelineEmitter for MemoryEmitter {
    fn emit(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
