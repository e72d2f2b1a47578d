//! Shared fixtures for pipeline tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use commit_trust_core::{Authorization, AuthorizationProvider, CommitRecord, TrustResult};
use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{Armorer, Message, Signer};
use openpgp::serialize::SerializeInto;

pub const UNSIGNED_COMMIT: &[u8] = b"tree 1b99d17009234a86e65e830c7a7ae6f7d182b8ef
parent d45e77738bda2d17b10f87d05167a12fa5be8d63
author Dev One <dev@example.com> 1673558348 +0100
committer Dev One <dev@example.com> 1673912904 +0100

Add feature
";

pub fn generate_cert(user_id: &str) -> Cert {
    let (cert, _) = CertBuilder::general_purpose(None, Some(user_id))
        .set_creation_time(SystemTime::now() - Duration::from_secs(3600))
        .generate()
        .unwrap();
    cert
}

pub fn armored_public_key(cert: &Cert) -> String {
    String::from_utf8(cert.armored().to_vec().unwrap()).unwrap()
}

pub fn base64_public_key(cert: &Cert) -> String {
    BASE64.encode(cert.to_vec().unwrap())
}

pub fn sign_detached(cert: &Cert, payload: &[u8]) -> String {
    let policy = StandardPolicy::new();
    let keypair = cert
        .keys()
        .unencrypted_secret()
        .with_policy(&policy, None)
        .supported()
        .alive()
        .revoked(false)
        .for_signing()
        .next()
        .unwrap()
        .key()
        .clone()
        .into_keypair()
        .unwrap();

    let mut sink = Vec::new();
    {
        let message = Message::new(&mut sink);
        let message = Armorer::new(message)
            .kind(openpgp::armor::Kind::Signature)
            .build()
            .unwrap();
        let mut signer = Signer::new(message, keypair).detached().build().unwrap();
        signer.write_all(payload).unwrap();
        signer.finalize().unwrap();
    }
    String::from_utf8(sink).unwrap()
}

pub fn unsigned_commit() -> CommitRecord {
    CommitRecord::from_raw_object("0a1b2c3d4e5f", UNSIGNED_COMMIT).unwrap()
}

/// The fixture commit, signed by `cert`.
pub fn commit_signed_by(cert: &Cert) -> CommitRecord {
    let mut commit = unsigned_commit();
    commit.signature = Some(sign_detached(cert, &commit.unsigned_payload));
    commit
}

/// The raw fixture object with a `gpgsig` header signed by `cert`, as
/// `git cat-file commit` prints it.
pub fn signed_commit_object(cert: &Cert) -> Vec<u8> {
    let signature = sign_detached(cert, UNSIGNED_COMMIT);
    let mut header = String::new();
    for (i, line) in signature.trim_end().lines().enumerate() {
        header.push_str(if i == 0 { "gpgsig " } else { " " });
        header.push_str(line);
        header.push('\n');
    }

    let text = std::str::from_utf8(UNSIGNED_COMMIT).unwrap();
    let (headers, message) = text.split_once("\n\n").unwrap();
    format!("{}\n{}\n{}", headers, header, message).into_bytes()
}

/// Authority returning a canned answer and recording every request.
pub struct FakeAuthority {
    answer: TrustResult<Authorization>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeAuthority {
    pub fn answering(answer: TrustResult<Authorization>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Self::answering(Err(commit_trust_core::TrustError::Transport {
            message: "should not be called".to_string(),
        }))
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthorizationProvider for FakeAuthority {
    async fn get_authorization(
        &self,
        issuer_key_id: &str,
        committer_email: &str,
    ) -> TrustResult<Authorization> {
        self.calls
            .lock()
            .unwrap()
            .push((issuer_key_id.to_string(), committer_email.to_string()));
        self.answer.clone()
    }
}

/// Authority that never answers.
pub struct HangingAuthority;

#[async_trait]
impl AuthorizationProvider for HangingAuthority {
    async fn get_authorization(
        &self,
        _issuer_key_id: &str,
        _committer_email: &str,
    ) -> TrustResult<Authorization> {
        std::future::pending().await
    }
}
