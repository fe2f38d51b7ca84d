// Copyright 2016 Pierre-Étienne Meunier
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand_core::OsRng;
use russh_cryptovec::CryptoVec;
use ssh_key::{Algorithm, PrivateKey, PublicKey};

use super::{Config, Session};
use crate::agent::Agent;
use crate::auth::{AuthResult, MethodSet};
use crate::encoding::{Encoding, Reader};
use crate::keys::{self, EncodedExt, PrivateKeyWithHashAlg};
use crate::transport::Transport;
use crate::{msg, Error};

const SESSION_ID: &[u8] = b"0123456789abcdef0123456789abcdef";

enum Step {
    Recv(Vec<u8>),
    WouldBlock,
    Hang,
}

/// Transport stub replaying a scripted sequence of server packets.
struct ScriptedTransport {
    steps: VecDeque<Step>,
    sent: Vec<Vec<u8>>,
    service_would_block_once: bool,
    delayed_compression: bool,
    compression_enabled: bool,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Self {
        ScriptedTransport {
            steps: steps.into(),
            sent: Vec::new(),
            service_would_block_once: false,
            delayed_compression: false,
            compression_enabled: false,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn session_id(&self) -> &[u8] {
        SESSION_ID
    }

    async fn request_service(&mut self, name: &str) -> Result<bool, Error> {
        assert_eq!(name, "ssh-userauth");
        if self.service_would_block_once {
            self.service_would_block_once = false;
            return Ok(false);
        }
        Ok(true)
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.sent.push(payload.to_vec());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<CryptoVec>, Error> {
        match self.steps.pop_front() {
            Some(Step::Recv(p)) => Ok(Some(CryptoVec::from_slice(&p))),
            Some(Step::WouldBlock) => Ok(None),
            Some(Step::Hang) => std::future::pending().await,
            None => panic!("server script exhausted"),
        }
    }

    fn enable_delayed_compression(&mut self) {
        if self.delayed_compression {
            self.compression_enabled = true;
        }
    }
}

/// Agent stub holding its keys in memory.
struct StubAgent {
    keys: Vec<PrivateKey>,
}

#[async_trait]
impl Agent for StubAgent {
    async fn request_identities(&mut self) -> Result<Vec<PublicKey>, Error> {
        Ok(self.keys.iter().map(|k| k.public_key().clone()).collect())
    }

    async fn sign_request(&mut self, key: &PublicKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let k = self
            .keys
            .iter()
            .find(|k| k.public_key().key_data() == key.key_data())
            .ok_or(Error::AgentFailure)?;
        let k = PrivateKeyWithHashAlg::new(Arc::new(k.clone()), None);
        Ok(keys::sign_with_hash_alg(&k, data)?)
    }
}

fn failure(methods: &str, partial: bool) -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::USERAUTH_FAILURE);
    v.extend_ssh_string(methods.as_bytes());
    v.push(partial as u8);
    Step::Recv(v.as_ref().to_vec())
}

fn success() -> Step {
    Step::Recv(vec![msg::USERAUTH_SUCCESS])
}

fn banner(text: &str) -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::USERAUTH_BANNER);
    v.extend_ssh_string(text.as_bytes());
    v.extend_ssh_string(b"");
    Step::Recv(v.as_ref().to_vec())
}

fn ignore_msg() -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::IGNORE);
    v.extend_ssh_string(b"0000");
    Step::Recv(v.as_ref().to_vec())
}

fn debug_msg(text: &str) -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::DEBUG);
    v.push(0);
    v.extend_ssh_string(text.as_bytes());
    v.extend_ssh_string(b"");
    Step::Recv(v.as_ref().to_vec())
}

fn pk_ok(key: &PublicKey) -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::USERAUTH_INFO_REQUEST_OR_USERAUTH_PK_OK);
    v.extend_ssh_string(key.algorithm().as_str().as_bytes());
    v.extend_ssh_string(&key.key_data().encoded().unwrap());
    Step::Recv(v.as_ref().to_vec())
}

fn info_request(name: &str, instruction: &str, prompts: &[(&str, bool)]) -> Step {
    info_request_raw(name, instruction, prompts.len() as u32, prompts)
}

fn info_request_raw(
    name: &str,
    instruction: &str,
    nprompts: u32,
    prompts: &[(&str, bool)],
) -> Step {
    let mut v = CryptoVec::new();
    v.push(msg::USERAUTH_INFO_REQUEST_OR_USERAUTH_PK_OK);
    v.extend_ssh_string(name.as_bytes());
    v.extend_ssh_string(instruction.as_bytes());
    v.extend_ssh_string(b"");
    v.push_u32_be(nprompts);
    for (prompt, echo) in prompts {
        v.extend_ssh_string(prompt.as_bytes());
        v.push(*echo as u8);
    }
    Step::Recv(v.as_ref().to_vec())
}

fn new_session(steps: Vec<Step>) -> Session<ScriptedTransport> {
    let _ = env_logger::try_init();
    Session::new(
        ScriptedTransport::new(steps),
        Config {
            username: "alice".to_string(),
            ..Config::default()
        },
    )
}

/// Check the signature at the end of `sent` against the canonical buffer
/// (session identifier, then the request up to the signature field).
fn verify_signed_request(sent: &[u8], key: &PublicKey) {
    let mut r = sent.reader(1);
    r.read_string().unwrap(); // user
    r.read_string().unwrap(); // service
    assert_eq!(r.read_string().unwrap(), b"publickey");
    assert_eq!(r.read_byte().unwrap(), 1);
    r.read_string().unwrap(); // algorithm
    r.read_string().unwrap(); // public key blob
    let sig_pos = r.position;
    let sig = r.read_string().unwrap();
    assert_eq!(r.position, sent.len());

    let sig = ssh_key::Signature::try_from(sig).unwrap();
    let mut signed = CryptoVec::new();
    signed.extend_ssh_string(SESSION_ID);
    signed.extend(&sent[..sig_pos]);
    signature::Verifier::verify(key, signed.as_ref(), &sig).unwrap();
}

#[tokio::test]
async fn none_probe_reports_server_methods() {
    let mut session = new_session(vec![failure("password", false)]);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);
    assert_eq!(session.auth_methods(), MethodSet::PASSWORD);

    let sent = &session.transport().sent[0];
    assert_eq!(sent[0], msg::USERAUTH_REQUEST);
    let mut r = sent.reader(1);
    assert_eq!(r.read_string().unwrap(), b"alice");
    assert_eq!(r.read_string().unwrap(), b"ssh-connection");
    assert_eq!(r.read_string().unwrap(), b"none");
    assert_eq!(r.position, sent.len());
}

#[tokio::test]
async fn password_success_enables_delayed_compression() {
    let mut transport = ScriptedTransport::new(vec![success()]);
    transport.delayed_compression = true;
    let mut session = Session::new(
        transport,
        Config {
            username: "alice".to_string(),
            ..Config::default()
        },
    );

    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Success);
    assert!(session.is_authenticated());
    assert!(session.transport().compression_enabled);

    let sent = &session.transport().sent[0];
    let mut r = sent.reader(1);
    assert_eq!(r.read_string().unwrap(), b"alice");
    assert_eq!(r.read_string().unwrap(), b"ssh-connection");
    assert_eq!(r.read_string().unwrap(), b"password");
    assert_eq!(r.read_byte().unwrap(), 0);
    assert_eq!(r.read_string().unwrap(), b"hunter2");
    assert_eq!(r.position, sent.len());
}

#[tokio::test]
async fn publickey_offer_then_sign() {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let mut session = new_session(vec![
        pk_ok(key.public_key()),
        failure("publickey,password", false),
    ]);

    let r = session
        .authenticate_try_publickey(None, key.public_key())
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);

    // the offer carries no signature: FALSE, algorithm, blob, nothing else
    {
        let sent = &session.transport().sent[0];
        let mut r = sent.reader(1);
        r.read_string().unwrap();
        r.read_string().unwrap();
        assert_eq!(r.read_string().unwrap(), b"publickey");
        assert_eq!(r.read_byte().unwrap(), 0);
        assert_eq!(r.read_string().unwrap(), b"ssh-ed25519");
        assert_eq!(
            r.read_string().unwrap(),
            &key.public_key().key_data().encoded().unwrap()[..]
        );
        assert_eq!(r.position, sent.len());
    }

    let signing = PrivateKeyWithHashAlg::new(Arc::new(key.clone()), None);
    let r = session
        .authenticate_publickey(None, &signing)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Denied);
    assert_eq!(
        session.auth_methods(),
        MethodSet::PUBLICKEY | MethodSet::PASSWORD
    );

    verify_signed_request(&session.transport().sent[1], key.public_key());
}

#[tokio::test]
async fn keyboard_interactive_two_prompts() {
    let mut session = new_session(vec![
        info_request(
            "PAM",
            "Please authenticate",
            &[("Password:", false), ("OTP:", true)],
        ),
        success(),
    ]);

    let r = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Info);
    assert_eq!(session.kbdint_nprompts(), 2);
    assert_eq!(session.kbdint_name(), Some("PAM"));
    assert_eq!(session.kbdint_instruction(), Some("Please authenticate"));
    let p = session.kbdint_prompt(0).unwrap();
    assert_eq!(p.text(), "Password:");
    assert!(!p.echo());
    let p = session.kbdint_prompt(1).unwrap();
    assert_eq!(p.text(), "OTP:");
    assert!(p.echo());
    assert!(session.kbdint_prompt(2).is_none());

    session.kbdint_set_answer(0, "p").unwrap();
    session.kbdint_set_answer(1, "123456").unwrap();
    let r = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);
    // the scratch is destroyed once the answers are sent
    assert_eq!(session.kbdint_nprompts(), 0);

    let sent = &session.transport().sent[0];
    let mut r = sent.reader(1);
    r.read_string().unwrap();
    r.read_string().unwrap();
    assert_eq!(r.read_string().unwrap(), b"keyboard-interactive");
    assert_eq!(r.read_string().unwrap(), b"");
    assert_eq!(r.read_string().unwrap(), b"");

    let sent = &session.transport().sent[1];
    assert_eq!(sent[0], msg::USERAUTH_INFO_RESPONSE);
    let mut r = sent.reader(1);
    assert_eq!(r.read_u32().unwrap(), 2);
    assert_eq!(r.read_string().unwrap(), b"p");
    assert_eq!(r.read_string().unwrap(), b"123456");
    assert_eq!(r.position, sent.len());
}

#[tokio::test]
async fn unanswered_prompts_are_sent_empty() {
    let mut session = new_session(vec![
        info_request("", "", &[("Password:", false), ("OTP:", true)]),
        success(),
    ]);

    let r = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Info);
    session.kbdint_set_answer(1, "123456").unwrap();
    session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap();

    let sent = &session.transport().sent[1];
    let mut r = sent.reader(1);
    assert_eq!(r.read_u32().unwrap(), 2);
    assert_eq!(r.read_string().unwrap(), b"");
    assert_eq!(r.read_string().unwrap(), b"123456");
}

#[tokio::test]
async fn nonblocking_call_resumes() {
    let mut session = new_session(vec![Step::WouldBlock, success()]);

    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Again);
    assert_eq!(session.transport().sent.len(), 1);

    // entering a different driver while the call is pending is a fatal
    // error, and nothing is sent
    let e = session.authenticate_none(None).await.unwrap_err();
    assert!(matches!(e, Error::AuthPending));
    assert_eq!(session.transport().sent.len(), 1);

    // re-entering the same driver resumes without re-sending
    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Success);
    assert_eq!(session.transport().sent.len(), 1);
}

#[tokio::test]
async fn cascades_reject_foreign_pending_markers() {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let other = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();

    // a standalone offer left pending by a would-block...
    let mut session = new_session(vec![Step::WouldBlock, pk_ok(key.public_key())]);
    session.set_agent(Box::new(StubAgent { keys: vec![other] }));
    let r = session
        .authenticate_try_publickey(None, key.public_key())
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Again);

    // ...is not resumable through either cascade
    let e = session.authenticate_agent(None).await.unwrap_err();
    assert!(matches!(e, Error::AuthPending));
    let e = session
        .authenticate_publickey_auto(None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(e, Error::AuthPending));
    assert_eq!(session.transport().sent.len(), 1);

    // only the offering driver itself may continue
    let r = session
        .authenticate_try_publickey(None, key.public_key())
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);
}

#[tokio::test]
async fn pending_agent_call_blocks_other_drivers() {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let mut session = new_session(vec![Step::WouldBlock]);
    session.set_agent(Box::new(StubAgent {
        keys: vec![key.clone()],
    }));

    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Again);

    let e = session
        .authenticate_try_publickey(None, key.public_key())
        .await
        .unwrap_err();
    assert!(matches!(e, Error::AuthPending));
    let e = session
        .authenticate_publickey_auto(None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(e, Error::AuthPending));
    assert_eq!(session.transport().sent.len(), 1);
}

#[tokio::test]
async fn user_timeout_surfaces_as_again() {
    let mut transport = ScriptedTransport::new(vec![Step::Hang, success()]);
    transport.delayed_compression = false;
    let mut session = Session::new(
        transport,
        Config {
            username: "alice".to_string(),
            user_timeout: Some(Duration::from_millis(10)),
            ..Config::default()
        },
    );

    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Again);
    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Success);
}

#[tokio::test]
async fn service_request_would_block() {
    let mut transport = ScriptedTransport::new(vec![failure("password", false)]);
    transport.service_would_block_once = true;
    let mut session = Session::new(
        transport,
        Config {
            username: "alice".to_string(),
            ..Config::default()
        },
    );

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Again);
    assert_eq!(session.transport().sent.len(), 0);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);
}

#[tokio::test]
async fn banner_is_stored_and_replaced() {
    let mut session = new_session(vec![
        banner("maintenance at noon"),
        failure("password", false),
        banner("go away"),
        success(),
    ]);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);
    assert_eq!(session.banner(), Some("maintenance at noon"));

    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Success);
    assert_eq!(session.banner(), Some("go away"));
}

#[tokio::test]
async fn ignore_and_debug_are_skipped() {
    let mut session = new_session(vec![
        ignore_msg(),
        debug_msg("touch packet"),
        failure("password", false),
        success(),
    ]);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);

    // the session was not poisoned by the benign messages
    let r = session.authenticate_password(None, "hunter2").await.unwrap();
    assert_eq!(r, AuthResult::Success);
}

#[tokio::test]
async fn partial_success_accumulates_methods() {
    let mut session = new_session(vec![
        failure("password", true),
        failure("publickey", true),
    ]);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Partial);
    assert_eq!(session.auth_methods(), MethodSet::PASSWORD);

    let r = session.authenticate_none(None).await.unwrap();
    assert_eq!(r, AuthResult::Partial);
    assert_eq!(
        session.auth_methods(),
        MethodSet::PASSWORD | MethodSet::PUBLICKEY
    );
}

#[tokio::test]
async fn zero_prompts_is_fatal() {
    let mut session = new_session(vec![info_request_raw("", "", 0, &[])]);

    let e = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap_err();
    assert!(matches!(e, Error::KbdintPromptCount(0)));
    assert_eq!(session.kbdint_nprompts(), 0);

    // the session is poisoned: no further calls, no network traffic
    let e = session.authenticate_none(None).await.unwrap_err();
    assert!(matches!(e, Error::Inconsistent));
    assert_eq!(session.transport().sent.len(), 1);
}

#[tokio::test]
async fn too_many_prompts_is_fatal() {
    let mut session = new_session(vec![info_request_raw("", "", 33, &[])]);

    let e = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap_err();
    assert!(matches!(e, Error::KbdintPromptCount(33)));
    assert_eq!(session.kbdint_nprompts(), 0);
}

#[tokio::test]
async fn answer_index_bounds() {
    let mut session = new_session(vec![info_request("", "", &[("A:", true), ("B:", true)])]);

    let r = session
        .authenticate_keyboard_interactive(None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Info);

    assert!(matches!(
        session.kbdint_set_answer(2, "x"),
        Err(Error::IndexOutOfBounds)
    ));
    session.kbdint_set_answer(1, "x").unwrap();
}

#[tokio::test]
async fn set_answer_without_exchange_fails() {
    let mut session = new_session(vec![]);
    assert!(matches!(
        session.kbdint_set_answer(0, "x"),
        Err(Error::NoKbdintExchange)
    ));
}

#[tokio::test]
async fn agent_cascade_tries_every_identity() {
    let first = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let second = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();

    let mut session = new_session(vec![
        failure("publickey", false), // first offer refused
        pk_ok(second.public_key()),  // second offer accepted
        success(),                   // signature accepted
    ]);
    session.set_agent(Box::new(StubAgent {
        keys: vec![first, second.clone()],
    }));

    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Success);
    assert!(session.is_authenticated());

    assert_eq!(session.transport().sent.len(), 3);
    verify_signed_request(&session.transport().sent[2], second.public_key());
}

#[tokio::test]
async fn agent_cascade_resumes_mid_signature() {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let mut session = new_session(vec![
        pk_ok(key.public_key()),
        Step::WouldBlock,
        success(),
    ]);
    session.set_agent(Box::new(StubAgent {
        keys: vec![key.clone()],
    }));

    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Again);
    assert_eq!(session.transport().sent.len(), 2); // offer + signed request

    // resuming settles the in-flight signature without sending a new one
    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Success);
    assert_eq!(session.transport().sent.len(), 2);
    verify_signed_request(&session.transport().sent[1], key.public_key());
}

#[tokio::test]
async fn agent_without_identities_is_denied() {
    let mut session = new_session(vec![]);
    session.set_agent(Box::new(StubAgent { keys: vec![] }));

    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);
    assert!(session.transport().sent.is_empty());

    // no agent attached at all behaves the same
    let mut session = new_session(vec![]);
    let r = session.authenticate_agent(None).await.unwrap();
    assert_eq!(r, AuthResult::Denied);
}

#[tokio::test]
async fn auto_cascade_derives_and_persists_public_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("id_ed25519");
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let encrypted = key.encrypt(&mut OsRng, "pw").unwrap();
    std::fs::write(
        &path,
        encrypted.to_openssh(ssh_key::LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();

    let mut session = Session::new(
        ScriptedTransport::new(vec![pk_ok(key.public_key()), success()]),
        Config {
            username: "alice".to_string(),
            identity_files: vec![path.clone()],
            ..Config::default()
        },
    );
    session.set_agent(Box::new(StubAgent { keys: vec![] }));

    let r = session
        .authenticate_publickey_auto(None, Some("pw"), None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);

    // the derived public half was saved next to the private key
    let pub_path = dir.path().join("id_ed25519.pub");
    let saved = keys::load_public_key(&pub_path).unwrap();
    assert_eq!(saved.key_data(), key.public_key().key_data());

    verify_signed_request(&session.transport().sent[1], key.public_key());
}

#[tokio::test]
async fn auto_cascade_asks_for_passphrase() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("id_ed25519");
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let encrypted = key.encrypt(&mut OsRng, "pw").unwrap();
    std::fs::write(
        &path,
        encrypted.to_openssh(ssh_key::LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();

    let mut session = Session::new(
        ScriptedTransport::new(vec![pk_ok(key.public_key()), success()]),
        Config {
            username: "alice".to_string(),
            identity_files: vec![path.clone()],
            ..Config::default()
        },
    );

    let prompt = move |text: &str| -> Option<String> {
        assert!(text.contains("id_ed25519"));
        Some("pw".to_string())
    };
    let r = session
        .authenticate_publickey_auto(None, None, Some(&prompt))
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);
}

#[tokio::test]
async fn auto_cascade_exhaustion_is_denied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("id_ed25519");
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    std::fs::write(
        &path,
        key.to_openssh(ssh_key::LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();

    let mut session = Session::new(
        ScriptedTransport::new(vec![failure("publickey", false)]),
        Config {
            username: "alice".to_string(),
            identity_files: vec![path],
            ..Config::default()
        },
    );

    let r = session
        .authenticate_publickey_auto(None, None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Denied);
}

#[tokio::test]
async fn auto_cascade_resumes_after_would_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("id_ed25519");
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    std::fs::write(
        &path,
        key.to_openssh(ssh_key::LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();

    let mut session = Session::new(
        ScriptedTransport::new(vec![
            Step::WouldBlock,
            pk_ok(key.public_key()),
            success(),
        ]),
        Config {
            username: "alice".to_string(),
            identity_files: vec![path],
            ..Config::default()
        },
    );

    let r = session
        .authenticate_publickey_auto(None, None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Again);
    assert_eq!(session.transport().sent.len(), 1);

    let r = session
        .authenticate_publickey_auto(None, None, None)
        .await
        .unwrap();
    assert_eq!(r, AuthResult::Success);
    assert_eq!(session.transport().sent.len(), 2);
}
