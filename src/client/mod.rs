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

//! # Authenticating as a client
//!
//! A [`Session`] wraps a [`Transport`] that has completed key exchange and
//! drives the `ssh-userauth` service on top of it. Each `authenticate_*`
//! driver sends one `USERAUTH_REQUEST` and pumps incoming packets until the
//! server settles the attempt, returning an [`AuthResult`].
//!
//! On a non-blocking transport a driver can return [`AuthResult::Again`]
//! instead. The call is then *pending*: the caller must re-enter the same
//! driver (with compatible arguments) to resume it, and every other driver
//! fails with [`Error::AuthPending`] until the pending call terminates.
//! Keyboard-interactive authentication additionally returns
//! [`AuthResult::Info`] when the server sends a challenge; the caller reads
//! the prompts with [`Session::kbdint_prompt`], fills in answers with
//! [`Session::kbdint_set_answer`], and calls
//! [`Session::authenticate_keyboard_interactive`] again to send them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use russh_cryptovec::CryptoVec;
use ssh_key::{PrivateKey, PublicKey};

use crate::agent::Agent;
use crate::auth::{AuthResult, AuthState, CascadePhase, MethodSet, PendingCall, Prompt};
use crate::encoding::Encoding;
use crate::keys::{self, EncodedExt, PrivateKeyWithHashAlg};
use crate::transport::Transport;
use crate::Error;

mod packets;
#[cfg(test)]
mod test;

/// Callback used by [`Session::authenticate_publickey_auto`] to obtain the
/// passphrase of an encrypted key. Receives the prompt text; returning
/// `None` skips the identity.
pub type PassphrasePrompt = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Session-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default username for authentication requests, used when a driver is
    /// called without an explicit one.
    pub username: String,
    /// Private-key paths (without the `.pub` suffix) tried in order by
    /// [`Session::authenticate_publickey_auto`].
    pub identity_files: Vec<PathBuf>,
    /// How long a driver waits for the server before returning
    /// [`AuthResult::Again`]. `None` waits indefinitely.
    pub user_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            username: String::new(),
            identity_files: Vec::new(),
            user_timeout: None,
        }
    }
}

/// Client side of the `ssh-userauth` service (RFC 4252).
///
/// All state lives on the session and is mutated either by a driver call or
/// by the packet handlers the driver pumps; there is no internal locking,
/// and only one authentication request is ever in flight.
pub struct Session<T: Transport> {
    transport: T,
    config: Config,
    agent: Option<Box<dyn Agent>>,
    buffer: CryptoVec,
    auth_state: AuthState,
    pending: PendingCall,
    auth_methods: MethodSet,
    banner: Option<String>,
    kbdint: Option<crate::auth::Kbdint>,
    service_accepted: bool,
    authenticated: bool,
    poisoned: bool,
    cascade_index: usize,
    cascade_phase: CascadePhase,
    cascade_in_files: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Session {
            transport,
            config,
            agent: None,
            buffer: CryptoVec::new(),
            auth_state: AuthState::None,
            pending: PendingCall::None,
            auth_methods: MethodSet::empty(),
            banner: None,
            kbdint: None,
            service_accepted: false,
            authenticated: false,
            poisoned: false,
            cascade_index: 0,
            cascade_phase: CascadePhase::Offer,
            cascade_in_files: false,
        }
    }

    /// Attach an agent, used by [`authenticate_agent`](Session::authenticate_agent)
    /// and tried first by [`authenticate_publickey_auto`](Session::authenticate_publickey_auto).
    pub fn set_agent(&mut self, agent: Box<dyn Agent>) {
        self.agent = Some(agent);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The methods the server advertised in its last `USERAUTH_FAILURE`.
    /// Empty until a request (usually a `none` probe) has been rejected.
    pub fn auth_methods(&self) -> MethodSet {
        self.auth_methods
    }

    /// The most recent `USERAUTH_BANNER` sent by the server, if any.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn poison(&mut self) {
        self.auth_state = AuthState::Error;
        self.poisoned = true;
    }

    /// Gate a driver entry against the pending-call marker. `Ok(true)` means
    /// a call with this marker is pending and must be resumed; `Ok(false)`
    /// means the driver starts fresh. Entering with a *different* call
    /// pending is a fatal error, reported without touching the wire or the
    /// marker.
    fn ensure_ready(&self, marker: PendingCall) -> Result<bool, Error> {
        if self.poisoned {
            return Err(Error::Inconsistent);
        }
        if self.pending == marker {
            return Ok(true);
        }
        if self.pending == PendingCall::None {
            return Ok(false);
        }
        Err(Error::AuthPending)
    }

    /// Ask the transport for the `ssh-userauth` service. Idempotent after
    /// the first acceptance. `Ok(false)` means would-block.
    async fn request_userauth_service(&mut self) -> Result<bool, Error> {
        if self.service_accepted {
            return Ok(true);
        }
        if self.transport.request_service("ssh-userauth").await? {
            self.service_accepted = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn user_or_default(&self, user: Option<&str>) -> String {
        user.unwrap_or(&self.config.username).to_string()
    }

    /// Hand the request in `buffer[from..]` to the transport and record the
    /// in-flight call. The buffer is cleared (and thereby zeroed) whether or
    /// not the send succeeds.
    async fn transmit(
        &mut self,
        state: AuthState,
        marker: PendingCall,
        from: usize,
    ) -> Result<(), Error> {
        self.auth_state = state;
        self.pending = marker;
        #[allow(clippy::indexing_slicing)] // offset produced by the request builder
        let r = self.transport.send(&self.buffer[from..]).await;
        self.buffer.clear();
        if r.is_err() {
            self.pending = PendingCall::None;
        }
        r
    }

    /// Pump incoming packets until the authentication state is terminal,
    /// then map it to a result. Would-block and an elapsed user timeout both
    /// surface as [`AuthResult::Again`] with the state untouched.
    async fn await_response(&mut self) -> Result<AuthResult, Error> {
        while !self.auth_state.is_terminal() {
            let packet = match self.config.user_timeout {
                Some(t) => match tokio::time::timeout(t, self.transport.recv()).await {
                    Ok(r) => r?,
                    Err(_) => return Ok(AuthResult::Again),
                },
                None => self.transport.recv().await?,
            };
            match packet {
                Some(buf) => self.process_packet(&buf)?,
                None => return Ok(AuthResult::Again),
            }
        }
        match self.auth_state {
            AuthState::Failed => Ok(AuthResult::Denied),
            AuthState::Partial => Ok(AuthResult::Partial),
            AuthState::Info => Ok(AuthResult::Info),
            AuthState::PkOk | AuthState::Success => Ok(AuthResult::Success),
            // the loop above only exits on terminal states
            AuthState::Error | AuthState::None | AuthState::KbdintSent => {
                Err(Error::Inconsistent)
            }
        }
    }

    /// Await the response and settle the pending marker: any outcome other
    /// than `Again` (including an error) clears it.
    async fn finish(&mut self) -> Result<AuthResult, Error> {
        let r = self.await_response().await;
        if !matches!(r, Ok(AuthResult::Again)) {
            self.pending = PendingCall::None;
        }
        r
    }

    /// Try to authenticate through the `none` method. Mostly useful to probe
    /// which methods the server accepts: after a denial,
    /// [`auth_methods`](Session::auth_methods) holds the server's list.
    pub async fn authenticate_none(&mut self, user: Option<&str>) -> Result<AuthResult, Error> {
        if self.ensure_ready(PendingCall::AuthNone)? {
            return self.finish().await;
        }
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let user = self.user_or_default(user);
        self.write_auth_request(&user, "none");
        self.transmit(AuthState::None, PendingCall::AuthNone, 0).await?;
        self.finish().await
    }

    /// Try to authenticate by password. The password must be UTF-8 encoded.
    pub async fn authenticate_password(
        &mut self,
        user: Option<&str>,
        password: &str,
    ) -> Result<AuthResult, Error> {
        if self.ensure_ready(PendingCall::AuthPassword)? {
            return self.finish().await;
        }
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let user = self.user_or_default(user);
        self.write_auth_request(&user, "password");
        self.buffer.push(0);
        self.buffer.extend_ssh_string(password.as_bytes());
        self.transmit(AuthState::None, PendingCall::AuthPassword, 0)
            .await?;
        self.finish().await
    }

    /// Offer a public key without signing anything, to ask whether the
    /// server would accept authentication with it. On [`AuthResult::Success`]
    /// the key is acceptable and
    /// [`authenticate_publickey`](Session::authenticate_publickey) should
    /// follow.
    pub async fn authenticate_try_publickey(
        &mut self,
        user: Option<&str>,
        key: &PublicKey,
    ) -> Result<AuthResult, Error> {
        if self.ensure_ready(PendingCall::AuthOfferPubkey)? {
            return self.finish().await;
        }
        let user = self.user_or_default(user);
        self.offer_publickey(PendingCall::AuthOfferPubkey, &user, key)
            .await
    }

    /// Send a `publickey` offer under the given pending marker and await the
    /// verdict. Resuming a pending call is the caller's business.
    async fn offer_publickey(
        &mut self,
        marker: PendingCall,
        user: &str,
        key: &PublicKey,
    ) -> Result<AuthResult, Error> {
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let algo = key.algorithm();
        let blob = key.key_data().encoded()?;
        self.write_auth_request(user, "publickey");
        self.buffer.push(0);
        self.buffer.extend_ssh_string(algo.as_str().as_bytes());
        self.buffer.extend_ssh_string(&blob);
        self.transmit(AuthState::None, marker, 0).await?;
        self.finish().await
    }

    /// Authenticate with a private key, signing the request bound to the
    /// session identifier (RFC 4252 §7).
    pub async fn authenticate_publickey(
        &mut self,
        user: Option<&str>,
        key: &PrivateKeyWithHashAlg,
    ) -> Result<AuthResult, Error> {
        if self.ensure_ready(PendingCall::AuthPubkey)? {
            return self.finish().await;
        }
        let user = self.user_or_default(user);
        self.sign_publickey(PendingCall::AuthPubkey, &user, key).await
    }

    /// Send a signed `publickey` request under the given pending marker and
    /// await the verdict.
    async fn sign_publickey(
        &mut self,
        marker: PendingCall,
        user: &str,
        key: &PrivateKeyWithHashAlg,
    ) -> Result<AuthResult, Error> {
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let algo = key.algorithm();
        let blob = key.public_key().key_data().encoded()?;
        let i0 = self.make_to_sign(user, &algo, &blob);
        let sig = match keys::sign_with_hash_alg(key, &self.buffer) {
            Ok(sig) => sig,
            Err(e) => {
                self.buffer.clear();
                return Err(e.into());
            }
        };
        self.buffer.extend_ssh_string(&sig);
        self.transmit(AuthState::None, marker, i0).await?;
        self.finish().await
    }

    /// Clear the cascade bookkeeping once a cascade driver call terminates.
    /// Also drops the pending marker for the rare case where a cascade ends
    /// without settling a resumed request (e.g. the agent shrank its
    /// identity list between calls).
    fn reset_cascade(&mut self) {
        self.pending = PendingCall::None;
        self.cascade_index = 0;
        self.cascade_phase = CascadePhase::Offer;
        self.cascade_in_files = false;
    }

    /// Try public-key authentication with every identity held by the
    /// attached agent. The agent signs on the session's behalf; the private
    /// keys never leave it. Returns [`AuthResult::Denied`] when no agent is
    /// attached or every identity was refused.
    pub async fn authenticate_agent(&mut self, user: Option<&str>) -> Result<AuthResult, Error> {
        if self.poisoned {
            return Err(Error::Inconsistent);
        }
        match self.pending {
            PendingCall::None | PendingCall::AuthAgent => {}
            _ => return Err(Error::AuthPending),
        }
        let mut agent = match self.agent.take() {
            Some(agent) => agent,
            None => return Ok(AuthResult::Denied),
        };
        let user = self.user_or_default(user);
        let r = self
            .agent_cascade(PendingCall::AuthAgent, &user, &mut *agent)
            .await;
        self.agent = Some(agent);
        if !matches!(r, Ok(AuthResult::Again)) {
            self.reset_cascade();
        }
        r
    }

    /// Offer and sign with each agent identity in turn, under the calling
    /// driver's pending marker. Only the identity at the saved cursor can
    /// have a request in flight from a previous would-blocked call;
    /// `cascade_phase` records whether that request was the offer or the
    /// signature.
    async fn agent_cascade(
        &mut self,
        marker: PendingCall,
        user: &str,
        agent: &mut dyn Agent,
    ) -> Result<AuthResult, Error> {
        let identities = agent.request_identities().await?;
        let mut resume = self.pending == marker;
        let start = self.cascade_index;
        for (i, key) in identities.iter().enumerate().skip(start) {
            self.cascade_index = i;

            if !(resume && self.cascade_phase == CascadePhase::Sign) {
                let r = if resume {
                    resume = false;
                    self.finish().await?
                } else {
                    debug!("trying agent identity {}", key.comment());
                    self.cascade_phase = CascadePhase::Offer;
                    self.offer_publickey(marker, user, key).await?
                };
                match r {
                    AuthResult::Again => return Ok(AuthResult::Again),
                    AuthResult::Success => {
                        debug!("agent identity {} accepted by server", key.comment())
                    }
                    _ => {
                        debug!("agent identity {} refused by server", key.comment());
                        continue;
                    }
                }
            }

            let r = if resume {
                resume = false;
                self.finish().await?
            } else {
                self.cascade_phase = CascadePhase::Sign;
                self.sign_publickey_with_agent(marker, user, key, agent)
                    .await?
            };
            match r {
                AuthResult::Again => return Ok(AuthResult::Again),
                AuthResult::Success => return Ok(AuthResult::Success),
                _ => info!("server accepted the agent key but refused the signature"),
            }
        }
        Ok(AuthResult::Denied)
    }

    /// Submit an agent-signed `publickey` request for an identity whose
    /// offer was accepted.
    async fn sign_publickey_with_agent(
        &mut self,
        marker: PendingCall,
        user: &str,
        key: &PublicKey,
        agent: &mut dyn Agent,
    ) -> Result<AuthResult, Error> {
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let algo = key.algorithm();
        let blob = key.key_data().encoded()?;
        let i0 = self.make_to_sign(user, &algo, &blob);
        let sig = match agent.sign_request(key, &self.buffer).await {
            Ok(sig) => sig,
            Err(e) => {
                self.buffer.clear();
                return Err(e);
            }
        };
        self.buffer.extend_ssh_string(&sig);
        self.transmit(AuthState::None, marker, i0).await?;
        self.finish().await
    }

    /// Tries to authenticate automatically with public keys: first every
    /// agent identity, then the configured identity files in order. For a
    /// file without a `.pub` next to it, the private key is read (using
    /// `passphrase`, or `prompt` if it is encrypted and no passphrase was
    /// given) and the public half is derived and persisted best-effort.
    pub async fn authenticate_publickey_auto(
        &mut self,
        user: Option<&str>,
        passphrase: Option<&str>,
        prompt: Option<&PassphrasePrompt>,
    ) -> Result<AuthResult, Error> {
        if self.poisoned {
            return Err(Error::Inconsistent);
        }
        match self.pending {
            PendingCall::None | PendingCall::AuthAuto => {}
            _ => return Err(Error::AuthPending),
        }

        if !self.cascade_in_files {
            if let Some(mut agent) = self.agent.take() {
                let user = self.user_or_default(user);
                let r = self
                    .agent_cascade(PendingCall::AuthAuto, &user, &mut *agent)
                    .await;
                self.agent = Some(agent);
                match r {
                    Ok(AuthResult::Again) => return Ok(AuthResult::Again),
                    Ok(AuthResult::Success) => {
                        self.reset_cascade();
                        return Ok(AuthResult::Success);
                    }
                    Ok(r) => {
                        debug!("agent authentication did not complete: {:?}", r);
                        self.reset_cascade();
                    }
                    Err(e) => {
                        self.reset_cascade();
                        return Err(e);
                    }
                }
            }
        }

        self.cascade_in_files = true;
        let user = self.user_or_default(user);
        let r = self.identity_files_cascade(&user, passphrase, prompt).await;
        if !matches!(r, Ok(AuthResult::Again)) {
            self.reset_cascade();
        }
        r
    }

    async fn identity_files_cascade(
        &mut self,
        user: &str,
        passphrase: Option<&str>,
        prompt: Option<&PassphrasePrompt>,
    ) -> Result<AuthResult, Error> {
        let files = self.config.identity_files.clone();
        let mut resume = self.pending == PendingCall::AuthAuto;
        let start = self.cascade_index;
        for (i, path) in files.iter().enumerate().skip(start) {
            self.cascade_index = i;

            let mut offered = false;
            if resume {
                resume = false;
                if self.cascade_phase == CascadePhase::Sign {
                    // the signature request for this identity is already in
                    // flight; settle it without re-reading the key
                    match self.finish().await? {
                        AuthResult::Again => return Ok(AuthResult::Again),
                        AuthResult::Success => {
                            info!("successfully authenticated using {}", path.display());
                            return Ok(AuthResult::Success);
                        }
                        _ => {
                            info!("server accepted the public key but refused the signature");
                            continue;
                        }
                    }
                }
                match self.finish().await? {
                    AuthResult::Again => return Ok(AuthResult::Again),
                    AuthResult::Success => offered = true,
                    _ => {
                        debug!("public key for {} refused by server", path.display());
                        continue;
                    }
                }
            }

            let mut privkey = None;
            if !offered {
                debug!("trying to authenticate with {}", path.display());
                let pubkey_path = public_key_path(path);
                let pubkey = match keys::load_public_key(&pubkey_path) {
                    Ok(k) => k,
                    Err(Error::IO(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
                        // no public file: read the private key and save the
                        // public half next to it
                        let Some(k) = load_identity(path, passphrase, prompt) else {
                            continue;
                        };
                        let public = k.public_key().clone();
                        if let Err(e) = keys::write_public_key(&pubkey_path, &public) {
                            warn!(
                                "could not write public key to {}: {}",
                                pubkey_path.display(),
                                e
                            );
                        }
                        privkey = Some(k);
                        public
                    }
                    Err(e) => {
                        warn!(
                            "failed to import public key {}: {}",
                            pubkey_path.display(),
                            e
                        );
                        continue;
                    }
                };

                self.cascade_phase = CascadePhase::Offer;
                match self
                    .offer_publickey(PendingCall::AuthAuto, user, &pubkey)
                    .await?
                {
                    AuthResult::Again => return Ok(AuthResult::Again),
                    AuthResult::Success => {}
                    _ => {
                        debug!("public key {} refused by server", pubkey_path.display());
                        continue;
                    }
                }
            }

            // the key was accepted; make sure the private half is loaded
            let privkey = match privkey {
                Some(k) => k,
                None => match load_identity(path, passphrase, prompt) {
                    Some(k) => k,
                    None => continue,
                },
            };
            let privkey = PrivateKeyWithHashAlg::new(Arc::new(privkey), None);
            self.cascade_phase = CascadePhase::Sign;
            match self
                .sign_publickey(PendingCall::AuthAuto, user, &privkey)
                .await?
            {
                AuthResult::Again => return Ok(AuthResult::Again),
                AuthResult::Success => {
                    info!("successfully authenticated using {}", path.display());
                    return Ok(AuthResult::Success);
                }
                _ => info!("server accepted the public key but refused the signature"),
            }
        }
        debug!("tried every public key, none matched");
        Ok(AuthResult::Denied)
    }

    /// Try to authenticate through the `keyboard-interactive` method
    /// (RFC 4256).
    ///
    /// The first call sends the initial request; when it returns
    /// [`AuthResult::Info`], answer the prompts with
    /// [`kbdint_set_answer`](Session::kbdint_set_answer) and call this again
    /// to submit them. The server may keep sending challenges (including
    /// empty ones) until it settles the attempt.
    pub async fn authenticate_keyboard_interactive(
        &mut self,
        user: Option<&str>,
        submethods: Option<&str>,
    ) -> Result<AuthResult, Error> {
        if self.ensure_ready(PendingCall::AuthKeyboardInteractive)? {
            return self.finish().await;
        }
        if self.kbdint.is_some() {
            self.kbdint_send().await
        } else {
            self.kbdint_init(user, submethods).await
        }
    }

    /// First packet of the exchange (RFC 4256 §3.1).
    async fn kbdint_init(
        &mut self,
        user: Option<&str>,
        submethods: Option<&str>,
    ) -> Result<AuthResult, Error> {
        if !self.request_userauth_service().await? {
            return Ok(AuthResult::Again);
        }
        let user = self.user_or_default(user);
        self.write_auth_request(&user, "keyboard-interactive");
        // deprecated language tag
        self.buffer.extend_ssh_string(b"");
        self.buffer
            .extend_ssh_string(submethods.unwrap_or("").as_bytes());
        self.transmit(
            AuthState::KbdintSent,
            PendingCall::AuthKeyboardInteractive,
            0,
        )
        .await?;
        self.finish().await
    }

    /// Send the answers to the current challenge and wait for the server's
    /// verdict. Consumes the scratch; prompts and answers are zeroed as they
    /// drop.
    async fn kbdint_send(&mut self) -> Result<AuthResult, Error> {
        let kbdint = match self.kbdint.take() {
            Some(kbdint) => kbdint,
            None => return Err(Error::NoKbdintExchange),
        };
        self.write_info_response(&kbdint);
        drop(kbdint);
        self.transmit(
            AuthState::KbdintSent,
            PendingCall::AuthKeyboardInteractive,
            0,
        )
        .await?;
        self.finish().await
    }

    /// Number of prompts in the current keyboard-interactive challenge.
    pub fn kbdint_nprompts(&self) -> usize {
        self.kbdint.as_ref().map_or(0, |k| k.prompts.len())
    }

    /// The "name" of the current challenge's message block.
    pub fn kbdint_name(&self) -> Option<&str> {
        self.kbdint.as_ref().map(|k| k.name.as_str())
    }

    /// The instruction of the current challenge's message block.
    pub fn kbdint_instruction(&self) -> Option<&str> {
        self.kbdint.as_ref().map(|k| k.instruction.as_str())
    }

    /// The `i`-th prompt of the current challenge, or `None` past the end.
    pub fn kbdint_prompt(&self, i: usize) -> Option<&Prompt> {
        self.kbdint.as_ref().and_then(|k| k.prompts.get(i))
    }

    /// Record the answer to the `i`-th prompt. Any previous answer is zeroed
    /// before being replaced.
    pub fn kbdint_set_answer(&mut self, i: usize, answer: &str) -> Result<(), Error> {
        let kbdint = match self.kbdint.as_mut() {
            Some(kbdint) => kbdint,
            None => return Err(Error::NoKbdintExchange),
        };
        if kbdint.set_answer(i, answer) {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds)
        }
    }
}

fn public_key_path(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_owned();
    p.push(".pub");
    PathBuf::from(p)
}

/// Read a private key file, decrypting it if needed with the passphrase or
/// the prompt callback. Returns `None` (after logging) for every failure:
/// the automatic cascade treats those as "skip this identity".
fn load_identity(
    path: &Path,
    passphrase: Option<&str>,
    prompt: Option<&PassphrasePrompt>,
) -> Option<PrivateKey> {
    match keys::load_secret_key(path, passphrase) {
        Ok(k) => Some(k),
        Err(Error::KeyIsEncrypted) => {
            let text = format!("Enter passphrase for key '{}': ", path.display());
            let passphrase = prompt.and_then(|f| f(&text))?;
            match keys::load_secret_key(path, Some(&passphrase)) {
                Ok(k) => Some(k),
                Err(e) => {
                    warn!("failed to decrypt private key {}: {}", path.display(), e);
                    None
                }
            }
        }
        Err(Error::IO(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("private key {} doesn't exist", path.display());
            None
        }
        Err(e) => {
            warn!("failed to read private key {}: {}", path.display(), e);
            None
        }
    }
}
