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

use bitflags::bitflags;
use russh_cryptovec::CryptoVec;

bitflags! {
    /// Set of authentication methods, represented by bit flags.
    ///
    /// Rebuilt from the comma-separated list the server sends in
    /// `SSH_MSG_USERAUTH_FAILURE`; unrecognized names are ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodSet: u32 {
        /// The SSH `password` method (plaintext passwords).
        const PASSWORD = 1;
        /// The SSH `publickey` method (sign a challenge sent by the
        /// server).
        const PUBLICKEY = 2;
        /// The SSH `hostbased` method (certain hostnames are allowed
        /// by the server).
        const HOSTBASED = 4;
        /// The SSH `keyboard-interactive` method (answer to a
        /// challenge, where the "challenge" can be a password prompt,
        /// a one-time token, or something else).
        const KEYBOARD_INTERACTIVE = 8;
    }
}

impl MethodSet {
    pub(crate) fn from_method_name(name: &[u8]) -> Option<MethodSet> {
        match name {
            b"password" => Some(MethodSet::PASSWORD),
            b"publickey" => Some(MethodSet::PUBLICKEY),
            b"hostbased" => Some(MethodSet::HOSTBASED),
            b"keyboard-interactive" => Some(MethodSet::KEYBOARD_INTERACTIVE),
            _ => None,
        }
    }
}

/// Outcome of a single authentication driver call.
///
/// Fatal conditions (malformed packets, re-entrancy violations, transport
/// failures) are reported as [`Error`](crate::Error) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    /// The credential was accepted; for a public-key offer, the server is
    /// willing to accept a signature with that key.
    Success,
    /// The server rejected the credential.
    Denied,
    /// The credential was accepted but the server requires another method
    /// before granting access.
    Partial,
    /// A keyboard-interactive challenge arrived and is waiting for answers.
    Info,
    /// The transport would block; call the same driver again to resume.
    Again,
}

impl AuthResult {
    pub fn success(&self) -> bool {
        matches!(self, AuthResult::Success)
    }
}

/// Authentication state, advanced both by the drivers and by the packet
/// handlers. `None` and `KbdintSent` mean "keep waiting"; everything else
/// terminates the current driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthState {
    None,
    KbdintSent,
    Info,
    PkOk,
    Partial,
    Failed,
    Success,
    Error,
}

impl AuthState {
    pub(crate) fn is_terminal(self) -> bool {
        !matches!(self, AuthState::None | AuthState::KbdintSent)
    }
}

/// Single-slot marker for the driver call currently in flight. A driver
/// returning [`AuthResult::Again`] leaves its marker set; only the same
/// driver may be re-entered until the call terminates. Every public driver
/// owns a distinct marker, so the cascades (`AuthAgent`, `AuthAuto`) can
/// never mistake a request left pending by a standalone publickey driver
/// for one of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingCall {
    None,
    AuthNone,
    AuthPassword,
    AuthOfferPubkey,
    AuthPubkey,
    AuthAgent,
    AuthAuto,
    AuthKeyboardInteractive,
}

/// Which half of a public-key cascade step is in flight while a cascade
/// driver is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CascadePhase {
    Offer,
    Sign,
}

/// Ceiling on the number of prompts accepted in a single
/// `SSH_MSG_USERAUTH_INFO_REQUEST`.
pub(crate) const KBDINT_MAX_PROMPT: u32 = 32;

/// One keyboard-interactive prompt, as sent by the server.
#[derive(Debug)]
pub struct Prompt {
    pub(crate) text: CryptoVec,
    pub(crate) echo: bool,
}

impl Prompt {
    /// The prompt text to display to the user.
    pub fn text(&self) -> &str {
        // validated on receipt
        std::str::from_utf8(&self.text).unwrap_or("")
    }

    /// Whether the user's input should be echoed. When `false`, the answer
    /// is sensitive (typically a password).
    pub fn echo(&self) -> bool {
        self.echo
    }
}

/// Per-exchange scratch for a keyboard-interactive conversation, replaced on
/// every `INFO_REQUEST` and destroyed when the answers are sent. Prompt text
/// and answers live in [`CryptoVec`]s, which zero their memory on drop.
#[derive(Debug)]
pub(crate) struct Kbdint {
    pub name: String,
    pub instruction: String,
    pub prompts: Vec<Prompt>,
    /// Lazily allocated on the first answer; once allocated, always the same
    /// length as `prompts`. An empty slot is sent as an empty string.
    pub answers: Vec<CryptoVec>,
}

impl Kbdint {
    pub fn set_answer(&mut self, i: usize, answer: &str) -> bool {
        if self.answers.is_empty() {
            self.answers.resize_with(self.prompts.len(), CryptoVec::new);
        }
        match self.answers.get_mut(i) {
            Some(slot) => {
                // dropping the previous value zeroes it
                *slot = CryptoVec::from_slice(answer.as_bytes());
                true
            }
            None => false,
        }
    }
}
