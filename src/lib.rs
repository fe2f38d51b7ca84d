#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#![allow(clippy::single_match)]
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

//! Client side of the SSH authentication protocol (RFC 4252), the phase
//! between transport-layer key exchange and the connection layer.
//!
//! This crate does not open sockets or encrypt anything: it drives the
//! `ssh-userauth` service over a caller-supplied [`Transport`](transport::Transport)
//! that frames, encrypts and delivers SSH packets. On top of that seam it
//! provides one resumable driver per authentication method — `none`,
//! `password`, `publickey` (offer, sign, and agent-delegated),
//! `keyboard-interactive` (RFC 4256) — plus an automatic cascade that tries
//! agent identities and identity files in order.
//!
//! Drivers return [`AuthResult`](auth::AuthResult) for the protocol
//! outcomes (success, denial, partial success, a keyboard-interactive
//! challenge, or would-block on a non-blocking transport) and `Err` for
//! fatal conditions. A would-block return leaves the call *pending*; only
//! the same driver may be called until it completes.
//!
//! Passwords, keyboard-interactive answers and prompt text are kept in
//! [`CryptoVec`]s, which zero their memory before releasing it.

use thiserror::Error;

pub use russh_cryptovec::CryptoVec;

pub mod agent;
pub mod auth;
pub mod client;
pub mod encoding;
pub mod keys;
mod msg;
pub mod transport;

#[derive(Debug, Error)]
pub enum Error {
    /// The protocol is in an inconsistent state, or a malformed or
    /// unexpected packet was received. The session refuses further
    /// authentication calls.
    #[error("Inconsistent state of the protocol")]
    Inconsistent,

    /// A driver was entered while a call to a different driver is pending.
    #[error("Another authentication request is pending")]
    AuthPending,

    /// The server asked for an unreasonable number of keyboard-interactive
    /// prompts.
    #[error("Wrong number of prompts requested by the server: {0}")]
    KbdintPromptCount(u32),

    /// No keyboard-interactive exchange is in progress.
    #[error("No keyboard-interactive exchange in progress")]
    NoKbdintExchange,

    /// Index out of bounds.
    #[error("Index out of bounds")]
    IndexOutOfBounds,

    /// The key is encrypted and no passphrase was supplied.
    #[error("The private key is encrypted, a passphrase is required")]
    KeyIsEncrypted,

    /// The agent reported a failure.
    #[error("Agent failure")]
    AgentFailure,

    #[error(transparent)]
    Keys(#[from] ssh_key::Error),

    #[error(transparent)]
    SshEncoding(#[from] ssh_encoding::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}
