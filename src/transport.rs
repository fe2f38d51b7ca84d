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

use async_trait::async_trait;
use russh_cryptovec::CryptoVec;

use crate::Error;

/// The framed packet transport the authentication exchange runs over.
///
/// Implementations sit on top of an established, encrypted SSH transport
/// (RFC 4253), after key exchange and before the connection layer. The
/// session only ever deals in packet payloads; framing, encryption and MACs
/// belong to the implementor.
///
/// A non-blocking transport signals would-block by returning `Ok(None)`
/// from [`recv`](Transport::recv) (and `Ok(false)` from
/// [`request_service`](Transport::request_service)); the driver then
/// surfaces [`AuthResult::Again`](crate::auth::AuthResult::Again) and the
/// caller re-enters the same driver later.
#[async_trait]
pub trait Transport: Send {
    /// The exchange hash of the first key exchange. Public-key signatures
    /// are bound to this value.
    fn session_id(&self) -> &[u8];

    /// Request the named service (RFC 4253 §10). Returns `Ok(false)` when
    /// the transport is non-blocking and the accept has not arrived yet.
    async fn request_service(&mut self, name: &str) -> Result<bool, Error>;

    /// Send one packet payload.
    async fn send(&mut self, payload: &[u8]) -> Result<(), Error>;

    /// Receive the next packet payload, or `Ok(None)` when a non-blocking
    /// socket would block.
    async fn recv(&mut self) -> Result<Option<CryptoVec>, Error>;

    /// Activate `zlib@openssh.com` compression on both directions, if the
    /// negotiated suite deferred it. Called exactly once, when
    /// `SSH_MSG_USERAUTH_SUCCESS` is received.
    fn enable_delayed_compression(&mut self) {}
}
