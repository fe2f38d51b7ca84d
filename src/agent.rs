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
use ssh_key::PublicKey;

use crate::Error;

/// Client to an external key custodian, typically `ssh-agent`.
///
/// The agent holds the private keys; the session never sees them. During the
/// agent cascade each identity is offered to the server, and for an accepted
/// identity the agent is asked to sign the authentication request.
#[async_trait]
pub trait Agent: Send {
    /// The public keys the agent currently holds, in its preferred order.
    async fn request_identities(&mut self) -> Result<Vec<PublicKey>, Error>;

    /// Ask the agent to sign `data` with the private half of `key`.
    ///
    /// The returned bytes are the signature payload in SSH form
    /// (`string algo, string sig`), without an outer length prefix.
    async fn sign_request(&mut self, key: &PublicKey, data: &[u8]) -> Result<Vec<u8>, Error>;
}
