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

//! Reception of server-initiated authentication packets, and construction
//! of outgoing `USERAUTH_REQUEST`s.

use log::{debug, error, info, trace, warn};
use russh_cryptovec::CryptoVec;
use ssh_key::Algorithm;

use crate::auth::{AuthState, Kbdint, MethodSet, Prompt, KBDINT_MAX_PROMPT};
use crate::client::Session;
use crate::encoding::{Encoding, Reader};
use crate::transport::Transport;
use crate::{msg, Error};

impl<T: Transport> Session<T> {
    /// Route one received packet to its handler. Message number 60 is
    /// overloaded (`USERAUTH_PK_OK` vs `USERAUTH_INFO_REQUEST`); the current
    /// authentication state decides which parser runs.
    pub(crate) fn process_packet(&mut self, buf: &[u8]) -> Result<(), Error> {
        match buf.first() {
            Some(&msg::USERAUTH_BANNER) => self.server_banner(buf),
            Some(&msg::USERAUTH_FAILURE) => self.server_failure(buf),
            Some(&msg::USERAUTH_SUCCESS) => self.server_success(),
            Some(&msg::USERAUTH_INFO_REQUEST_OR_USERAUTH_PK_OK) => {
                if self.auth_state == AuthState::KbdintSent {
                    trace!("keyboard-interactive context, assuming USERAUTH_INFO_REQUEST");
                    self.server_info_request(buf)
                } else {
                    trace!("assuming USERAUTH_PK_OK");
                    self.auth_state = AuthState::PkOk;
                    Ok(())
                }
            }
            Some(&msg::IGNORE) | Some(&msg::DEBUG) => {
                debug!("ignoring IGNORE/DEBUG received during authentication");
                Ok(())
            }
            Some(&msg::EXT_INFO) => {
                debug!("ignoring EXT_INFO received during authentication");
                Ok(())
            }
            m => {
                debug!("unexpected message during authentication: {:?}", m);
                self.poison();
                Err(Error::Inconsistent)
            }
        }
    }

    /// The banner should be shown to the user prior to authentication. It
    /// never affects the authentication state.
    fn server_banner(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut r = buf.reader(1);
        match r.read_string() {
            Ok(banner) => {
                debug!("received USERAUTH_BANNER");
                self.banner = Some(String::from_utf8_lossy(banner).into_owned());
            }
            Err(_) => warn!("invalid USERAUTH_BANNER packet"),
        }
        Ok(())
    }

    /// Complete or partial failure. The continuation list replaces (or, on
    /// partial success, extends) the set of methods the server accepts.
    fn server_failure(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut r = buf.reader(1);
        let (list, partial) = match (r.read_string(), r.read_byte()) {
            (Ok(list), Ok(partial)) => (list, partial != 0),
            _ => {
                error!("invalid USERAUTH_FAILURE message");
                self.poison();
                return Err(Error::Inconsistent);
            }
        };

        if partial {
            self.auth_state = AuthState::Partial;
            debug!(
                "partial success, authentication that can continue: {:?}",
                String::from_utf8_lossy(list)
            );
        } else {
            self.auth_state = AuthState::Failed;
            self.auth_methods = MethodSet::empty();
            debug!(
                "access denied, authentication that can continue: {:?}",
                String::from_utf8_lossy(list)
            );
        }
        for name in list.split(|&c| c == b',') {
            if let Some(m) = MethodSet::from_method_name(name) {
                self.auth_methods |= m;
            }
        }
        Ok(())
    }

    /// The server granted access. This is the single point where delayed
    /// compression is activated.
    fn server_success(&mut self) -> Result<(), Error> {
        info!("authentication successful");
        self.auth_state = AuthState::Success;
        self.authenticated = true;
        self.transport.enable_delayed_compression();
        Ok(())
    }

    /// A keyboard-interactive challenge (RFC 4256 §3.2). Replaces any
    /// previous scratch; the replaced prompts and answers are zeroed as they
    /// drop.
    fn server_info_request(&mut self, buf: &[u8]) -> Result<(), Error> {
        match parse_info_request(buf) {
            Ok(kbdint) => {
                debug!("kbdint: {} prompts", kbdint.prompts.len());
                self.kbdint = Some(kbdint);
                self.auth_state = AuthState::Info;
                Ok(())
            }
            Err(e) => {
                error!("invalid USERAUTH_INFO_REQUEST message: {}", e);
                self.kbdint = None;
                self.poison();
                Err(e)
            }
        }
    }

    /// Append the `USERAUTH_REQUEST` prefix common to every method to the
    /// outgoing buffer.
    pub(crate) fn write_auth_request(&mut self, user: &str, method: &str) {
        self.buffer.clear();
        self.buffer.push(msg::USERAUTH_REQUEST);
        self.buffer.extend_ssh_string(user.as_bytes());
        self.buffer.extend_ssh_string(b"ssh-connection");
        self.buffer.extend_ssh_string(method.as_bytes());
    }

    /// Build the canonical buffer a public-key signature covers: the session
    /// identifier as an SSH string, then the full request from the message
    /// byte through the public-key blob (RFC 4252 §7). Returns the offset of
    /// the request itself; the signature is appended afterwards and the
    /// packet sent from that offset.
    pub(crate) fn make_to_sign(&mut self, user: &str, algo: &Algorithm, blob: &[u8]) -> usize {
        self.buffer.clear();
        self.buffer.extend_ssh_string(self.transport.session_id());

        let i0 = self.buffer.len();
        self.buffer.push(msg::USERAUTH_REQUEST);
        self.buffer.extend_ssh_string(user.as_bytes());
        self.buffer.extend_ssh_string(b"ssh-connection");
        self.buffer.extend_ssh_string(b"publickey");
        self.buffer.push(1);
        self.buffer.extend_ssh_string(algo.as_str().as_bytes());
        self.buffer.extend_ssh_string(blob);
        i0
    }

    /// Build the `USERAUTH_INFO_RESPONSE` for the current scratch. The
    /// number of responses always equals the number of prompts; unanswered
    /// prompts are sent as empty strings.
    pub(crate) fn write_info_response(&mut self, kbdint: &Kbdint) {
        self.buffer.clear();
        self.buffer.push(msg::USERAUTH_INFO_RESPONSE);
        self.buffer.push_u32_be(kbdint.prompts.len() as u32);
        for i in 0..kbdint.prompts.len() {
            match kbdint.answers.get(i) {
                Some(answer) => self.buffer.extend_ssh_string(answer),
                None => self.buffer.extend_ssh_string(b""),
            }
        }
    }
}

fn parse_info_request(buf: &[u8]) -> Result<Kbdint, Error> {
    let mut r = buf.reader(1);
    let name = std::str::from_utf8(r.read_string()?)?.to_string();
    let instruction = std::str::from_utf8(r.read_string()?)?.to_string();
    let _lang = r.read_string()?;
    let nprompts = r.read_u32()?;

    if nprompts == 0 || nprompts > KBDINT_MAX_PROMPT {
        return Err(Error::KbdintPromptCount(nprompts));
    }

    let mut prompts = Vec::with_capacity(nprompts as usize);
    for _ in 0..nprompts {
        let text = r.read_string()?;
        let echo = r.read_byte()? != 0;
        std::str::from_utf8(text)?;
        prompts.push(Prompt {
            text: CryptoVec::from_slice(text),
            echo,
        });
    }

    Ok(Kbdint {
        name,
        instruction,
        prompts,
        answers: Vec::new(),
    })
}
