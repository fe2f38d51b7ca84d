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

//! SSH wire primitives (RFC 4251 §5) over [`CryptoVec`] and byte slices.

use byteorder::{BigEndian, ByteOrder};
use russh_cryptovec::CryptoVec;

use crate::Error;

/// Appending SSH-encoded values to an outgoing packet buffer.
pub trait Encoding {
    /// Push an SSH `string`: a big-endian `uint32` length followed by the
    /// raw bytes.
    fn extend_ssh_string(&mut self, s: &[u8]);
}

impl Encoding for CryptoVec {
    fn extend_ssh_string(&mut self, s: &[u8]) {
        self.push_u32_be(s.len() as u32);
        self.extend(s);
    }
}

/// Obtain a decoding cursor over a received packet.
pub trait Reader {
    fn reader(&self, starting_at: usize) -> Position;
}

impl Reader for CryptoVec {
    fn reader(&self, starting_at: usize) -> Position {
        Position {
            s: self.as_ref(),
            position: starting_at,
        }
    }
}

impl Reader for [u8] {
    fn reader(&self, starting_at: usize) -> Position {
        Position {
            s: self,
            position: starting_at,
        }
    }
}

/// Decoding cursor, returned by [`Reader::reader`].
pub struct Position<'a> {
    s: &'a [u8],
    pub position: usize,
}

impl<'a> Position<'a> {
    pub fn read_string(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u32()? as usize;
        if self.position + len <= self.s.len() {
            #[allow(clippy::indexing_slicing)] // length checked
            let result = &self.s[self.position..(self.position + len)];
            self.position += len;
            Ok(result)
        } else {
            Err(Error::IndexOutOfBounds)
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        if self.position + 4 <= self.s.len() {
            #[allow(clippy::indexing_slicing)] // length checked
            let u = BigEndian::read_u32(&self.s[self.position..]);
            self.position += 4;
            Ok(u)
        } else {
            Err(Error::IndexOutOfBounds)
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, Error> {
        if let Some(&u) = self.s.get(self.position) {
            self.position += 1;
            Ok(u)
        } else {
            Err(Error::IndexOutOfBounds)
        }
    }
}
