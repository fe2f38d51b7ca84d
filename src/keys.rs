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

//! Key material: loading identity files, deriving and persisting public
//! halves, and producing authentication signatures.

use std::io::Read;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use ssh_encoding::Encode;
use ssh_key::{Algorithm, HashAlg, PrivateKey, PublicKey};

use crate::Error;

#[doc(hidden)]
pub trait EncodedExt {
    fn encoded(&self) -> ssh_key::Result<Vec<u8>>;
}

impl<E: Encode> EncodedExt for E {
    fn encoded(&self) -> ssh_key::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// Helper structure to correlate a key and (in case of RSA) a hash
/// algorithm. Only used for authentication, not key storage, as RSA keys do
/// not inherently have a hash algorithm associated with them.
#[derive(Clone, Debug)]
pub struct PrivateKeyWithHashAlg {
    key: Arc<PrivateKey>,
    hash_alg: Option<HashAlg>,
}

impl PrivateKeyWithHashAlg {
    /// Direct constructor.
    ///
    /// For RSA, passing `None` is mapped to the legacy `ssh-rsa` (SHA-1).
    /// For other keys, `hash_alg` is ignored.
    pub fn new(key: Arc<PrivateKey>, mut hash_alg: Option<HashAlg>) -> Self {
        if !matches!(key.algorithm(), Algorithm::Rsa { .. }) {
            hash_alg = None;
        }
        Self { key, hash_alg }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.key.algorithm() {
            Algorithm::Rsa { .. } => Algorithm::Rsa {
                hash: self.hash_alg,
            },
            x => x,
        }
    }

    pub fn hash_alg(&self) -> Option<HashAlg> {
        self.hash_alg
    }
}

impl Deref for PrivateKeyWithHashAlg {
    type Target = PrivateKey;

    fn deref(&self) -> &Self::Target {
        &self.key
    }
}

/// Sign `data`, returning the signature payload (`string algo, string sig`).
pub(crate) fn sign_with_hash_alg(
    key: &PrivateKeyWithHashAlg,
    data: &[u8],
) -> ssh_key::Result<Vec<u8>> {
    Ok(match key.key_data() {
        #[cfg(feature = "rsa")]
        ssh_key::private::KeypairData::Rsa(rsa_keypair) => {
            signature::Signer::try_sign(&(rsa_keypair, key.hash_alg()), data)?.encoded()?
        }
        keypair => signature::Signer::try_sign(keypair, data)?.encoded()?,
    })
}

/// Load a public key from a file in OpenSSH format
/// (`ssh-ed25519 AAAA... comment`).
pub fn load_public_key<P: AsRef<Path>>(path: P) -> Result<PublicKey, Error> {
    let mut pubkey = String::new();
    let mut file = std::fs::File::open(path.as_ref())?;
    file.read_to_string(&mut pubkey)?;

    Ok(PublicKey::from_openssh(&pubkey)?)
}

/// Load a secret key, deciphering it with the supplied password if
/// necessary.
pub fn load_secret_key<P: AsRef<Path>>(
    secret_: P,
    password: Option<&str>,
) -> Result<PrivateKey, Error> {
    let mut secret_file = std::fs::File::open(secret_)?;
    let mut secret = String::new();
    secret_file.read_to_string(&mut secret)?;
    decode_secret_key(&secret, password)
}

/// Parse a secret key in the OpenSSH PEM format, deciphering it with the
/// supplied password if necessary.
pub fn decode_secret_key(secret: &str, password: Option<&str>) -> Result<PrivateKey, Error> {
    let key = PrivateKey::from_openssh(secret)?;
    if !key.is_encrypted() {
        return Ok(key);
    }
    match password {
        Some(password) => Ok(key.decrypt(password)?),
        None => Err(Error::KeyIsEncrypted),
    }
}

/// Write a public key to a file in OpenSSH format.
pub fn write_public_key<P: AsRef<Path>>(path: P, key: &PublicKey) -> Result<(), Error> {
    let mut line = key.to_openssh()?;
    line.push('\n');
    std::fs::write(path.as_ref(), line.as_bytes())?;
    Ok(())
}
