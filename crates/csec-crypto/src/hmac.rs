//! HMAC (RFC 2104) built from two streaming engines.
//!
//! The key is normalized once into a block-sized buffer (digested if longer
//! than a block, zero-padded if shorter). That buffer is reused by
//! [`Hmac::reset`] and [`Hmac::restart`] and wiped on drop.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use csec_core::HashAlgorithm;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::registry::{digest_descriptor, MAX_DIGEST_LEN, MAX_HASH_BLOCK_SIZE};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

pub struct Hmac {
    algorithm: HashAlgorithm,
    key_block: Zeroizing<Vec<u8>>,
    inner: Engine,
    outer: Engine,
}

impl Hmac {
    pub fn new(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self, EngineError> {
        let block_size = digest_descriptor(algorithm).block_size;
        let mut hmac = Self {
            algorithm,
            key_block: Zeroizing::new(vec![0u8; block_size]),
            inner: Engine::new(algorithm)?,
            outer: Engine::new(algorithm)?,
        };
        hmac.reset(key)?;
        tracing::trace!(%algorithm, "hmac created");
        Ok(hmac)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn output_len(&self) -> usize {
        self.outer.output_len()
    }

    /// Install a new key and start a fresh MAC computation.
    pub fn reset(&mut self, key: &[u8]) -> Result<&mut Self, EngineError> {
        self.key_block.as_mut_slice().zeroize();
        if key.len() > self.key_block.len() {
            self.inner.reset()?;
            self.inner.update(key)?;
            let mut hashed = Zeroizing::new([0u8; MAX_DIGEST_LEN]);
            let n = self.inner.finalize_into(&mut hashed[..])?;
            self.key_block[..n].copy_from_slice(&hashed[..n]);
        } else {
            self.key_block[..key.len()].copy_from_slice(key);
        }
        self.restart()
    }

    /// Start a fresh MAC computation under the current key.
    pub fn restart(&mut self) -> Result<&mut Self, EngineError> {
        let block_size = self.key_block.len();
        let mut pad = Zeroizing::new([0u8; MAX_HASH_BLOCK_SIZE]);

        for (p, k) in pad.iter_mut().zip(self.key_block.iter()) {
            *p = k ^ IPAD;
        }
        self.inner.reset()?;
        self.inner.update(&pad[..block_size])?;

        for (p, k) in pad.iter_mut().zip(self.key_block.iter()) {
            *p = k ^ OPAD;
        }
        self.outer.reset()?;
        self.outer.update(&pad[..block_size])?;
        Ok(self)
    }

    pub fn update(&mut self, data: &[u8]) -> Result<&mut Self, EngineError> {
        self.inner.update(data)?;
        Ok(self)
    }

    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        let needed = self.output_len();
        if out.len() < needed {
            return Err(EngineError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }
        let mut inner_digest = Zeroizing::new([0u8; MAX_DIGEST_LEN]);
        let n = self.inner.finalize_into(&mut inner_digest[..])?;
        self.outer.update(&inner_digest[..n])?;
        self.outer.finalize_into(out)
    }

    pub fn finalize(&mut self) -> Result<Vec<u8>, EngineError> {
        let mut out = vec![0u8; self.output_len()];
        self.finalize_into(&mut out)?;
        Ok(out)
    }

    /// Finalize and compare against `expected` in constant time.
    pub fn verify(&mut self, expected: &[u8]) -> Result<bool, EngineError> {
        let tag = Zeroizing::new(self.finalize()?);
        Ok(bool::from(tag.as_slice().ct_eq(expected)))
    }
}

impl std::fmt::Debug for Hmac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hmac")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// One-shot HMAC of `data` under `key`.
pub fn hmac(algorithm: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, EngineError> {
    let mut mac = Hmac::new(algorithm, key)?;
    mac.update(data)?;
    mac.finalize()
}
