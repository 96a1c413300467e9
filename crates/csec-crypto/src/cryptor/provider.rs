//! Provider cipher contexts: key schedules plus the chaining mode.
//!
//! Block transforms come from the RustCrypto cipher crates, with CBC chaining
//! from `cbc` and ECB applied straight on the key schedule. RC4 has no
//! variable-key implementation in that family, so its keystream generator
//! lives here.

use cipher::generic_array::GenericArray;
use cipher::{
    BlockCipher, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, InnerIvInit,
    InvalidLength, KeyInit,
};
use zeroize::{Zeroize, Zeroizing};

use csec_core::{CipherAlgorithm, Operation};

use crate::error::CryptorError;
use crate::registry::{cipher_descriptor, is_valid_key_size, MAX_CIPHER_BLOCK_SIZE};

/// One direction of a keyed block mode. `apply` takes exactly one block.
trait BlockMode: Send {
    fn apply(&mut self, block: &mut [u8]);
    /// Restart chaining from `iv`, which is exactly one block.
    fn load_iv(&mut self, iv: &[u8]) -> Result<(), InvalidLength>;
}

struct Ecb<C> {
    cipher: C,
    operation: Operation,
}

impl<C> BlockMode for Ecb<C>
where
    C: BlockEncrypt + BlockDecrypt + Send,
{
    fn apply(&mut self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self.operation {
            Operation::Encrypt => self.cipher.encrypt_block(block),
            Operation::Decrypt => self.cipher.decrypt_block(block),
        }
    }

    fn load_iv(&mut self, _iv: &[u8]) -> Result<(), InvalidLength> {
        Ok(())
    }
}

/// CBC encryption. The key schedule is kept so a new IV can re-seed the mode.
struct CbcEncrypt<C: BlockEncryptMut + BlockCipher> {
    cipher: C,
    mode: cbc::Encryptor<C>,
}

impl<C> CbcEncrypt<C>
where
    C: BlockEncryptMut + BlockCipher + Clone,
{
    fn new(cipher: C) -> Self {
        let mode = cbc::Encryptor::<C>::inner_iv_init(cipher.clone(), &GenericArray::default());
        Self { cipher, mode }
    }
}

impl<C> BlockMode for CbcEncrypt<C>
where
    C: BlockEncryptMut + BlockCipher + Clone + Send,
{
    fn apply(&mut self, block: &mut [u8]) {
        self.mode.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }

    fn load_iv(&mut self, iv: &[u8]) -> Result<(), InvalidLength> {
        self.mode = cbc::Encryptor::<C>::inner_iv_slice_init(self.cipher.clone(), iv)?;
        Ok(())
    }
}

/// CBC decryption, mirroring [`CbcEncrypt`].
struct CbcDecrypt<C: BlockDecryptMut + BlockCipher> {
    cipher: C,
    mode: cbc::Decryptor<C>,
}

impl<C> CbcDecrypt<C>
where
    C: BlockDecryptMut + BlockCipher + Clone,
{
    fn new(cipher: C) -> Self {
        let mode = cbc::Decryptor::<C>::inner_iv_init(cipher.clone(), &GenericArray::default());
        Self { cipher, mode }
    }
}

impl<C> BlockMode for CbcDecrypt<C>
where
    C: BlockDecryptMut + BlockCipher + Clone + Send,
{
    fn apply(&mut self, block: &mut [u8]) {
        self.mode.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }

    fn load_iv(&mut self, iv: &[u8]) -> Result<(), InvalidLength> {
        self.mode = cbc::Decryptor::<C>::inner_iv_slice_init(self.cipher.clone(), iv)?;
        Ok(())
    }
}

fn block_mode<C>(cipher: C, operation: Operation, ecb: bool) -> Box<dyn BlockMode>
where
    C: BlockEncrypt + BlockDecrypt + BlockCipher + Clone + Send + 'static,
{
    match (ecb, operation) {
        (true, _) => Box::new(Ecb { cipher, operation }),
        (false, Operation::Encrypt) => Box::new(CbcEncrypt::new(cipher)),
        (false, Operation::Decrypt) => Box::new(CbcDecrypt::new(cipher)),
    }
}

/// RC4 keystream generator. Keeps a copy of the key so `reset` can re-key.
pub struct Rc4 {
    key: Zeroizing<Vec<u8>>,
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    pub fn new(key: &[u8]) -> Result<Self, CryptorError> {
        if !is_valid_key_size(CipherAlgorithm::Rc4, key.len()) {
            return Err(CryptorError::InvalidKeySize {
                algorithm: CipherAlgorithm::Rc4,
                size: key.len(),
            });
        }
        let mut rc4 = Self {
            key: Zeroizing::new(key.to_vec()),
            s: [0u8; 256],
            i: 0,
            j: 0,
        };
        rc4.schedule();
        Ok(rc4)
    }

    fn schedule(&mut self) {
        for (n, slot) in self.s.iter_mut().enumerate() {
            *slot = n as u8;
        }
        let mut j: u8 = 0;
        for n in 0..256 {
            j = j
                .wrapping_add(self.s[n])
                .wrapping_add(self.key[n % self.key.len()]);
            self.s.swap(n, j as usize);
        }
        self.i = 0;
        self.j = 0;
    }

    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.s[self.i as usize]);
            self.s.swap(self.i as usize, self.j as usize);
            let k = self.s[self.s[self.i as usize].wrapping_add(self.s[self.j as usize]) as usize];
            *byte ^= k;
        }
    }
}

impl Drop for Rc4 {
    fn drop(&mut self) {
        self.s.zeroize();
        self.i.zeroize();
        self.j.zeroize();
    }
}

enum Core {
    Block(Box<dyn BlockMode>),
    Stream(Rc4),
}

/// Keyed cipher context for one direction.
pub struct CipherContext {
    algorithm: CipherAlgorithm,
    block_size: usize,
    ecb: bool,
    core: Core,
}

impl CipherContext {
    /// Expand `key` and load the initial chaining value.
    ///
    /// For CBC an empty `iv` means all zeros; otherwise it must be exactly
    /// one block. ECB and RC4 ignore the IV.
    pub fn new(
        algorithm: CipherAlgorithm,
        operation: Operation,
        key: &[u8],
        iv: &[u8],
        ecb: bool,
    ) -> Result<Self, CryptorError> {
        let invalid_key = || CryptorError::InvalidKeySize {
            algorithm,
            size: key.len(),
        };
        if !is_valid_key_size(algorithm, key.len()) {
            return Err(invalid_key());
        }
        let keyed = |_| invalid_key();

        let core = match (algorithm, key.len()) {
            (CipherAlgorithm::Rc4, _) => Core::Stream(Rc4::new(key)?),
            (CipherAlgorithm::Aes, 16) => Core::Block(block_mode(
                aes::Aes128::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            (CipherAlgorithm::Aes, 24) => Core::Block(block_mode(
                aes::Aes192::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            (CipherAlgorithm::Aes, _) => Core::Block(block_mode(
                aes::Aes256::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            (CipherAlgorithm::Des, _) => Core::Block(block_mode(
                des::Des::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            (CipherAlgorithm::TripleDes, _) => Core::Block(block_mode(
                des::TdesEde3::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            (CipherAlgorithm::Cast, _) => Core::Block(block_mode(
                cast5::Cast5::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
            // effective key bits follow the key length
            (CipherAlgorithm::Rc2, n) => Core::Block(block_mode(
                rc2::Rc2::new_with_eff_key_len(key, n * 8),
                operation,
                ecb,
            )),
            (CipherAlgorithm::Blowfish, _) => Core::Block(block_mode(
                <blowfish::Blowfish>::new_from_slice(key).map_err(keyed)?,
                operation,
                ecb,
            )),
        };

        let mut context = Self {
            algorithm,
            block_size: cipher_descriptor(algorithm).block_size,
            ecb,
            core,
        };
        context.load_iv(iv)?;
        Ok(context)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Return to the post-init state with a new IV, keeping the key schedule.
    pub fn reset(&mut self, iv: &[u8]) -> Result<(), CryptorError> {
        if let Core::Stream(rc4) = &mut self.core {
            rc4.schedule();
        }
        self.load_iv(iv)
    }

    fn load_iv(&mut self, iv: &[u8]) -> Result<(), CryptorError> {
        let Core::Block(mode) = &mut self.core else {
            return Ok(());
        };
        if self.ecb {
            return Ok(());
        }
        let zeros = [0u8; MAX_CIPHER_BLOCK_SIZE];
        let iv = if iv.is_empty() {
            &zeros[..self.block_size]
        } else {
            iv
        };
        mode.load_iv(iv).map_err(|_| CryptorError::InvalidIvSize {
            algorithm: self.algorithm,
            size: iv.len(),
            expected: self.block_size,
        })
    }

    /// Transform `buf` in place. For block ciphers `buf.len()` is a multiple
    /// of the block size.
    pub fn transform(&mut self, buf: &mut [u8]) {
        match &mut self.core {
            Core::Stream(rc4) => rc4.apply_keystream(buf),
            Core::Block(mode) => {
                debug_assert_eq!(buf.len() % self.block_size, 0);
                for block in buf.chunks_exact_mut(self.block_size) {
                    mode.apply(block);
                }
            }
        }
    }
}
