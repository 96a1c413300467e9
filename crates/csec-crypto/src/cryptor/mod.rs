//! Cryptor: block and stream encryption with partial-block buffering.
//!
//! Input may arrive in any chunking. Block ciphers only ever emit whole
//! blocks; the remainder waits in a pending buffer until the next update or
//! [`Cryptor::finalize_into`]. Padded decryption additionally holds back the
//! last complete block, since it may turn out to carry the padding.

mod padding;
pub mod provider;

use zeroize::{Zeroize, Zeroizing};

use csec_core::{CipherAlgorithm, CryptorOptions, Operation};

use crate::error::CryptorError;
use crate::registry::{cipher_descriptor, CipherDescriptor, MAX_CIPHER_BLOCK_SIZE};

use self::padding::{pad_block, unpadded_len};
use self::provider::CipherContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptorState {
    Ready,
    Updating,
    Finalized,
}

pub struct Cryptor {
    operation: Operation,
    algorithm: CipherAlgorithm,
    options: CryptorOptions,
    descriptor: &'static CipherDescriptor,
    context: CipherContext,
    /// Bytes of an incomplete block (or the held-back final block)
    pending: Zeroizing<Vec<u8>>,
    state: CryptorState,
}

impl Cryptor {
    /// Key a new cryptor.
    ///
    /// `iv` is used only in CBC mode: empty means an all-zero IV, anything
    /// else must be exactly one block long.
    pub fn new(
        operation: Operation,
        algorithm: CipherAlgorithm,
        options: CryptorOptions,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self, CryptorError> {
        let descriptor = cipher_descriptor(algorithm);
        let context = CipherContext::new(algorithm, operation, key, iv, options.ecb())?;

        tracing::debug!(
            %algorithm,
            ?operation,
            options = options.bits(),
            key_len = key.len(),
            "cryptor created"
        );

        Ok(Self {
            operation,
            algorithm,
            options,
            descriptor,
            context,
            pending: Zeroizing::new(Vec::with_capacity(descriptor.block_size)),
            state: CryptorState::Ready,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn options(&self) -> CryptorOptions {
        self.options
    }

    pub fn state(&self) -> CryptorState {
        self.state
    }

    pub fn block_size(&self) -> usize {
        self.context.block_size()
    }

    /// Bytes currently buffered and not yet emitted.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn is_stream(&self) -> bool {
        self.descriptor.is_stream()
    }

    fn padded(&self) -> bool {
        self.options.padding() && !self.is_stream()
    }

    fn holds_back(&self) -> bool {
        self.padded() && self.operation == Operation::Decrypt
    }

    /// Bytes an update emits when `total` bytes (pending plus input) are
    /// available.
    fn update_len(&self, total: usize) -> usize {
        let bs = self.block_size();
        if self.holds_back() {
            total.saturating_sub(1) / bs * bs
        } else {
            total / bs * bs
        }
    }

    /// Upper bound on the bytes written by `update(input_len bytes)`, plus
    /// the following `finalize` when `is_final` is set.
    pub fn output_length(&self, input_len: usize, is_final: bool) -> usize {
        if self.is_stream() {
            return input_len;
        }
        let bs = self.block_size();
        let total = self.pending.len() + input_len;
        if !is_final {
            return self.update_len(total);
        }
        match (self.operation, self.padded()) {
            (Operation::Encrypt, true) => (total / bs + 1) * bs,
            _ => total / bs * bs,
        }
    }

    /// Return to the freshly keyed state with a new IV. Works from any
    /// state, including after a failure.
    pub fn reset(&mut self, iv: &[u8]) -> Result<&mut Self, CryptorError> {
        self.pending.zeroize();
        if let Err(e) = self.context.reset(iv) {
            self.state = CryptorState::Finalized;
            return Err(e);
        }
        self.state = CryptorState::Ready;
        tracing::trace!(algorithm = %self.algorithm, "cryptor reset");
        Ok(self)
    }

    fn check_live(&self) -> Result<(), CryptorError> {
        if self.state == CryptorState::Finalized {
            return Err(CryptorError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Transform `input` into `out`, returning the number of bytes written.
    ///
    /// `out` must hold at least `output_length(input.len(), false)` bytes;
    /// otherwise nothing is consumed and `BufferTooSmall` is returned.
    pub fn update_into(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, CryptorError> {
        self.check_live()?;
        let needed = self.output_length(input.len(), false);
        if out.len() < needed {
            return Err(CryptorError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }
        self.state = CryptorState::Updating;

        if self.is_stream() {
            let out = &mut out[..input.len()];
            out.copy_from_slice(input);
            self.context.transform(out);
            return Ok(input.len());
        }

        let bs = self.block_size();
        let holds_back = self.holds_back();
        let mut input = input;
        let mut written = 0;

        if !self.pending.is_empty() {
            let take = (bs - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.pending.len() == bs && (!holds_back || !input.is_empty()) {
                out[..bs].copy_from_slice(&self.pending);
                self.context.transform(&mut out[..bs]);
                self.pending.zeroize();
                written = bs;
            }
        }

        if !input.is_empty() {
            let mut full = input.len() / bs * bs;
            if holds_back && full == input.len() {
                full -= bs;
            }
            let chunk = &mut out[written..written + full];
            chunk.copy_from_slice(&input[..full]);
            self.context.transform(chunk);
            written += full;
            self.pending.extend_from_slice(&input[full..]);
        }

        debug_assert_eq!(written, needed);
        Ok(written)
    }

    /// Allocating form of [`Cryptor::update_into`].
    pub fn update(&mut self, input: &[u8]) -> Result<Vec<u8>, CryptorError> {
        let mut out = vec![0u8; self.output_length(input.len(), false)];
        let n = self.update_into(input, &mut out)?;
        out.truncate(n);
        Ok(out)
    }

    /// Update with `data[offset..offset + length]`.
    pub fn update_range(
        &mut self,
        data: &[u8],
        offset: usize,
        length: usize,
        out: &mut [u8],
    ) -> Result<usize, CryptorError> {
        let input = offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
            .ok_or(CryptorError::InvalidLength {
                reason: "input range out of bounds",
            })?;
        self.update_into(input, out)
    }

    /// Flush the pending block, applying or removing padding, and finish.
    ///
    /// `out` must hold at least `output_length(0, true)` bytes. Whether it
    /// succeeds or not, the cryptor is finalized afterwards; on failure
    /// nothing is written to `out`.
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize, CryptorError> {
        self.check_live()?;
        let needed = self.output_length(0, true);
        if out.len() < needed {
            return Err(CryptorError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }

        let result = self.finish(out);
        self.state = CryptorState::Finalized;
        self.pending.zeroize();

        match &result {
            Ok(n) => tracing::trace!(algorithm = %self.algorithm, written = *n, "cryptor finalized"),
            Err(e) => tracing::debug!(algorithm = %self.algorithm, error = %e, "cryptor final failed"),
        }
        result
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, CryptorError> {
        if self.is_stream() {
            return Ok(0);
        }
        let bs = self.block_size();

        match (self.operation, self.padded()) {
            (Operation::Encrypt, true) => {
                let mut block = Zeroizing::new([0u8; MAX_CIPHER_BLOCK_SIZE]);
                let filled = self.pending.len();
                block[..filled].copy_from_slice(&self.pending);
                pad_block(&mut block[..bs], filled);
                self.context.transform(&mut block[..bs]);
                out[..bs].copy_from_slice(&block[..bs]);
                Ok(bs)
            }
            (Operation::Decrypt, true) => {
                if self.pending.len() != bs {
                    return Err(CryptorError::InvalidLength {
                        reason: "ciphertext is not a whole number of blocks",
                    });
                }
                let mut block = Zeroizing::new([0u8; MAX_CIPHER_BLOCK_SIZE]);
                block[..bs].copy_from_slice(&self.pending);
                self.context.transform(&mut block[..bs]);
                let n = unpadded_len(&block[..bs]).ok_or(CryptorError::InvalidPadding)?;
                out[..n].copy_from_slice(&block[..n]);
                Ok(n)
            }
            (_, false) => {
                if !self.pending.is_empty() {
                    return Err(CryptorError::InvalidLength {
                        reason: "input is not a multiple of the block size",
                    });
                }
                Ok(0)
            }
        }
    }

    /// Allocating form of [`Cryptor::finalize_into`].
    pub fn finalize(&mut self) -> Result<Vec<u8>, CryptorError> {
        let mut out = vec![0u8; self.output_length(0, true)];
        let n = self.finalize_into(&mut out)?;
        out.truncate(n);
        Ok(out)
    }
}

impl std::fmt::Debug for Cryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cryptor")
            .field("operation", &self.operation)
            .field("algorithm", &self.algorithm)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("pending_len", &self.pending.len())
            .finish_non_exhaustive()
    }
}

fn crypt(
    operation: Operation,
    data: &[u8],
    algorithm: CipherAlgorithm,
    options: CryptorOptions,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptorError> {
    let mut cryptor = Cryptor::new(operation, algorithm, options, key, iv)?;
    let mut out = vec![0u8; cryptor.output_length(data.len(), true)];
    let result = cryptor
        .update_into(data, &mut out)
        .and_then(|n| cryptor.finalize_into(&mut out[n..]).map(|m| n + m));
    match result {
        Ok(n) => {
            out.truncate(n);
            Ok(out)
        }
        Err(e) => {
            out.zeroize();
            Err(e)
        }
    }
}

/// One-shot encryption of `data`.
pub fn encrypt(
    data: &[u8],
    algorithm: CipherAlgorithm,
    options: CryptorOptions,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptorError> {
    crypt(Operation::Encrypt, data, algorithm, options, key, iv)
}

/// One-shot decryption of `data`. Fails without output if padding or
/// length checks fail.
pub fn decrypt(
    data: &[u8],
    algorithm: CipherAlgorithm,
    options: CryptorOptions,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptorError> {
    crypt(Operation::Decrypt, data, algorithm, options, key, iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PADDED: CryptorOptions = CryptorOptions::PKCS7_PADDING;

    const SP800_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const SP800_IV: &str = "000102030405060708090a0b0c0d0e0f";
    const SP800_PLAINTEXT: &str = concat!(
        "6bc1bee22e409f96e93d7e117393172a",
        "ae2d8a571e03ac9c9eb76fac45af8e51",
        "30c81c46a35ce411e5fbc1191a0a52ef",
        "f69f2445df4f9b17ad2b417be66c3710",
    );
    const SP800_CBC_CIPHERTEXT: &str = concat!(
        "7649abac8119b246cee98e9b12e9197d",
        "5086cb9b507219ee95db113a917678b2",
        "73bed6b8e3c1743b7116e69e22229516",
        "3ff1caa1681fac09120eca307586e1a7",
    );

    fn key_sizes(algorithm: CipherAlgorithm) -> &'static [usize] {
        match algorithm {
            CipherAlgorithm::Aes => &[16, 24, 32],
            CipherAlgorithm::Des => &[8],
            CipherAlgorithm::TripleDes => &[24],
            CipherAlgorithm::Cast => &[5, 16],
            CipherAlgorithm::Rc2 => &[1, 16, 128],
            CipherAlgorithm::Rc4 => &[1, 16, 512],
            CipherAlgorithm::Blowfish => &[8, 56],
        }
    }

    fn test_key(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 + 7) as u8).collect()
    }

    /// Drive `data` through a cryptor in fixed-size pieces.
    fn run_chunked(cryptor: &mut Cryptor, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for piece in data.chunks(chunk) {
            out.extend(cryptor.update(piece).unwrap());
        }
        out.extend(cryptor.finalize().unwrap());
        out
    }

    #[test]
    fn test_aes_cbc_sp800_38a() {
        let key = hex::decode(SP800_KEY).unwrap();
        let iv = hex::decode(SP800_IV).unwrap();
        let plaintext = hex::decode(SP800_PLAINTEXT).unwrap();

        let ciphertext = encrypt(
            &plaintext,
            CipherAlgorithm::Aes,
            CryptorOptions::empty(),
            &key,
            &iv,
        )
        .unwrap();
        assert_eq!(hex::encode(&ciphertext), SP800_CBC_CIPHERTEXT);

        let decrypted = decrypt(
            &ciphertext,
            CipherAlgorithm::Aes,
            CryptorOptions::empty(),
            &key,
            &iv,
        )
        .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_aes_ecb_sp800_38a() {
        let key = hex::decode(SP800_KEY).unwrap();
        let plaintext = hex::decode(SP800_PLAINTEXT).unwrap();
        let ciphertext = encrypt(
            &plaintext[..16],
            CipherAlgorithm::Aes,
            CryptorOptions::ECB_MODE,
            &key,
            &[],
        )
        .unwrap();
        assert_eq!(hex::encode(ciphertext), "3ad77bb40d7a3660a89ecaf32466ef97");
    }

    #[test]
    fn test_cbc_vector_in_33_byte_chunks() {
        let key = hex::decode(SP800_KEY).unwrap();
        let iv = hex::decode(SP800_IV).unwrap();
        let plaintext = hex::decode(SP800_PLAINTEXT).unwrap();

        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Aes,
            CryptorOptions::empty(),
            &key,
            &iv,
        )
        .unwrap();
        let ciphertext = run_chunked(&mut cryptor, &plaintext, 33);
        assert_eq!(hex::encode(ciphertext), SP800_CBC_CIPHERTEXT);
    }

    #[test]
    fn test_empty_input_padded_is_one_block() {
        let key = [0u8; 16];
        let iv = [0u8; 16];
        let ciphertext = encrypt(&[], CipherAlgorithm::Aes, PADDED, &key, &iv).unwrap();
        assert_eq!(ciphertext.len(), 16);

        let plaintext = decrypt(&ciphertext, CipherAlgorithm::Aes, PADDED, &key, &iv).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_round_trip_every_algorithm() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        for algorithm in CipherAlgorithm::ALL {
            let bs = cipher_descriptor(algorithm).block_size;
            let aligned = &data[..data.len() / bs * bs];
            let iv = vec![0x42u8; bs];

            for &len in key_sizes(algorithm) {
                let key = test_key(len);
                let cases: [(CryptorOptions, &[u8]); 4] = [
                    (PADDED, &data),
                    (PADDED | CryptorOptions::ECB_MODE, &data[..777]),
                    (CryptorOptions::empty(), aligned),
                    (CryptorOptions::ECB_MODE, aligned),
                ];
                for (options, plaintext) in cases {
                    let ciphertext = encrypt(plaintext, algorithm, options, &key, &iv).unwrap();
                    if !cipher_descriptor(algorithm).is_stream() {
                        assert_eq!(ciphertext.len() % bs, 0, "{algorithm} {len}");
                    }
                    assert_ne!(&ciphertext[..16], &plaintext[..16], "{algorithm} {len}");

                    let mut cryptor =
                        Cryptor::new(Operation::Decrypt, algorithm, options, &key, &iv).unwrap();
                    let decrypted = run_chunked(&mut cryptor, &ciphertext, 33);
                    assert_eq!(decrypted, plaintext, "{algorithm} key {len} {options:?}");
                }
            }
        }
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        let key = test_key(16);
        let data = vec![0x33u8; 300];
        let one_shot = encrypt(&data, CipherAlgorithm::Cast, PADDED, &key, &[]).unwrap();

        let mut cryptor =
            Cryptor::new(Operation::Encrypt, CipherAlgorithm::Cast, PADDED, &key, &[]).unwrap();
        assert_eq!(run_chunked(&mut cryptor, &data, 33), one_shot);
    }

    #[test]
    fn test_block_cipher_never_emits_partial_blocks() {
        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Aes,
            PADDED,
            &[1u8; 16],
            &[],
        )
        .unwrap();
        assert!(cryptor.update(&[0u8; 15]).unwrap().is_empty());
        assert_eq!(cryptor.pending_len(), 15);
        assert_eq!(cryptor.update(&[0u8; 2]).unwrap().len(), 16);
        assert_eq!(cryptor.pending_len(), 1);
        assert_eq!(cryptor.finalize().unwrap().len(), 16);
    }

    #[test]
    fn test_padded_decrypt_holds_back_last_block() {
        let key = [1u8; 16];
        let ciphertext = encrypt(&[9u8; 32], CipherAlgorithm::Aes, PADDED, &key, &[]).unwrap();
        assert_eq!(ciphertext.len(), 48);

        let mut cryptor =
            Cryptor::new(Operation::Decrypt, CipherAlgorithm::Aes, PADDED, &key, &[]).unwrap();
        assert_eq!(cryptor.update(&ciphertext).unwrap(), vec![9u8; 32]);
        assert_eq!(cryptor.pending_len(), 16);
        assert!(cryptor.finalize().unwrap().is_empty());
    }

    #[test]
    fn test_stream_cipher_passes_through() {
        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Rc4,
            PADDED,
            b"Key",
            &[],
        )
        .unwrap();
        let mut out = cryptor.update(b"Plain").unwrap();
        out.extend(cryptor.update(b"text").unwrap());
        assert!(cryptor.finalize().unwrap().is_empty());
        assert_eq!(hex::encode(out), "bbf316e8d940af0ad3");
    }

    #[test]
    fn test_corrupted_padding_rejected() {
        let key = [1u8; 16];
        let iv = [0u8; 16];
        // 14 bytes of content leave two 0x02 padding bytes
        let ciphertext = encrypt(b"attack at dawn", CipherAlgorithm::Aes, PADDED, &key, &iv).unwrap();
        assert_eq!(
            decrypt(&ciphertext, CipherAlgorithm::Aes, PADDED, &key, &iv).unwrap(),
            b"attack at dawn"
        );

        // the IV is XORed into the first plaintext block, so this turns the
        // final padding byte into 0x00
        let mut bad_iv = iv;
        bad_iv[15] ^= 0x02;
        let result = decrypt(&ciphertext, CipherAlgorithm::Aes, PADDED, &key, &bad_iv);
        assert_eq!(result, Err(CryptorError::InvalidPadding));

        // and this one into 0x03, inconsistent with the byte before it
        bad_iv = iv;
        bad_iv[15] ^= 0x01;
        let mut cryptor =
            Cryptor::new(Operation::Decrypt, CipherAlgorithm::Aes, PADDED, &key, &bad_iv).unwrap();
        assert!(cryptor.update(&ciphertext).unwrap().is_empty());
        assert_eq!(cryptor.finalize(), Err(CryptorError::InvalidPadding));
        assert_eq!(cryptor.state(), CryptorState::Finalized);
    }

    #[test]
    fn test_decrypt_requires_whole_blocks() {
        let result = decrypt(&[0u8; 15], CipherAlgorithm::Aes, PADDED, &[1u8; 16], &[]);
        assert!(matches!(result, Err(CryptorError::InvalidLength { .. })));

        let result = decrypt(&[], CipherAlgorithm::Des, PADDED, &[1u8; 8], &[]);
        assert!(matches!(result, Err(CryptorError::InvalidLength { .. })));
    }

    #[test]
    fn test_unpadded_rejects_partial_block() {
        let result = encrypt(
            &[0u8; 10],
            CipherAlgorithm::Blowfish,
            CryptorOptions::empty(),
            &[1u8; 16],
            &[],
        );
        assert!(matches!(result, Err(CryptorError::InvalidLength { .. })));
    }

    #[test]
    fn test_invalid_key_size() {
        let result = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Aes,
            PADDED,
            &[0u8; 20],
            &[],
        );
        assert!(matches!(
            result,
            Err(CryptorError::InvalidKeySize { size: 20, .. })
        ));
        assert!(Cryptor::new(Operation::Encrypt, CipherAlgorithm::Rc4, PADDED, &[], &[]).is_err());
    }

    #[test]
    fn test_buffer_too_small_consumes_nothing() {
        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Aes,
            CryptorOptions::empty(),
            &[1u8; 16],
            &[],
        )
        .unwrap();
        let mut small = [0u8; 16];
        assert_eq!(
            cryptor.update_into(&[0u8; 32], &mut small),
            Err(CryptorError::BufferTooSmall {
                needed: 32,
                available: 16
            })
        );
        assert_eq!(cryptor.pending_len(), 0);
        assert_eq!(cryptor.state(), CryptorState::Ready);

        let mut big = [0u8; 32];
        assert_eq!(cryptor.update_into(&[0u8; 32], &mut big), Ok(32));
    }

    #[test]
    fn test_final_twice_and_update_after_final() {
        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Des,
            PADDED,
            &[3u8; 8],
            &[],
        )
        .unwrap();
        cryptor.update(b"abc").unwrap();
        cryptor.finalize().unwrap();
        assert_eq!(cryptor.finalize(), Err(CryptorError::AlreadyFinalized));
        assert_eq!(cryptor.update(b"x"), Err(CryptorError::AlreadyFinalized));
    }

    #[test]
    fn test_failure_is_terminal_until_reset() {
        let mut cryptor = Cryptor::new(
            Operation::Decrypt,
            CipherAlgorithm::Aes,
            PADDED,
            &[1u8; 16],
            &[],
        )
        .unwrap();
        cryptor.update(&[0u8; 7]).unwrap();
        assert!(cryptor.finalize().is_err());
        assert_eq!(cryptor.state(), CryptorState::Finalized);
        assert_eq!(cryptor.update(&[0u8; 16]), Err(CryptorError::AlreadyFinalized));

        cryptor.reset(&[]).unwrap();
        assert_eq!(cryptor.state(), CryptorState::Ready);
        assert_eq!(cryptor.pending_len(), 0);
    }

    #[test]
    fn test_reset_with_new_iv() {
        let key = [5u8; 16];
        let data = [0x77u8; 40];
        let mut cryptor =
            Cryptor::new(Operation::Encrypt, CipherAlgorithm::Aes, PADDED, &key, &[]).unwrap();
        let first = run_chunked(&mut cryptor, &data, 33);

        cryptor.reset(&[0u8; 16]).unwrap();
        assert_eq!(run_chunked(&mut cryptor, &data, 7), first);

        cryptor.reset(&[1u8; 16]).unwrap();
        let other = run_chunked(&mut cryptor, &data, 40);
        assert_ne!(other, first);
        assert_eq!(
            other,
            encrypt(&data, CipherAlgorithm::Aes, PADDED, &key, &[1u8; 16]).unwrap()
        );

        assert!(matches!(
            cryptor.reset(&[0u8; 8]),
            Err(CryptorError::InvalidIvSize { .. })
        ));
        assert_eq!(cryptor.update(b"x"), Err(CryptorError::AlreadyFinalized));
    }

    #[test]
    fn test_update_range() {
        let mut cryptor = Cryptor::new(
            Operation::Encrypt,
            CipherAlgorithm::Aes,
            CryptorOptions::empty(),
            &[1u8; 16],
            &[],
        )
        .unwrap();
        let data = [0u8; 64];
        let mut out = [0u8; 64];
        assert_eq!(cryptor.update_range(&data, 8, 32, &mut out), Ok(32));
        assert!(matches!(
            cryptor.update_range(&data, 40, 32, &mut out),
            Err(CryptorError::InvalidLength { .. })
        ));
        assert!(matches!(
            cryptor.update_range(&data, usize::MAX, 2, &mut out),
            Err(CryptorError::InvalidLength { .. })
        ));
    }

    proptest! {
        #[test]
        fn output_length_bounds_actual(
            alg_index in 0usize..CipherAlgorithm::ALL.len(),
            decrypt_side in any::<bool>(),
            padded in any::<bool>(),
            chunks in proptest::collection::vec(0usize..70, 0..8),
        ) {
            let algorithm = CipherAlgorithm::ALL[alg_index];
            let key = test_key(key_sizes(algorithm)[0]);
            let options = if padded { PADDED } else { CryptorOptions::empty() };
            let bs = cipher_descriptor(algorithm).block_size;

            // decryption input must be real ciphertext for padding to verify
            let total: usize = chunks.iter().sum();
            let plaintext = vec![0xa5u8; if padded { total } else { total / bs * bs }];
            let (operation, input) = if decrypt_side {
                let ct = encrypt(&plaintext, algorithm, options, &key, &[]).unwrap();
                (Operation::Decrypt, ct)
            } else {
                (Operation::Encrypt, plaintext.clone())
            };

            let mut cryptor = Cryptor::new(operation, algorithm, options, &key, &[]).unwrap();
            let mut rest = input.as_slice();
            let mut output = Vec::new();
            for size in chunks.iter().copied() {
                let piece = &rest[..size.min(rest.len())];
                rest = &rest[piece.len()..];
                let predicted = cryptor.output_length(piece.len(), false);
                let got = cryptor.update(piece).unwrap();
                prop_assert!(got.len() <= predicted);
                output.extend(got);
            }
            let predicted = cryptor.output_length(rest.len(), true);
            let mut buf = vec![0u8; predicted];
            let n = cryptor.update_into(rest, &mut buf).unwrap();
            let m = cryptor.finalize_into(&mut buf[n..]).unwrap();
            prop_assert!(n + m <= predicted);
            output.extend_from_slice(&buf[..n + m]);

            if decrypt_side {
                prop_assert_eq!(output, plaintext);
            } else {
                prop_assert_eq!(
                    output,
                    encrypt(&input, algorithm, options, &key, &[]).unwrap()
                );
            }
        }

        #[test]
        fn padded_round_trip_any_chunking(
            data in proptest::collection::vec(any::<u8>(), 0..300),
            chunk in 1usize..=50,
        ) {
            let key = test_key(24);
            let ciphertext = encrypt(&data, CipherAlgorithm::TripleDes, PADDED, &key, &[]).unwrap();
            let mut cryptor = Cryptor::new(
                Operation::Decrypt,
                CipherAlgorithm::TripleDes,
                PADDED,
                &key,
                &[],
            )
            .unwrap();
            prop_assert_eq!(run_chunked(&mut cryptor, &ciphertext, chunk), data);
        }
    }
}
