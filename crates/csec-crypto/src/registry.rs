//! Algorithm registry: fixed parameters per algorithm enumerant.
//!
//! Both tables are immutable statics, so lookups are lock-free and safe from
//! any thread.

use std::mem::size_of;

use csec_core::{CipherAlgorithm, HashAlgorithm};

use crate::cryptor::provider::Rc4;

/// Largest digest output of any registered hash (SHA-512).
pub const MAX_DIGEST_LEN: usize = 64;

/// Largest internal block of any registered hash (SHA-384/512).
pub const MAX_HASH_BLOCK_SIZE: usize = 128;

/// Largest block of any registered cipher (AES).
pub const MAX_CIPHER_BLOCK_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestDescriptor {
    pub algorithm: HashAlgorithm,
    /// Digest length in bytes
    pub output_len: usize,
    /// Compression-function block size in bytes (HMAC pad width)
    pub block_size: usize,
    /// Size of the provider context in bytes
    pub context_size: usize,
}

static DIGESTS: [DigestDescriptor; 6] = [
    DigestDescriptor {
        algorithm: HashAlgorithm::Md5,
        output_len: 16,
        block_size: 64,
        context_size: size_of::<md5::Md5>(),
    },
    DigestDescriptor {
        algorithm: HashAlgorithm::Sha1,
        output_len: 20,
        block_size: 64,
        context_size: size_of::<sha1::Sha1>(),
    },
    DigestDescriptor {
        algorithm: HashAlgorithm::Sha224,
        output_len: 28,
        block_size: 64,
        context_size: size_of::<sha2::Sha224>(),
    },
    DigestDescriptor {
        algorithm: HashAlgorithm::Sha256,
        output_len: 32,
        block_size: 64,
        context_size: size_of::<sha2::Sha256>(),
    },
    DigestDescriptor {
        algorithm: HashAlgorithm::Sha384,
        output_len: 48,
        block_size: 128,
        context_size: size_of::<sha2::Sha384>(),
    },
    DigestDescriptor {
        algorithm: HashAlgorithm::Sha512,
        output_len: 64,
        block_size: 128,
        context_size: size_of::<sha2::Sha512>(),
    },
];

pub fn digest_descriptor(algorithm: HashAlgorithm) -> &'static DigestDescriptor {
    let index = match algorithm {
        HashAlgorithm::Md5 => 0,
        HashAlgorithm::Sha1 => 1,
        HashAlgorithm::Sha224 => 2,
        HashAlgorithm::Sha256 => 3,
        HashAlgorithm::Sha384 => 4,
        HashAlgorithm::Sha512 => 5,
    };
    &DIGESTS[index]
}

/// Set of key lengths (bytes) a cipher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySizes {
    Fixed(&'static [usize]),
    Range { min: usize, max: usize },
}

impl KeySizes {
    pub fn contains(&self, size: usize) -> bool {
        match *self {
            KeySizes::Fixed(sizes) => sizes.contains(&size),
            KeySizes::Range { min, max } => (min..=max).contains(&size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherDescriptor {
    pub algorithm: CipherAlgorithm,
    /// Block size in bytes; 1 for stream ciphers
    pub block_size: usize,
    pub key_sizes: KeySizes,
    /// Size of the provider key schedule in bytes (largest key variant)
    pub context_size: usize,
}

impl CipherDescriptor {
    pub fn is_stream(&self) -> bool {
        self.block_size == 1
    }
}

static CIPHERS: [CipherDescriptor; 7] = [
    CipherDescriptor {
        algorithm: CipherAlgorithm::Aes,
        block_size: 16,
        key_sizes: KeySizes::Fixed(&[16, 24, 32]),
        context_size: size_of::<aes::Aes256>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::Des,
        block_size: 8,
        key_sizes: KeySizes::Fixed(&[8]),
        context_size: size_of::<des::Des>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::TripleDes,
        block_size: 8,
        key_sizes: KeySizes::Fixed(&[24]),
        context_size: size_of::<des::TdesEde3>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::Cast,
        block_size: 8,
        key_sizes: KeySizes::Range { min: 5, max: 16 },
        context_size: size_of::<cast5::Cast5>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::Rc2,
        block_size: 8,
        key_sizes: KeySizes::Range { min: 1, max: 128 },
        context_size: size_of::<rc2::Rc2>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::Rc4,
        block_size: 1,
        key_sizes: KeySizes::Range { min: 1, max: 512 },
        context_size: size_of::<Rc4>(),
    },
    CipherDescriptor {
        algorithm: CipherAlgorithm::Blowfish,
        block_size: 8,
        key_sizes: KeySizes::Range { min: 8, max: 56 },
        context_size: size_of::<blowfish::Blowfish>(),
    },
];

pub fn cipher_descriptor(algorithm: CipherAlgorithm) -> &'static CipherDescriptor {
    let index = match algorithm {
        CipherAlgorithm::Aes => 0,
        CipherAlgorithm::Des => 1,
        CipherAlgorithm::TripleDes => 2,
        CipherAlgorithm::Cast => 3,
        CipherAlgorithm::Rc2 => 4,
        CipherAlgorithm::Rc4 => 5,
        CipherAlgorithm::Blowfish => 6,
    };
    &CIPHERS[index]
}

pub fn block_size(algorithm: CipherAlgorithm) -> usize {
    cipher_descriptor(algorithm).block_size
}

pub fn is_valid_key_size(algorithm: CipherAlgorithm, size: usize) -> bool {
    cipher_descriptor(algorithm).key_sizes.contains(size)
}
