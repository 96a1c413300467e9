//! Typed failures for each component.
//!
//! Provider status codes are carried verbatim so callers can log them; no
//! variant ever carries key or plaintext material.

use thiserror::Error;

use csec_core::{CipherAlgorithm, HashAlgorithm};

/// Raw status reported by a provider primitive. Zero is success and never
/// appears inside an error.
pub type ProviderStatus = i32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine init failed (provider status {status})")]
    InitFailed { status: ProviderStatus },

    #[error("engine update failed (provider status {status})")]
    UpdateFailed { status: ProviderStatus },

    #[error("engine final failed (provider status {status})")]
    FinalFailed { status: ProviderStatus },

    #[error("engine already finalized")]
    AlreadyFinalized,

    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptorError {
    #[error("invalid key size {size} for {algorithm}")]
    InvalidKeySize {
        algorithm: CipherAlgorithm,
        size: usize,
    },

    #[error("invalid IV size {size} for {algorithm} (expected {expected})")]
    InvalidIvSize {
        algorithm: CipherAlgorithm,
        size: usize,
        expected: usize,
    },

    #[error("invalid padding")]
    InvalidPadding,

    #[error("invalid length: {reason}")]
    InvalidLength { reason: &'static str },

    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("cryptor already finalized")]
    AlreadyFinalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Pbkdf2Error {
    #[error("invalid round count: must be at least 1")]
    InvalidRounds,

    #[error("invalid derived key size {size} for {algorithm}")]
    InvalidKeySize {
        algorithm: HashAlgorithm,
        size: usize,
    },

    #[error("PBKDF2 PRF failed: {0}")]
    Engine(#[from] EngineError),

    #[error("calibration sample failed: {0}")]
    Random(#[from] RandomError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    #[error("random generation failed (provider status {status})")]
    GenerationFailed { status: ProviderStatus },
}

/// Any failure from this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Cryptor(#[from] CryptorError),

    #[error(transparent)]
    Pbkdf2(#[from] Pbkdf2Error),

    #[error(transparent)]
    Random(#[from] RandomError),
}
