//! Algorithm enumerants and cryptor option types shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CsecError;

/// Hash algorithms available to the digester, HMAC, and PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CsecError;

    /// Accepts `sha256`, `SHA256` and `sha-256` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "");
        HashAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.name() == normalized)
            .ok_or_else(|| CsecError::UnknownAlgorithm(s.to_string()))
    }
}

/// Symmetric ciphers available to the cryptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherAlgorithm {
    Aes,
    Des,
    #[serde(rename = "3des", alias = "tripledes")]
    TripleDes,
    Cast,
    Rc2,
    Rc4,
    Blowfish,
}

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 7] = [
        CipherAlgorithm::Aes,
        CipherAlgorithm::Des,
        CipherAlgorithm::TripleDes,
        CipherAlgorithm::Cast,
        CipherAlgorithm::Rc2,
        CipherAlgorithm::Rc4,
        CipherAlgorithm::Blowfish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CipherAlgorithm::Aes => "aes",
            CipherAlgorithm::Des => "des",
            CipherAlgorithm::TripleDes => "3des",
            CipherAlgorithm::Cast => "cast",
            CipherAlgorithm::Rc2 => "rc2",
            CipherAlgorithm::Rc4 => "rc4",
            CipherAlgorithm::Blowfish => "blowfish",
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "");
        if normalized == "tripledes" {
            return Ok(CipherAlgorithm::TripleDes);
        }
        CipherAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.name() == normalized)
            .ok_or_else(|| CsecError::UnknownAlgorithm(s.to_string()))
    }
}

/// Direction of a cryptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

bitflags::bitflags! {
    /// Cryptor option flags.
    ///
    /// ```
    /// use csec_core::CryptorOptions;
    ///
    /// let opts = CryptorOptions::PKCS7_PADDING | CryptorOptions::ECB_MODE;
    /// assert!(opts.contains(CryptorOptions::ECB_MODE));
    /// ```
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CryptorOptions: u32 {
        /// Apply PKCS#7 padding on encrypt, strip and validate it on decrypt.
        const PKCS7_PADDING = 1 << 0;
        /// Transform each block independently (no IV chaining).
        const ECB_MODE = 1 << 1;
    }
}

impl CryptorOptions {
    pub fn padding(self) -> bool {
        self.contains(Self::PKCS7_PADDING)
    }

    pub fn ecb(self) -> bool {
        self.contains(Self::ECB_MODE)
    }
}
