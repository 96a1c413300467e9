use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{CipherAlgorithm, HashAlgorithm};
use crate::{CsecError, CsecResult};

/// Top-level configuration (loaded from csec.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CsecConfig {
    pub logging: LoggingConfig,
    pub digest: DigestConfig,
    pub cipher: CipherConfig,
    pub pbkdf2: Pbkdf2Config,
}

impl CsecConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> CsecResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| CsecError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> CsecResult<Self> {
        toml::from_str(content).map_err(|e| CsecError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Default hash algorithm for `digest` and `hmac` (default: sha256)
    pub algorithm: HashAlgorithm,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// Default cipher (default: aes)
    pub algorithm: CipherAlgorithm,
    /// Apply PKCS#7 padding (default: true)
    pub pkcs7_padding: bool,
    /// Disable IV chaining (default: false)
    pub ecb_mode: bool,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            algorithm: CipherAlgorithm::Aes,
            pkcs7_padding: true,
            ecb_mode: false,
        }
    }
}

/// PBKDF2 derivation and calibration defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pbkdf2Config {
    /// PRF hash algorithm (default: sha256)
    pub algorithm: HashAlgorithm,
    /// Derived key size in bytes (default: 32)
    pub key_size: usize,
    /// Round count used when none is given explicitly (default: 600000)
    pub rounds: u32,
    /// Calibration target in milliseconds (default: 100)
    pub target_ms: u64,
    /// Initial trial round count for calibration (default: 1000)
    pub trial_rounds: u32,
    /// Minimum sample duration before extrapolating, in milliseconds (default: 10)
    pub min_sample_ms: u64,
    /// Representative password length for calibration (default: 16)
    pub password_len: usize,
    /// Representative salt length for calibration (default: 16)
    pub salt_len: usize,
}

impl Default for Pbkdf2Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            key_size: 32,
            rounds: 600_000,
            target_ms: 100,
            trial_rounds: 1000,
            min_sample_ms: 10,
            password_len: 16,
            salt_len: 16,
        }
    }
}
