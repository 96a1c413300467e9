//! csec-core: shared types for the csec streaming crypto workspace
//!
//! - `types`: algorithm enumerants, cryptor operation and option flags
//! - `config`: TOML configuration schema (`csec.toml`)
//! - `error`: workspace-level error type

pub mod config;
pub mod error;
pub mod types;

pub use error::{CsecError, CsecResult};
pub use types::{CipherAlgorithm, CryptorOptions, HashAlgorithm, Operation};
