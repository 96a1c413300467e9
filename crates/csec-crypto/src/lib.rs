//! csec-crypto: streaming cryptographic primitives
//!
//! Every incremental object follows the same lifecycle:
//! ```text
//! new ──► update* ──► finalize ──► (reset ──► update* ──► finalize)*
//! ```
//!
//! Layering:
//! ```text
//! registry (static algorithm tables)
//!   ├── engine: init/update/final state machine over a StreamPrimitive
//!   │     ├── Digester
//!   │     └── Hmac (inner + outer engine)
//!   │           └── PBKDF2 (HMAC as PRF)
//!   └── cryptor: block/stream ciphers, PKCS#7, partial-block buffering
//! random: OS CSPRNG
//! ```

pub mod cryptor;
pub mod digester;
pub mod engine;
pub mod error;
pub mod hmac;
pub mod pbkdf2;
pub mod random;
pub mod registry;

pub use cryptor::{decrypt, encrypt, Cryptor, CryptorState};
pub use digester::{digest, Digester};
pub use engine::{DigestCore, Engine, EngineState, StreamPrimitive};
pub use error::{CryptoError, CryptorError, EngineError, Pbkdf2Error, ProviderStatus, RandomError};
pub use hmac::{hmac, Hmac};
pub use pbkdf2::{calibrate, calibrate_with, derive_key, CalibrationParams, CalibrationResult, DerivedKey};
pub use random::{fill_bytes, generate_bytes, generate_bytes_with};
pub use registry::{block_size, cipher_descriptor, digest_descriptor, is_valid_key_size};

pub use csec_core::{CipherAlgorithm, CryptorOptions, HashAlgorithm, Operation};
