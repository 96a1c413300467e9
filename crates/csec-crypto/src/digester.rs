//! Message digests over the streaming engine.
//!
//! ```
//! use csec_core::HashAlgorithm;
//! use csec_crypto::{digest, Digester};
//!
//! let mut d = Digester::new(HashAlgorithm::Sha256).unwrap();
//! d.update(b"hello ").unwrap().update(b"world").unwrap();
//! assert_eq!(d.finalize().unwrap(), digest(HashAlgorithm::Sha256, b"hello world").unwrap());
//! ```

use csec_core::HashAlgorithm;

use crate::engine::{Engine, EngineState};
use crate::error::{EngineError, ProviderStatus};

/// Incremental hasher. Single-use: after [`Digester::finalize`] only
/// [`Digester::reset`] is accepted.
pub struct Digester {
    engine: Engine,
}

impl Digester {
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, EngineError> {
        let engine = Engine::new(algorithm)?;
        tracing::trace!(%algorithm, "digester created");
        Ok(Self { engine })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.engine.algorithm()
    }

    pub fn output_len(&self) -> usize {
        self.engine.output_len()
    }

    /// Status code of the most recent provider call.
    pub fn status(&self) -> ProviderStatus {
        self.engine.status()
    }

    pub fn is_finalized(&self) -> bool {
        self.engine.state() == EngineState::Finalized
    }

    pub fn update(&mut self, data: &[u8]) -> Result<&mut Self, EngineError> {
        self.engine.update(data)?;
        Ok(self)
    }

    pub fn finalize(&mut self) -> Result<Vec<u8>, EngineError> {
        self.engine.finalize()
    }

    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        self.engine.finalize_into(out)
    }

    /// Start a new computation on the same context.
    pub fn reset(&mut self) -> Result<&mut Self, EngineError> {
        self.engine.reset()?;
        Ok(self)
    }
}

/// One-shot digest of `data`.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, EngineError> {
    let mut engine = Engine::new(algorithm)?;
    engine.update(data)?;
    engine.finalize()
}
