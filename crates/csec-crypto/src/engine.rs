//! Streaming engine: the `init → update* → final` state machine shared by
//! the digester and both halves of HMAC.
//!
//! The engine knows nothing about the algorithm it drives. Every provider
//! call goes through [`StreamPrimitive`], and every entry point checks the
//! [`EngineState`] before touching the provider.

use digest::generic_array::GenericArray;
use digest::Digest;

use csec_core::HashAlgorithm;

use crate::error::{EngineError, ProviderStatus};
use crate::registry::{digest_descriptor, DigestDescriptor};

/// Provider contract for an incremental one-way function.
///
/// Each call reports a provider status: `Ok(())` for success, `Err(status)`
/// with a nonzero code otherwise.
pub trait StreamPrimitive {
    /// Exact number of bytes written by [`StreamPrimitive::finalize_into`].
    fn output_len(&self) -> usize;

    /// (Re)initialize the context to the algorithm's starting state.
    fn init(&mut self) -> Result<(), ProviderStatus>;

    fn update(&mut self, data: &[u8]) -> Result<(), ProviderStatus>;

    /// Write the result into `out[..output_len()]`.
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<(), ProviderStatus>;
}

/// Provider context for every registered hash, selected by algorithm.
#[derive(Clone)]
pub enum DigestCore {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

macro_rules! dispatch {
    ($core:expr, $inner:ident => $body:expr) => {
        match $core {
            DigestCore::Md5($inner) => $body,
            DigestCore::Sha1($inner) => $body,
            DigestCore::Sha224($inner) => $body,
            DigestCore::Sha256($inner) => $body,
            DigestCore::Sha384($inner) => $body,
            DigestCore::Sha512($inner) => $body,
        }
    };
}

impl DigestCore {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => DigestCore::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => DigestCore::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => DigestCore::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => DigestCore::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => DigestCore::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => DigestCore::Sha512(sha2::Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            DigestCore::Md5(_) => HashAlgorithm::Md5,
            DigestCore::Sha1(_) => HashAlgorithm::Sha1,
            DigestCore::Sha224(_) => HashAlgorithm::Sha224,
            DigestCore::Sha256(_) => HashAlgorithm::Sha256,
            DigestCore::Sha384(_) => HashAlgorithm::Sha384,
            DigestCore::Sha512(_) => HashAlgorithm::Sha512,
        }
    }

    pub fn descriptor(&self) -> &'static DigestDescriptor {
        digest_descriptor(self.algorithm())
    }
}

impl StreamPrimitive for DigestCore {
    fn output_len(&self) -> usize {
        self.descriptor().output_len
    }

    fn init(&mut self) -> Result<(), ProviderStatus> {
        dispatch!(self, inner => Digest::reset(inner));
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<(), ProviderStatus> {
        dispatch!(self, inner => Digest::update(inner, data));
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<(), ProviderStatus> {
        let len = self.output_len();
        let out = &mut out[..len];
        dispatch!(self, inner => {
            Digest::finalize_into_reset(inner, GenericArray::from_mut_slice(out))
        });
        Ok(())
    }
}

impl Drop for DigestCore {
    fn drop(&mut self) {
        // overwrite buffered message bytes and chaining state
        dispatch!(self, inner => Digest::reset(inner));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Initialized, no data absorbed yet
    Ready,
    /// At least one update absorbed
    Active,
    /// Final produced (or a provider call failed); only `reset` is accepted
    Finalized,
}

/// Incremental driver over one provider context.
pub struct Engine<P: StreamPrimitive = DigestCore> {
    primitive: P,
    state: EngineState,
    status: ProviderStatus,
}

impl Engine<DigestCore> {
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, EngineError> {
        Self::with_primitive(DigestCore::new(algorithm))
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.primitive.algorithm()
    }
}

impl<P: StreamPrimitive> Engine<P> {
    /// Take ownership of a provider context and run its init primitive.
    pub fn with_primitive(primitive: P) -> Result<Self, EngineError> {
        let mut engine = Self {
            primitive,
            state: EngineState::Finalized,
            status: 0,
        };
        engine.reset()?;
        Ok(engine)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Status code of the most recent provider call.
    pub fn status(&self) -> ProviderStatus {
        self.status
    }

    pub fn output_len(&self) -> usize {
        self.primitive.output_len()
    }

    /// Re-run init on the existing context, from any state.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        match self.primitive.init() {
            Ok(()) => {
                self.status = 0;
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(status) => {
                self.fail(status);
                Err(EngineError::InitFailed { status })
            }
        }
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), EngineError> {
        if self.state == EngineState::Finalized {
            return Err(EngineError::AlreadyFinalized);
        }
        if let Err(status) = self.primitive.update(data) {
            self.fail(status);
            return Err(EngineError::UpdateFailed { status });
        }
        self.state = EngineState::Active;
        Ok(())
    }

    /// Write exactly [`Engine::output_len`] bytes into `out` and finalize.
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        if self.state == EngineState::Finalized {
            return Err(EngineError::AlreadyFinalized);
        }
        let needed = self.output_len();
        if out.len() < needed {
            return Err(EngineError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }
        self.state = EngineState::Finalized;
        if let Err(status) = self.primitive.finalize_into(&mut out[..needed]) {
            self.status = status;
            return Err(EngineError::FinalFailed { status });
        }
        Ok(needed)
    }

    pub fn finalize(&mut self) -> Result<Vec<u8>, EngineError> {
        let mut out = vec![0u8; self.output_len()];
        self.finalize_into(&mut out)?;
        Ok(out)
    }

    fn fail(&mut self, status: ProviderStatus) {
        tracing::debug!(status, "provider primitive failed; engine is terminal");
        self.status = status;
        self.state = EngineState::Finalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that fails the Nth call of a chosen kind.
    struct FlakyPrimitive {
        fail_init: Option<ProviderStatus>,
        fail_update_after: Option<(usize, ProviderStatus)>,
        fail_final: Option<ProviderStatus>,
        updates: usize,
        inner: DigestCore,
    }

    impl FlakyPrimitive {
        fn healthy() -> Self {
            Self {
                fail_init: None,
                fail_update_after: None,
                fail_final: None,
                updates: 0,
                inner: DigestCore::new(HashAlgorithm::Sha256),
            }
        }
    }

    impl StreamPrimitive for FlakyPrimitive {
        fn output_len(&self) -> usize {
            self.inner.output_len()
        }

        fn init(&mut self) -> Result<(), ProviderStatus> {
            match self.fail_init {
                Some(status) => Err(status),
                None => self.inner.init(),
            }
        }

        fn update(&mut self, data: &[u8]) -> Result<(), ProviderStatus> {
            self.updates += 1;
            match self.fail_update_after {
                Some((n, status)) if self.updates > n => Err(status),
                _ => self.inner.update(data),
            }
        }

        fn finalize_into(&mut self, out: &mut [u8]) -> Result<(), ProviderStatus> {
            match self.fail_final {
                Some(status) => Err(status),
                None => self.inner.finalize_into(out),
            }
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let mut engine = Engine::new(HashAlgorithm::Sha256).unwrap();
        assert_eq!(engine.state(), EngineState::Ready);

        engine.update(b"abc").unwrap();
        assert_eq!(engine.state(), EngineState::Active);

        let out = engine.finalize().unwrap();
        assert_eq!(out.len(), 32);
        assert_eq!(engine.state(), EngineState::Finalized);
    }

    #[test]
    fn test_update_after_final_rejected() {
        let mut engine = Engine::new(HashAlgorithm::Sha1).unwrap();
        engine.finalize().unwrap();

        assert_eq!(engine.update(b"late"), Err(EngineError::AlreadyFinalized));
        assert_eq!(engine.finalize(), Err(EngineError::AlreadyFinalized));
    }

    #[test]
    fn test_reset_restarts_computation() {
        let mut engine = Engine::new(HashAlgorithm::Sha256).unwrap();
        engine.update(b"discarded").unwrap();
        engine.finalize().unwrap();

        engine.reset().unwrap();
        engine.update(b"abc").unwrap();
        let after_reset = engine.finalize().unwrap();

        let mut fresh = Engine::new(HashAlgorithm::Sha256).unwrap();
        fresh.update(b"abc").unwrap();
        assert_eq!(after_reset, fresh.finalize().unwrap());
    }

    #[test]
    fn test_reset_mid_stream_discards_input() {
        let mut engine = Engine::new(HashAlgorithm::Sha512).unwrap();
        engine.update(b"partial input").unwrap();
        engine.reset().unwrap();
        let empty = engine.finalize().unwrap();

        let mut fresh = Engine::new(HashAlgorithm::Sha512).unwrap();
        assert_eq!(empty, fresh.finalize().unwrap());
    }

    #[test]
    fn test_finalize_into_short_buffer() {
        let mut engine = Engine::new(HashAlgorithm::Sha384).unwrap();
        let mut out = [0u8; 32];
        assert_eq!(
            engine.finalize_into(&mut out),
            Err(EngineError::BufferTooSmall {
                needed: 48,
                available: 32
            })
        );
        // a sizing mistake does not consume the engine
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[test]
    fn test_init_failure_carries_status() {
        let mut flaky = FlakyPrimitive::healthy();
        flaky.fail_init = Some(-4301);
        let result = Engine::with_primitive(flaky);
        assert!(matches!(result, Err(EngineError::InitFailed { status: -4301 })));
    }

    #[test]
    fn test_update_failure_is_terminal() {
        let mut flaky = FlakyPrimitive::healthy();
        flaky.fail_update_after = Some((1, 17));
        let mut engine = Engine::with_primitive(flaky).unwrap();

        engine.update(b"first").unwrap();
        assert_eq!(
            engine.update(b"second"),
            Err(EngineError::UpdateFailed { status: 17 })
        );
        assert_eq!(engine.status(), 17);
        assert_eq!(engine.state(), EngineState::Finalized);
        assert_eq!(engine.finalize(), Err(EngineError::AlreadyFinalized));
    }

    #[test]
    fn test_final_failure_carries_status() {
        let mut flaky = FlakyPrimitive::healthy();
        flaky.fail_final = Some(3);
        let mut engine = Engine::with_primitive(flaky).unwrap();
        engine.update(b"data").unwrap();

        assert_eq!(engine.finalize(), Err(EngineError::FinalFailed { status: 3 }));
        assert_eq!(engine.finalize(), Err(EngineError::AlreadyFinalized));
    }

    #[test]
    fn test_empty_update_is_accepted() {
        let mut engine = Engine::new(HashAlgorithm::Md5).unwrap();
        engine.update(b"").unwrap();
        let out = engine.finalize().unwrap();
        assert_eq!(out.len(), 16);
    }
}
