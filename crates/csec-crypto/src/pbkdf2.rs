//! PBKDF2 (RFC 8018) with HMAC as the PRF, plus round-count calibration.

use std::time::{Duration, Instant};

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use csec_core::HashAlgorithm;

use crate::error::Pbkdf2Error;
use crate::hmac::Hmac;
use crate::random;
use crate::registry::{digest_descriptor, MAX_DIGEST_LEN};

/// Key material produced by [`derive_key`].
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: Vec<u8>,
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive `key_size` bytes from `password` and `salt`.
pub fn derive_key(
    key_size: usize,
    password: &[u8],
    salt: &[u8],
    rounds: u32,
    algorithm: HashAlgorithm,
) -> Result<DerivedKey, Pbkdf2Error> {
    if rounds == 0 {
        return Err(Pbkdf2Error::InvalidRounds);
    }
    let h_len = digest_descriptor(algorithm).output_len;
    let max_key_size = u64::from(u32::MAX) * h_len as u64;
    if key_size == 0 || key_size as u64 > max_key_size {
        return Err(Pbkdf2Error::InvalidKeySize {
            algorithm,
            size: key_size,
        });
    }

    let mut prf = Hmac::new(algorithm, password)?;
    let mut derived = DerivedKey {
        bytes: vec![0u8; key_size],
    };
    let mut u = Zeroizing::new([0u8; MAX_DIGEST_LEN]);
    let mut t = Zeroizing::new([0u8; MAX_DIGEST_LEN]);

    for (index, block) in derived.bytes.chunks_mut(h_len).enumerate() {
        // block indices are 1-based; the size check keeps them within u32
        let counter = (index as u32 + 1).to_be_bytes();
        prf.restart()?.update(salt)?.update(&counter)?;
        prf.finalize_into(&mut u[..h_len])?;
        t[..h_len].copy_from_slice(&u[..h_len]);

        for _ in 1..rounds {
            prf.restart()?.update(&u[..h_len])?;
            prf.finalize_into(&mut u[..h_len])?;
            for (acc, x) in t[..h_len].iter_mut().zip(&u[..h_len]) {
                *acc ^= x;
            }
        }
        block.copy_from_slice(&t[..block.len()]);
    }

    Ok(derived)
}

/// Tuning knobs for [`calibrate_with`].
#[derive(Debug, Clone)]
pub struct CalibrationParams {
    /// Rounds in the first timed sample.
    pub trial_rounds: u32,
    /// The sample is repeated with doubled rounds until it takes at least
    /// this long.
    pub min_sample: Duration,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            trial_rounds: 1000,
            min_sample: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResult {
    /// Suggested round count, at least 1.
    pub rounds: u32,
    pub sample_rounds: u32,
    pub sample_elapsed: Duration,
}

/// Scale a measured sample linearly to `target`, clamped to `1..=u32::MAX`.
fn extrapolate(sample_rounds: u32, sample_elapsed: Duration, target: Duration) -> u32 {
    let elapsed = sample_elapsed.as_nanos().max(1);
    let rounds = u128::from(sample_rounds) * target.as_nanos() / elapsed;
    u32::try_from(rounds).unwrap_or(u32::MAX).max(1)
}

/// Estimate how many rounds take roughly `target` on this machine.
///
/// The result is advisory: it depends on current load and timer precision.
pub fn calibrate(
    password_len: usize,
    salt_len: usize,
    key_size: usize,
    algorithm: HashAlgorithm,
    target: Duration,
) -> Result<u32, Pbkdf2Error> {
    calibrate_with(
        password_len,
        salt_len,
        key_size,
        algorithm,
        target,
        &CalibrationParams::default(),
    )
    .map(|result| result.rounds)
}

pub fn calibrate_with(
    password_len: usize,
    salt_len: usize,
    key_size: usize,
    algorithm: HashAlgorithm,
    target: Duration,
    params: &CalibrationParams,
) -> Result<CalibrationResult, Pbkdf2Error> {
    let password = Zeroizing::new(random::generate_bytes(password_len)?);
    let salt = random::generate_bytes(salt_len)?;

    let mut sample_rounds = params.trial_rounds.max(1);
    loop {
        let start = Instant::now();
        derive_key(key_size, &password, &salt, sample_rounds, algorithm)?;
        let sample_elapsed = start.elapsed();

        if sample_elapsed >= params.min_sample || sample_rounds == u32::MAX {
            let rounds = extrapolate(sample_rounds, sample_elapsed, target);
            tracing::debug!(
                %algorithm,
                key_size,
                sample_rounds,
                sample_ms = sample_elapsed.as_secs_f64() * 1000.0,
                target_ms = target.as_secs_f64() * 1000.0,
                rounds,
                "pbkdf2 calibrated"
            );
            return Ok(CalibrationResult {
                rounds,
                sample_rounds,
                sample_elapsed,
            });
        }
        sample_rounds = sample_rounds.saturating_mul(2);
    }
}
