//! Secure random bytes from the operating system CSPRNG.
//!
//! Failures are reported once with the provider's status code; nothing here
//! retries.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{ProviderStatus, RandomError};

fn status_of(err: &rand::Error) -> ProviderStatus {
    err.raw_os_error()
        .or_else(|| err.code().map(|code| code.get() as i32))
        .unwrap_or(-1)
}

/// Fill `buf` from the OS generator.
pub fn fill_bytes(buf: &mut [u8]) -> Result<(), RandomError> {
    fill_bytes_with(&mut OsRng, buf)
}

/// `size` fresh random bytes from the OS generator.
pub fn generate_bytes(size: usize) -> Result<Vec<u8>, RandomError> {
    generate_bytes_with(&mut OsRng, size)
}

pub fn fill_bytes_with<R>(rng: &mut R, buf: &mut [u8]) -> Result<(), RandomError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    rng.try_fill_bytes(buf).map_err(|e| {
        let status = status_of(&e);
        tracing::debug!(status, len = buf.len(), "random generation failed: {e}");
        RandomError::GenerationFailed { status }
    })
}

/// `size` random bytes from a caller-supplied cryptographic generator.
pub fn generate_bytes_with<R>(rng: &mut R, size: usize) -> Result<Vec<u8>, RandomError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut buf = vec![0u8; size];
    fill_bytes_with(rng, &mut buf)?;
    Ok(buf)
}
