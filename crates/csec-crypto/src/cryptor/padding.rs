//! PKCS#7 padding for the final cryptor block.

use subtle::{ConstantTimeEq, ConstantTimeGreater};

/// Fill `block[filled..]` with PKCS#7 padding. `filled` is strictly less
/// than the block length, so at least one padding byte is always written.
pub(crate) fn pad_block(block: &mut [u8], filled: usize) {
    debug_assert!(filled < block.len() && block.len() <= 255);
    let pad = (block.len() - filled) as u8;
    block[filled..].fill(pad);
}

/// Validate the padding of a decrypted final block and return the number of
/// content bytes it holds.
///
/// Every byte of the block is examined regardless of where a mismatch
/// occurs, so timing does not reveal which padding byte was wrong.
pub(crate) fn unpadded_len(block: &[u8]) -> Option<usize> {
    let block_size = block.len();
    debug_assert!((1..=255).contains(&block_size));
    let pad = block[block_size - 1];

    let mut valid = pad.ct_gt(&0) & !pad.ct_gt(&(block_size as u8));
    for (i, byte) in block.iter().enumerate() {
        // 1-based distance from the end of the block
        let distance = (block_size - i) as u8;
        let in_padding = !distance.ct_gt(&pad);
        valid &= !in_padding | byte.ct_eq(&pad);
    }

    if bool::from(valid) {
        Some(block_size - pad as usize)
    } else {
        None
    }
}
