//! ISO/IEC 7816-4 padding to a block multiple.
//!
//! A `0x80` marker follows the data, then zeros up to the next multiple of
//! the block size. The marker is always written, so data already on a block
//! boundary gains a full block.

use crate::error::{Result, SealError};

/// Block size used for sealed payloads.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

const MARKER: u8 = 0x80;

/// Pad `data` to a multiple of `block_size`.
pub fn pad(data: &[u8], block_size: usize) -> Result<Vec<u8>> {
    if block_size == 0 {
        return Err(SealError::InvalidPadding("block size must be positive".into()));
    }
    let padded_len = (data.len() / block_size + 1) * block_size;
    let mut out = Vec::with_capacity(padded_len);
    out.extend_from_slice(data);
    out.push(MARKER);
    out.resize(padded_len, 0);
    Ok(out)
}

/// Strip padding added by [`pad`]. Returns the unpadded length.
pub fn unpadded_len(data: &[u8], block_size: usize) -> Result<usize> {
    if block_size == 0 || data.is_empty() || data.len() % block_size != 0 {
        return Err(SealError::InvalidPadding(format!(
            "length {} is not a multiple of {}",
            data.len(),
            block_size
        )));
    }
    let tail_start = data.len() - block_size;
    match data[tail_start..].iter().rposition(|&b| b != 0) {
        Some(i) if data[tail_start + i] == MARKER => Ok(tail_start + i),
        _ => Err(SealError::InvalidPadding("missing marker".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pad_short_message() {
        let padded = pad(b"abc", 8).unwrap();
        assert_eq!(padded, vec![b'a', b'b', b'c', 0x80, 0, 0, 0, 0]);
        assert_eq!(unpadded_len(&padded, 8).unwrap(), 3);
    }

    #[test]
    fn test_pad_on_boundary_adds_block() {
        let padded = pad(&[1u8; 8], 8).unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(padded[8], 0x80);
        assert_eq!(unpadded_len(&padded, 8).unwrap(), 8);
    }

    #[test]
    fn test_pad_empty() {
        let padded = pad(&[], 4).unwrap();
        assert_eq!(padded, vec![0x80, 0, 0, 0]);
        assert_eq!(unpadded_len(&padded, 4).unwrap(), 0);
    }

    #[test]
    fn test_unpad_rejects_bad_input() {
        assert!(unpadded_len(&[0u8; 8], 8).is_err());
        assert!(unpadded_len(&[0x80, 0, 0], 8).is_err());
        assert!(unpadded_len(&[1, 2, 3, 4], 4).is_err());
        assert!(pad(b"x", 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_pad_unpad(data in proptest::collection::vec(any::<u8>(), 0..200), block in 1usize..64) {
            let padded = pad(&data, block).unwrap();
            prop_assert_eq!(padded.len() % block, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert_eq!(unpadded_len(&padded, block).unwrap(), data.len());
        }
    }
}
