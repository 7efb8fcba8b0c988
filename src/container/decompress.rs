//! LZ4 frame decompression into fixed-size destinations.

/// Why a frame block could not be decompressed.
#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    #[error("LZ4 decoder rejected block: {0}")]
    Decoder(#[from] lz4_flex::block::DecompressError),

    #[error("Decoded {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Decompress one LZ4 block into `dst`, which must come out exactly full.
///
/// Blocks carry no length prefix; the size of `dst` is the header's frame
/// size, fixed by the texture dimensions and format.
pub fn decompress_frame(compressed: &[u8], dst: &mut [u8]) -> Result<(), DecompressError> {
    let written = lz4_flex::block::decompress_into(compressed, dst)?;
    if written != dst.len() {
        return Err(DecompressError::LengthMismatch {
            expected: dst.len(),
            actual: written,
        });
    }
    Ok(())
}
