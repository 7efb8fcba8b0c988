//! Error type shared by container parsing, readers and playback.

use std::io;
use std::path::PathBuf;

use crate::container::DecompressError;
use crate::schema::ConfigError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while opening containers or reading frames.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Container not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Short read at offset {offset}: wanted {expected} bytes, got {actual}")]
    TruncatedRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Unknown compression format code {0}")]
    UnknownFormat(u32),

    #[error("Header declares {declared} bytes per frame, dimensions imply {expected}")]
    FrameSizeMismatch { declared: u32, expected: u64 },

    #[error("Frame {frame} failed to decompress: {source}")]
    DecompressionFailure {
        frame: u32,
        #[source]
        source: DecompressError,
    },

    #[error("Frame index {frame} out of range (frame count {frame_count})")]
    InvalidFrameIndex { frame: i64, frame_count: u32 },

    #[error("Destination buffer is {actual} bytes, frames are {expected} bytes")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Cannot allocate {bytes} bytes for decompressed frames")]
    OutOfMemory { bytes: u64 },

    #[error("Invalid loader configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Background loader exited without delivering a reader")]
    LoaderDisconnected,
}
