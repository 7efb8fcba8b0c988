//! Whole-file in-memory reader.

use std::path::Path;

use super::{SharedVideoReader, VideoReader, check_request};
use crate::container::{
    ContainerHeader, ContainerIndex, MemorySource, decompress_frame, not_found_or_io,
};
use crate::error::{Error, Result};

/// Holds the entire container in memory and decompresses frames from it.
///
/// Reads only borrow the buffer, so one reader can serve many threads.
pub struct MemoryResidentReader {
    source: MemorySource<Vec<u8>>,
    index: ContainerIndex,
}

impl MemoryResidentReader {
    /// Read the whole file, then close it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, false)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, strict_frame_bytes: bool) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| not_found_or_io(e, path))?;
        log::debug!("Loaded {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes_with(bytes, strict_frame_bytes)
    }

    /// Take ownership of a container already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(bytes, false)
    }

    pub fn from_bytes_with(bytes: Vec<u8>, strict_frame_bytes: bool) -> Result<Self> {
        let mut source = MemorySource::new(bytes);
        let index = ContainerIndex::parse_with(&mut source, strict_frame_bytes)?;
        Ok(Self { source, index })
    }

    pub fn index(&self) -> &ContainerIndex {
        &self.index
    }

    /// Size of the resident container.
    pub fn resident_bytes(&self) -> usize {
        self.source.as_bytes().len()
    }
}

impl SharedVideoReader for MemoryResidentReader {
    fn read_shared(&self, dst: &mut [u8], frame: u32) -> Result<()> {
        check_request(&self.index.header, dst, frame)?;

        let entry = self.index.entry(frame)?;
        let block = self
            .source
            .slice_at(entry.offset, entry.compressed_size)
            .ok_or_else(|| {
                Error::IndexOutOfRange(format!(
                    "frame {} block [{}, +{}) outside resident buffer",
                    frame, entry.offset, entry.compressed_size
                ))
            })?;

        decompress_frame(block, dst)
            .map_err(|source| Error::DecompressionFailure { frame, source })
    }
}

impl VideoReader for MemoryResidentReader {
    fn header(&self) -> &ContainerHeader {
        &self.index.header
    }

    fn is_thread_safe(&self) -> bool {
        true
    }

    fn read(&mut self, dst: &mut [u8], frame: u32) -> Result<()> {
        self.read_shared(dst, frame)
    }
}
