//! Per-frame reads from a live source.

use std::path::Path;

use super::{VideoReader, check_request};
use crate::container::{
    ContainerHeader, ContainerIndex, FileSource, RandomAccessSource, decompress_frame,
};
use crate::error::{Error, Result};

/// Streams frames from a [`RandomAccessSource`], one seek and read per frame.
///
/// The source cursor and the compressed-block buffer are shared by every
/// call, which is why `read` takes `&mut self`: one caller at a time.
///
/// Usage:
/// ```ignore
/// let mut reader = StreamingReader::open("clip.gv")?;
/// let mut frame = vec![0u8; reader.frame_bytes() as usize];
/// reader.read(&mut frame, 42)?;
/// ```
pub struct StreamingReader<S = FileSource> {
    source: S,
    index: ContainerIndex,
    /// Sized once to the largest compressed block.
    scratch: Vec<u8>,
}

impl StreamingReader<FileSource> {
    /// Open a container file for streaming.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, false)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, strict_frame_bytes: bool) -> Result<Self> {
        let source = FileSource::open(path)?;
        Self::from_source_with(source, strict_frame_bytes)
    }
}

impl<S: RandomAccessSource> StreamingReader<S> {
    /// Parse a container from an already open source.
    pub fn from_source(source: S) -> Result<Self> {
        Self::from_source_with(source, false)
    }

    pub fn from_source_with(mut source: S, strict_frame_bytes: bool) -> Result<Self> {
        let index = ContainerIndex::parse_with(&mut source, strict_frame_bytes)?;

        let scratch_len = usize::try_from(index.max_compressed_size).map_err(|_| {
            Error::IndexOutOfRange(format!(
                "compressed block of {} bytes exceeds address space",
                index.max_compressed_size
            ))
        })?;

        Ok(Self {
            source,
            index,
            scratch: vec![0u8; scratch_len],
        })
    }

    pub fn index(&self) -> &ContainerIndex {
        &self.index
    }

    /// Give back the source, dropping the parsed index.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RandomAccessSource + Send> VideoReader for StreamingReader<S> {
    fn header(&self) -> &ContainerHeader {
        &self.index.header
    }

    fn is_thread_safe(&self) -> bool {
        false
    }

    fn read(&mut self, dst: &mut [u8], frame: u32) -> Result<()> {
        check_request(&self.index.header, dst, frame)?;

        let entry = *self.index.entry(frame)?;
        // Bounded by max_compressed_size, which fit in usize at open
        let size = entry.compressed_size as usize;
        let block = &mut self.scratch[..size];
        self.source.read_exact_at(entry.offset, block)?;

        decompress_frame(block, dst)
            .map_err(|source| Error::DecompressionFailure { frame, source })?;

        log::trace!("Streamed frame {} ({} -> {} bytes)", frame, size, dst.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixture::ContainerBuilder;
    use crate::container::{GpuFormat, MemorySource};
    use tempfile::tempdir;

    #[test]
    fn test_scratch_sized_to_largest_block() {
        // Incompressible frame next to a trivially compressible one
        let noisy: Vec<u8> = (0..512u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        let builder = ContainerBuilder::new(32, 16, GpuFormat::Dxt5)
            .frame(vec![0u8; 512])
            .frame(noisy);

        let reader = StreamingReader::from_source(MemorySource::new(builder.build())).unwrap();
        let largest = reader
            .index()
            .entries
            .iter()
            .map(|e| e.compressed_size)
            .max()
            .unwrap();
        assert_eq!(reader.scratch.len() as u64, largest);
    }

    #[test]
    fn test_scrub_backwards_and_forwards() {
        let dir = tempdir().unwrap();
        let builder = ContainerBuilder::new(32, 32, GpuFormat::Dxt1)
            .pattern_frames(8)
            .padding(3);
        let path = builder.write_to(dir.path(), "scrub.gv");

        let mut reader = StreamingReader::open(&path).unwrap();
        let mut buf = vec![0u8; reader.frame_bytes() as usize];
        for frame in [7, 0, 3, 3, 6, 1] {
            reader.read(&mut buf, frame).unwrap();
            assert_eq!(buf, builder.frames()[frame as usize]);
        }
    }

    #[test]
    fn test_file_shrunk_after_open() {
        let dir = tempdir().unwrap();
        let builder = ContainerBuilder::new(16, 16, GpuFormat::Dxt1).pattern_frames(2);
        let path = builder.write_to(dir.path(), "shrink.gv");

        let mut reader = StreamingReader::open(&path).unwrap();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(30).unwrap();

        let mut buf = vec![0u8; 128];
        let err = reader.read(&mut buf, 1).unwrap_err();
        assert!(matches!(err, Error::TruncatedRead { .. }));
    }
}
