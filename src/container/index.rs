//! Header and trailing index table parsing.

use super::format::{ContainerHeader, FrameIndexEntry, HEADER_SIZE};
use super::source::RandomAccessSource;
use crate::error::{Error, Result};

/// Parsed container metadata: header plus validated frame index.
#[derive(Debug, Clone)]
pub struct ContainerIndex {
    pub header: ContainerHeader,
    pub entries: Vec<FrameIndexEntry>,
    /// Byte offset where the index table starts.
    pub index_start: u64,
    /// Total source length.
    pub file_len: u64,
    /// Largest compressed frame block, used to size read buffers.
    pub max_compressed_size: u64,
}

impl ContainerIndex {
    /// Parse with the permissive frame size check (warn only).
    pub fn parse<S: RandomAccessSource + ?Sized>(source: &mut S) -> Result<Self> {
        Self::parse_with(source, false)
    }

    /// Parse header and index.
    ///
    /// With `strict_frame_bytes`, a header whose frame size disagrees with its
    /// dimensions and format is rejected instead of logged.
    pub fn parse_with<S: RandomAccessSource + ?Sized>(
        source: &mut S,
        strict_frame_bytes: bool,
    ) -> Result<Self> {
        let header = ContainerHeader::read_from(source)?;

        if !header.frame_bytes_consistent() {
            let expected = header.expected_frame_bytes();
            if strict_frame_bytes {
                return Err(Error::FrameSizeMismatch {
                    declared: header.frame_bytes,
                    expected,
                });
            }
            log::warn!(
                "Header declares {} bytes per frame but {}x{} {:?} implies {}",
                header.frame_bytes,
                header.width,
                header.height,
                header.format,
                expected
            );
        }

        // Index table sits at the very end of the file
        let file_len = source.total_len()?;
        let table_size = u64::from(header.frame_count) * FrameIndexEntry::SIZE;
        let index_start = file_len.checked_sub(table_size).ok_or_else(|| {
            Error::IndexOutOfRange(format!(
                "index table of {} entries ({} bytes) does not fit in {} byte file",
                header.frame_count, table_size, file_len
            ))
        })?;
        if index_start < HEADER_SIZE {
            return Err(Error::IndexOutOfRange(format!(
                "index table starts at {} inside the {} byte header",
                index_start, HEADER_SIZE
            )));
        }

        let table_len = usize::try_from(table_size)
            .map_err(|_| Error::IndexOutOfRange(format!("index table of {table_size} bytes")))?;
        let mut table = vec![0u8; table_len];
        source.read_exact_at(index_start, &mut table)?;

        let mut entries = Vec::with_capacity(header.frame_count as usize);
        let mut max_compressed_size = 0;
        for (frame, raw) in table.chunks_exact(FrameIndexEntry::SIZE as usize).enumerate() {
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(raw);
            let entry = FrameIndexEntry::from_bytes(&bytes);

            let in_range = entry.offset >= HEADER_SIZE
                && entry.end().is_some_and(|end| end <= index_start);
            if !in_range {
                return Err(Error::IndexOutOfRange(format!(
                    "frame {} block [{}, +{}) outside data region [{}, {})",
                    frame, entry.offset, entry.compressed_size, HEADER_SIZE, index_start
                )));
            }

            max_compressed_size = max_compressed_size.max(entry.compressed_size);
            entries.push(entry);
        }

        log::debug!(
            "Parsed container: {}x{} {:?}, {} frames, index at {}, largest block {} bytes",
            header.width,
            header.height,
            header.format,
            header.frame_count,
            index_start,
            max_compressed_size
        );

        Ok(Self {
            header,
            entries,
            index_start,
            file_len,
            max_compressed_size,
        })
    }

    /// Entry for `frame`, or [`Error::InvalidFrameIndex`].
    pub fn entry(&self, frame: u32) -> Result<&FrameIndexEntry> {
        self.entries
            .get(frame as usize)
            .ok_or(Error::InvalidFrameIndex {
                frame: i64::from(frame),
                frame_count: self.header.frame_count,
            })
    }

    /// Sum of all compressed block sizes.
    pub fn compressed_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.compressed_size).sum()
    }
}
