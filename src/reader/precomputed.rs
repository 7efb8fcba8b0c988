//! Eagerly decompressed reader.

use super::{SharedVideoReader, VideoReader, alloc_zeroed, check_request};
use crate::container::ContainerHeader;
use crate::error::{Error, Result};

/// Every frame decompressed up front into one flat buffer.
///
/// Construction pulls each frame from another reader in order; afterwards
/// reads are a single copy with no decoding and no allocation.
pub struct PrecomputedReader {
    header: ContainerHeader,
    frames: Vec<u8>,
}

impl PrecomputedReader {
    /// Decompress all frames of `inner`.
    ///
    /// Allocates `frame_count * frame_bytes` bytes exactly once. The inner
    /// reader is only borrowed; drop it afterwards to release its resources.
    pub fn new<R: VideoReader + ?Sized>(inner: &mut R) -> Result<Self> {
        let header = inner.header().clone();
        let frame_bytes = header.frame_bytes as usize;
        let mut frames = alloc_zeroed(header.decompressed_bytes())?;

        for frame in 0..header.frame_count {
            let start = frame as usize * frame_bytes;
            inner.read(&mut frames[start..start + frame_bytes], frame)?;
        }

        log::debug!(
            "Precomputed {} frames ({} bytes)",
            header.frame_count,
            frames.len()
        );

        Ok(Self { header, frames })
    }

    /// Size of the decompressed frame store.
    pub fn resident_bytes(&self) -> usize {
        self.frames.len()
    }

    /// Borrow a frame without copying.
    pub fn frame(&self, frame: u32) -> Result<&[u8]> {
        if frame >= self.header.frame_count {
            return Err(Error::InvalidFrameIndex {
                frame: i64::from(frame),
                frame_count: self.header.frame_count,
            });
        }
        let frame_bytes = self.header.frame_bytes as usize;
        let start = frame as usize * frame_bytes;
        Ok(&self.frames[start..start + frame_bytes])
    }
}

impl SharedVideoReader for PrecomputedReader {
    fn read_shared(&self, dst: &mut [u8], frame: u32) -> Result<()> {
        check_request(&self.header, dst, frame)?;
        dst.copy_from_slice(self.frame(frame)?);
        Ok(())
    }
}

impl VideoReader for PrecomputedReader {
    fn header(&self) -> &ContainerHeader {
        &self.header
    }

    fn is_thread_safe(&self) -> bool {
        true
    }

    fn read(&mut self, dst: &mut [u8], frame: u32) -> Result<()> {
        self.read_shared(dst, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixture::{ContainerBuilder, header_bytes};
    use crate::container::{GpuFormat, MemorySource};
    use crate::reader::{MemoryResidentReader, StreamingReader};
    use std::sync::Arc;

    /// Records the order frames are requested in.
    struct Recording<R> {
        inner: R,
        requests: Vec<u32>,
    }

    impl<R: VideoReader> VideoReader for Recording<R> {
        fn header(&self) -> &ContainerHeader {
            self.inner.header()
        }

        fn is_thread_safe(&self) -> bool {
            false
        }

        fn read(&mut self, dst: &mut [u8], frame: u32) -> Result<()> {
            self.requests.push(frame);
            self.inner.read(dst, frame)
        }
    }

    #[test]
    fn test_reads_inner_once_in_order() {
        let bytes = ContainerBuilder::new(16, 16, GpuFormat::Dxt1)
            .pattern_frames(5)
            .reverse_blocks()
            .build();
        let mut recording = Recording {
            inner: MemoryResidentReader::from_bytes(bytes).unwrap(),
            requests: Vec::new(),
        };

        let reader = PrecomputedReader::new(&mut recording).unwrap();
        assert_eq!(recording.requests, vec![0, 1, 2, 3, 4]);
        assert_eq!(reader.resident_bytes(), 5 * 128);
    }

    #[test]
    fn test_wrap_transparency() {
        let builder = ContainerBuilder::new(32, 32, GpuFormat::Dxt5)
            .fps(60.0)
            .pattern_frames(7)
            .padding(11);
        let mut inner = StreamingReader::from_source(MemorySource::new(builder.build())).unwrap();
        let mut reader = PrecomputedReader::new(&mut inner).unwrap();

        assert_eq!(reader.header(), inner.header());
        assert!(reader.is_thread_safe());

        let mut expected = vec![0u8; 1024];
        let mut actual = vec![0u8; 1024];
        for frame in 0..7 {
            inner.read(&mut expected, frame).unwrap();
            reader.read(&mut actual, frame).unwrap();
            assert_eq!(actual, expected);
            assert_eq!(reader.frame(frame).unwrap(), &expected[..]);
        }
    }

    #[test]
    fn test_empty_container() {
        let bytes = header_bytes(64, 64, 0, 30.0, 1, 2048);
        let mut inner = MemoryResidentReader::from_bytes(bytes).unwrap();
        let reader = PrecomputedReader::new(&mut inner).unwrap();
        assert_eq!(reader.resident_bytes(), 0);
        assert!(matches!(
            reader.frame(0),
            Err(Error::InvalidFrameIndex { frame: 0, .. })
        ));
    }

    /// Header-only reader claiming an absurd amount of frame data.
    struct Oversized(ContainerHeader);

    impl VideoReader for Oversized {
        fn header(&self) -> &ContainerHeader {
            &self.0
        }

        fn is_thread_safe(&self) -> bool {
            true
        }

        fn read(&mut self, _dst: &mut [u8], _frame: u32) -> Result<()> {
            unreachable!("allocation should fail first")
        }
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let mut inner = Oversized(ContainerHeader {
            width: 1 << 16,
            height: 1 << 16,
            frame_count: u32::MAX,
            frames_per_second: 30.0,
            format: GpuFormat::Bc7,
            frame_bytes: u32::MAX,
        });
        let err = PrecomputedReader::new(&mut inner).err().unwrap();
        assert!(matches!(err, Error::OutOfMemory { bytes } if bytes == u64::from(u32::MAX) * u64::from(u32::MAX)));
    }

    #[test]
    fn test_shared_across_threads() {
        let builder = ContainerBuilder::new(16, 16, GpuFormat::Bc7).pattern_frames(9);
        let mut inner = MemoryResidentReader::from_bytes(builder.build()).unwrap();
        let reader = Arc::new(PrecomputedReader::new(&mut inner).unwrap());
        drop(inner);

        let handles: Vec<_> = (0..3u32)
            .map(|t| {
                let reader = Arc::clone(&reader);
                std::thread::spawn(move || {
                    let mut buf = vec![0u8; reader.frame_bytes() as usize];
                    let mut seen = Vec::new();
                    for frame in (t..9).step_by(3) {
                        reader.read_shared(&mut buf, frame).unwrap();
                        seen.push((frame, buf.clone()));
                    }
                    seen
                })
            })
            .collect();

        for handle in handles {
            for (frame, data) in handle.join().unwrap() {
                assert_eq!(data, builder.frames()[frame as usize]);
            }
        }
    }
}
