//! Frame readers over `.gv` containers.
//!
//! Three strategies trade load time, memory and per-frame cost:
//!
//! - [`StreamingReader`]: keeps the file open, reads and decompresses one
//!   block per call. Fast to open, small footprint, one caller at a time.
//! - [`MemoryResidentReader`]: loads the whole file up front and decompresses
//!   from memory. No I/O per frame, safe to share between threads.
//! - [`PrecomputedReader`]: decompresses every frame at load time. Reads are
//!   a copy; memory cost is `frame_count * frame_bytes`.
//!
//! All three implement [`VideoReader`]. The two that can be read from several
//! threads at once also implement [`SharedVideoReader`].

mod memory;
mod precomputed;
mod streaming;

pub use memory::MemoryResidentReader;
pub use precomputed::PrecomputedReader;
pub use streaming::StreamingReader;

use std::path::Path;

use crate::container::{ContainerHeader, GpuFormat, MemorySource};
use crate::error::{Error, Result};
use crate::schema::{LoadMode, LoaderConfig};

/// Random-access source of decompressed GPU texture frames.
pub trait VideoReader: Send {
    /// Container header this reader serves frames for.
    fn header(&self) -> &ContainerHeader;

    /// Whether the underlying strategy tolerates concurrent readers.
    ///
    /// Readers reporting `true` also implement [`SharedVideoReader`].
    fn is_thread_safe(&self) -> bool;

    /// Decompress `frame` into `dst`, which must be exactly
    /// [`frame_bytes`](Self::frame_bytes) long.
    ///
    /// On error `dst` may be partially written, except for
    /// [`Error::InvalidFrameIndex`] and [`Error::BufferSizeMismatch`], which
    /// are reported before anything is touched.
    fn read(&mut self, dst: &mut [u8], frame: u32) -> Result<()>;

    fn width(&self) -> u32 {
        self.header().width
    }

    fn height(&self) -> u32 {
        self.header().height
    }

    fn frame_count(&self) -> u32 {
        self.header().frame_count
    }

    fn frames_per_second(&self) -> f32 {
        self.header().frames_per_second
    }

    fn format(&self) -> GpuFormat {
        self.header().format
    }

    fn frame_bytes(&self) -> u32 {
        self.header().frame_bytes
    }
}

/// Reader that can serve frames to several threads through `&self`.
pub trait SharedVideoReader: VideoReader + Sync {
    fn read_shared(&self, dst: &mut [u8], frame: u32) -> Result<()>;
}

/// Validate a read request against the header before touching `dst`.
pub(crate) fn check_request(header: &ContainerHeader, dst: &[u8], frame: u32) -> Result<()> {
    if frame >= header.frame_count {
        return Err(Error::InvalidFrameIndex {
            frame: i64::from(frame),
            frame_count: header.frame_count,
        });
    }
    if dst.len() != header.frame_bytes as usize {
        return Err(Error::BufferSizeMismatch {
            expected: header.frame_bytes as usize,
            actual: dst.len(),
        });
    }
    Ok(())
}

/// Open a container file with the given strategy.
pub fn open<P: AsRef<Path>>(path: P, mode: LoadMode) -> Result<Box<dyn VideoReader>> {
    open_with_config(&LoaderConfig::new(path.as_ref(), mode))
}

/// Open a container file as described by `config`.
pub fn open_with_config(config: &LoaderConfig) -> Result<Box<dyn VideoReader>> {
    config.validate()?;
    let strict = config.strict_frame_bytes;

    let reader: Box<dyn VideoReader> = match config.mode {
        LoadMode::Streaming => Box::new(StreamingReader::open_with(&config.path, strict)?),
        LoadMode::MemoryResident => {
            Box::new(MemoryResidentReader::open_with(&config.path, strict)?)
        }
        LoadMode::Precomputed => {
            let mut inner = StreamingReader::open_with(&config.path, strict)?;
            Box::new(PrecomputedReader::new(&mut inner)?)
        }
    };

    log_opened(&config.path.display().to_string(), config.mode, reader.as_ref());
    Ok(reader)
}

/// Open a container already held in memory.
pub fn open_bytes(bytes: Vec<u8>, mode: LoadMode) -> Result<Box<dyn VideoReader>> {
    open_bytes_with(bytes, mode, false)
}

/// Open a container already held in memory, optionally rejecting headers
/// whose frame size disagrees with their dimensions.
pub fn open_bytes_with(
    bytes: Vec<u8>,
    mode: LoadMode,
    strict_frame_bytes: bool,
) -> Result<Box<dyn VideoReader>> {
    let len = bytes.len();
    let reader: Box<dyn VideoReader> = match mode {
        LoadMode::Streaming => Box::new(StreamingReader::from_source_with(
            MemorySource::new(bytes),
            strict_frame_bytes,
        )?),
        LoadMode::MemoryResident => Box::new(MemoryResidentReader::from_bytes_with(
            bytes,
            strict_frame_bytes,
        )?),
        LoadMode::Precomputed => {
            let mut inner = MemoryResidentReader::from_bytes_with(bytes, strict_frame_bytes)?;
            Box::new(PrecomputedReader::new(&mut inner)?)
        }
    };

    log_opened(&format!("<{} bytes in memory>", len), mode, reader.as_ref());
    Ok(reader)
}

fn log_opened(name: &str, mode: LoadMode, reader: &dyn VideoReader) {
    log::info!(
        "Opened {} ({:?}): {}x{} {:?}, {} frames @ {} fps",
        name,
        mode,
        reader.width(),
        reader.height(),
        reader.format(),
        reader.frame_count(),
        reader.frames_per_second()
    );
}

/// Zeroed buffer of `bytes` bytes, or [`Error::OutOfMemory`] if it cannot
/// be allocated.
pub(crate) fn alloc_zeroed(bytes: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(bytes).map_err(|_| Error::OutOfMemory { bytes })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { bytes })?;
    buf.resize(len, 0);
    Ok(buf)
}
