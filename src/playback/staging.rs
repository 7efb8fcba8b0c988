//! CPU-side staging of the current frame for GPU upload.

use serde::Serialize;

use crate::container::GpuFormat;
use crate::error::{Error, Result};
use crate::reader::{VideoReader, alloc_zeroed};

/// Shape of the staged bytes, for whoever creates and fills the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadLayout {
    pub format: GpuFormat,
    pub width: u32,
    pub height: u32,
    /// Bytes in one row of 4x4 blocks.
    pub bytes_per_row: u64,
    /// Number of block rows.
    pub rows: u32,
}

/// Owns a reader and one frame of staging memory.
///
/// The playback loop calls [`update`](Self::update) with whatever frame its
/// clock selects, then [`take_upload`](Self::take_upload) to get the bytes
/// once per change.
pub struct FrameStagingBuffer {
    reader: Box<dyn VideoReader>,
    memory: Vec<u8>,
    current: Option<u32>,
    needs_upload: bool,
}

impl FrameStagingBuffer {
    /// Wrap `reader`, allocating one frame of staging memory.
    ///
    /// Fails with [`Error::OutOfMemory`] if the header's frame size cannot be
    /// allocated.
    pub fn new(reader: Box<dyn VideoReader>) -> Result<Self> {
        let memory = alloc_zeroed(u64::from(reader.frame_bytes()))?;
        Ok(Self {
            reader,
            memory,
            current: None,
            needs_upload: false,
        })
    }

    pub fn reader(&self) -> &dyn VideoReader {
        self.reader.as_ref()
    }

    pub fn into_reader(self) -> Box<dyn VideoReader> {
        self.reader
    }

    /// Frame currently held in staging memory.
    pub fn current_frame(&self) -> Option<u32> {
        self.current
    }

    /// Stage `frame`. Returns `false` if it was already staged.
    ///
    /// Negative and out-of-range indices fail with
    /// [`Error::InvalidFrameIndex`] and leave the staged frame alone. Any
    /// other read failure may have overwritten part of staging memory, so
    /// nothing is staged afterwards.
    pub fn update(&mut self, frame: i64) -> Result<bool> {
        let frame_count = self.reader.frame_count();
        let index = u32::try_from(frame)
            .ok()
            .filter(|&f| f < frame_count)
            .ok_or(Error::InvalidFrameIndex { frame, frame_count })?;

        if self.current == Some(index) {
            return Ok(false);
        }

        if let Err(e) = self.reader.read(&mut self.memory, index) {
            self.current = None;
            self.needs_upload = false;
            return Err(e);
        }

        self.current = Some(index);
        self.needs_upload = true;
        Ok(true)
    }

    /// Staged bytes if they changed since the last call.
    pub fn take_upload(&mut self) -> Option<&[u8]> {
        if !self.needs_upload {
            return None;
        }
        self.needs_upload = false;
        Some(self.memory.as_slice())
    }

    /// Staged bytes regardless of upload state.
    pub fn staged(&self) -> Option<&[u8]> {
        self.current.map(|_| self.memory.as_slice())
    }

    pub fn upload_layout(&self) -> UploadLayout {
        let format = self.reader.format();
        let width = self.reader.width();
        let height = self.reader.height();
        UploadLayout {
            format,
            width,
            height,
            bytes_per_row: format.bytes_per_row(width),
            rows: height.div_ceil(4),
        }
    }
}
