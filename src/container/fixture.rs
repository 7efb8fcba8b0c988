//! Test-only container construction.

use std::path::{Path, PathBuf};

use super::format::{FrameIndexEntry, GpuFormat};

pub(crate) fn header_bytes(
    width: u32,
    height: u32,
    frame_count: u32,
    fps: f32,
    format_code: u32,
    frame_bytes: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&frame_count.to_le_bytes());
    out.extend_from_slice(&fps.to_le_bytes());
    out.extend_from_slice(&format_code.to_le_bytes());
    out.extend_from_slice(&frame_bytes.to_le_bytes());
    out
}

/// Deterministic, mildly compressible frame contents.
pub(crate) fn frame_pattern(frame: u32, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| ((i / 7) as u32 ^ frame.wrapping_mul(31)) as u8)
        .collect()
}

/// Builds containers the way an external encoder would.
pub(crate) struct ContainerBuilder {
    width: u32,
    height: u32,
    fps: f32,
    format: GpuFormat,
    frame_bytes: u32,
    frames: Vec<Vec<u8>>,
    padding: usize,
    reverse: bool,
}

impl ContainerBuilder {
    pub(crate) fn new(width: u32, height: u32, format: GpuFormat) -> Self {
        Self {
            width,
            height,
            fps: 30.0,
            format,
            frame_bytes: format.frame_bytes(width, height) as u32,
            frames: Vec::new(),
            padding: 0,
            reverse: false,
        }
    }

    pub(crate) fn fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Override the declared frame size without touching the payloads.
    pub(crate) fn declared_frame_bytes(mut self, frame_bytes: u32) -> Self {
        self.frame_bytes = frame_bytes;
        self
    }

    /// Append `count` frames filled with [`frame_pattern`].
    pub(crate) fn pattern_frames(mut self, count: u32) -> Self {
        let len = self.format.frame_bytes(self.width, self.height) as usize;
        for i in 0..count {
            self.frames.push(frame_pattern(i, len));
        }
        self
    }

    pub(crate) fn frame(mut self, data: Vec<u8>) -> Self {
        self.frames.push(data);
        self
    }

    /// Junk bytes written before each frame block.
    pub(crate) fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Write frame blocks in reverse order (the index stays in frame order).
    pub(crate) fn reverse_blocks(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub(crate) fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut out = header_bytes(
            self.width,
            self.height,
            self.frames.len() as u32,
            self.fps,
            self.format.code(),
            self.frame_bytes,
        );

        let mut entries = vec![
            FrameIndexEntry {
                offset: 0,
                compressed_size: 0
            };
            self.frames.len()
        ];

        let mut order: Vec<usize> = (0..self.frames.len()).collect();
        if self.reverse {
            order.reverse();
        }

        for i in order {
            out.extend(std::iter::repeat_n(0xAB, self.padding));
            let compressed = lz4_flex::block::compress(&self.frames[i]);
            entries[i] = FrameIndexEntry {
                offset: out.len() as u64,
                compressed_size: compressed.len() as u64,
            };
            out.extend_from_slice(&compressed);
        }

        for entry in &entries {
            out.extend_from_slice(&entry.offset.to_le_bytes());
            out.extend_from_slice(&entry.compressed_size.to_le_bytes());
        }
        out
    }

    pub(crate) fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
