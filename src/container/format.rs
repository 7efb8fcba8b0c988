//! Binary layout of the container header and index entries.

use serde::Serialize;

use super::source::RandomAccessSource;
use crate::error::{Error, Result};

/// Size of the fixed header in bytes.
/// Width(4) + Height(4) + FrameCount(4) + Fps(4) + Format(4) + FrameBytes(4) = 24
pub const HEADER_SIZE: u64 = 24;

/// GPU block compression used by every frame in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum GpuFormat {
    /// DXT1/BC1 - RGB, 1-bit alpha, 8 bytes per block
    Dxt1 = 1,
    /// DXT3/BC2 - RGBA with explicit alpha, 16 bytes per block
    Dxt3 = 3,
    /// DXT5/BC3 - RGBA with interpolated alpha, 16 bytes per block
    Dxt5 = 5,
    /// BC7 - high quality RGBA, 16 bytes per block
    Bc7 = 7,
}

impl GpuFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(GpuFormat::Dxt1),
            3 => Some(GpuFormat::Dxt3),
            5 => Some(GpuFormat::Dxt5),
            7 => Some(GpuFormat::Bc7),
            _ => None,
        }
    }

    /// Code stored in the header.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Bytes per 4x4 pixel block.
    pub fn bytes_per_block(self) -> u32 {
        match self {
            GpuFormat::Dxt1 => 8,
            GpuFormat::Dxt3 | GpuFormat::Dxt5 | GpuFormat::Bc7 => 16,
        }
    }

    /// Bytes in one row of blocks for a texture `width` pixels wide.
    pub fn bytes_per_row(self, width: u32) -> u64 {
        u64::from(width.div_ceil(4)) * u64::from(self.bytes_per_block())
    }

    /// Size of one block-compressed frame of the given dimensions.
    pub fn frame_bytes(self, width: u32, height: u32) -> u64 {
        self.bytes_per_row(width) * u64::from(height.div_ceil(4))
    }

    /// Matching wgpu texture format.
    #[cfg(feature = "gpu")]
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            GpuFormat::Dxt1 => wgpu::TextureFormat::Bc1RgbaUnorm,
            GpuFormat::Dxt3 => wgpu::TextureFormat::Bc2RgbaUnorm,
            GpuFormat::Dxt5 => wgpu::TextureFormat::Bc3RgbaUnorm,
            GpuFormat::Bc7 => wgpu::TextureFormat::Bc7RgbaUnorm,
        }
    }
}

/// Fixed header at offset 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerHeader {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub frames_per_second: f32,
    pub format: GpuFormat,
    /// Decompressed size of every frame.
    pub frame_bytes: u32,
}

impl ContainerHeader {
    /// Frame size implied by the dimensions and format.
    pub fn expected_frame_bytes(&self) -> u64 {
        self.format.frame_bytes(self.width, self.height)
    }

    /// Whether `frame_bytes` agrees with the dimensions and format.
    pub fn frame_bytes_consistent(&self) -> bool {
        u64::from(self.frame_bytes) == self.expected_frame_bytes()
    }

    /// Total size of all frames once decompressed.
    pub fn decompressed_bytes(&self) -> u64 {
        u64::from(self.frame_count) * u64::from(self.frame_bytes)
    }

    /// Read the header from the start of `source`, field by field.
    pub fn read_from<S: RandomAccessSource + ?Sized>(source: &mut S) -> Result<Self> {
        source.seek(std::io::SeekFrom::Start(0))?;

        let mut buf4 = [0u8; 4];

        source.read_full(&mut buf4)?;
        let width = u32::from_le_bytes(buf4);

        source.read_full(&mut buf4)?;
        let height = u32::from_le_bytes(buf4);

        source.read_full(&mut buf4)?;
        let frame_count = u32::from_le_bytes(buf4);

        source.read_full(&mut buf4)?;
        let frames_per_second = f32::from_le_bytes(buf4);

        source.read_full(&mut buf4)?;
        let code = u32::from_le_bytes(buf4);
        let format = GpuFormat::from_code(code).ok_or(Error::UnknownFormat(code))?;

        source.read_full(&mut buf4)?;
        let frame_bytes = u32::from_le_bytes(buf4);

        Ok(Self {
            width,
            height,
            frame_count,
            frames_per_second,
            format,
            frame_bytes,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndexEntry {
    /// Byte offset from start of file.
    pub offset: u64,
    /// LZ4 compressed size in bytes.
    pub compressed_size: u64,
}

impl FrameIndexEntry {
    /// Size of one index entry in bytes.
    pub const SIZE: u64 = 16;

    pub fn from_bytes(bytes: &[u8; 16]) -> Self {
        let mut buf8 = [0u8; 8];

        buf8.copy_from_slice(&bytes[..8]);
        let offset = u64::from_le_bytes(buf8);

        buf8.copy_from_slice(&bytes[8..]);
        let compressed_size = u64::from_le_bytes(buf8);

        Self {
            offset,
            compressed_size,
        }
    }

    /// One past the last byte of the frame block, `None` on overflow.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.compressed_size)
    }
}
