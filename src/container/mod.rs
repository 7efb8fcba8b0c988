//! The `.gv` GPU texture video container.
//!
//! A container stores block-compressed texture frames (DXT1/3/5, BC7) that
//! can be uploaded to the GPU without any CPU-side pixel decoding. Each frame
//! is additionally LZ4 compressed and located through a trailing index.
//!
//! # File Format
//!
//! ```text
//! Header (24 bytes, little-endian):
//!   Width: u32
//!   Height: u32
//!   Frame count: u32
//!   Frames per second: f32
//!   Format: u32 (1 = DXT1, 3 = DXT3, 5 = DXT5, 7 = BC7)
//!   Frame bytes: u32 (decompressed size of every frame)
//!
//! Frame data (variable):
//!   LZ4 block-compressed payloads, no size prefix, any order
//!
//! Frame index table (frame_count * 16 bytes, at end of file):
//!   Offset: u64
//!   Compressed size: u64
//! ```
//!
//! There is no magic number or checksum. A file of the right size with
//! meaningless fields parses; see [`ContainerIndex::parse_with`] for the
//! optional frame size check.

mod decompress;
mod format;
mod index;
mod source;

pub use decompress::{DecompressError, decompress_frame};
pub use format::{ContainerHeader, FrameIndexEntry, GpuFormat, HEADER_SIZE};
pub use index::ContainerIndex;
pub use source::{FileSource, MemorySource, RandomAccessSource};
pub(crate) use source::not_found_or_io;

#[cfg(test)]
pub(crate) mod fixture;
