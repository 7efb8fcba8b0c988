//! texframe - Random-access readers for GPU texture video containers.
//!
//! A `.gv` container holds GPU block-compressed texture frames (DXT1/3/5,
//! BC7), each LZ4 compressed and located through an index at the end of the
//! file. This crate parses containers and serves decompressed frames, ready
//! for direct texture upload, at any index in any order.
//!
//! # Architecture
//!
//! - `container`: binary format, byte sources, index parsing, decompression
//! - `reader`: streaming, memory-resident and precomputed frame readers
//! - `playback`: staging buffer and background reload for render loops
//! - `schema`: loader configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use texframe::{LoadMode, VideoReader, open};
//!
//! let mut reader = open("intro.gv", LoadMode::MemoryResident)?;
//! let mut frame = vec![0u8; reader.frame_bytes() as usize];
//! reader.read(&mut frame, 0)?;
//!
//! println!(
//!     "{}x{} {:?}, {} frames",
//!     reader.width(),
//!     reader.height(),
//!     reader.format(),
//!     reader.frame_count()
//! );
//! # Ok::<(), texframe::Error>(())
//! ```

pub mod container;
pub mod error;
pub mod playback;
pub mod reader;
pub mod schema;

// Re-export commonly used types
pub use container::{ContainerHeader, ContainerIndex, GpuFormat};
pub use error::{Error, Result};
pub use playback::{FrameStagingBuffer, ReaderLoader, ReaderSlot};
pub use reader::{
    MemoryResidentReader, PrecomputedReader, SharedVideoReader, StreamingReader, VideoReader,
    open, open_bytes, open_bytes_with, open_with_config,
};
pub use schema::{LoadMode, LoaderConfig};
