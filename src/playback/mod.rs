//! Playback-side plumbing between readers and a render loop.
//!
//! The render loop owns a [`ReaderSlot`]. Each tick it polls any pending
//! [`ReaderLoader`], asks the slot's [`FrameStagingBuffer`] for the frame its
//! clock selects, and uploads the staged bytes when they change. Time, frame
//! rate conversion and the GPU upload itself stay with the caller.

mod slot;
mod staging;

pub use slot::{ReaderLoader, ReaderSlot};
pub use staging::{FrameStagingBuffer, UploadLayout};
