//! Schema module - Loader configuration types.

mod config;

pub use config::*;
