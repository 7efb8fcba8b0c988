//! Configuration types for opening containers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a container is held in memory while frames are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Keep the file open, read and decompress per frame.
    #[default]
    Streaming,
    /// Load the whole file, decompress per frame from memory.
    MemoryResident,
    /// Decompress every frame at load time.
    Precomputed,
}

impl LoadMode {
    pub const ALL: [LoadMode; 3] = [
        LoadMode::Streaming,
        LoadMode::MemoryResident,
        LoadMode::Precomputed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Streaming => "streaming",
            LoadMode::MemoryResident => "memory_resident",
            LoadMode::Precomputed => "precomputed",
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streaming" | "stream" => Ok(LoadMode::Streaming),
            "memory_resident" | "memory" => Ok(LoadMode::MemoryResident),
            "precomputed" | "decompressed" => Ok(LoadMode::Precomputed),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Everything needed to open a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Container file path.
    pub path: PathBuf,
    /// Reader strategy.
    #[serde(default)]
    pub mode: LoadMode,
    /// Reject headers whose frame size disagrees with width, height and
    /// format. Off by default: the format itself does not require it.
    #[serde(default)]
    pub strict_frame_bytes: bool,
}

impl LoaderConfig {
    pub fn new<P: AsRef<Path>>(path: P, mode: LoadMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
            strict_frame_bytes: false,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.path.is_dir() {
            return Err(ConfigError::NotAFile(self.path.clone()));
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new("clip.gv", LoadMode::default())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Container path is empty")]
    EmptyPath,
    #[error("Container path {} is a directory", .0.display())]
    NotAFile(PathBuf),
    #[error("Unknown load mode '{0}' (expected streaming, memory_resident or precomputed)")]
    UnknownMode(String),
}
