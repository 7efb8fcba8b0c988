//! Loading readers off the playback thread and swapping them in whole.

use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use super::FrameStagingBuffer;
use crate::error::{Error, Result};
use crate::reader::{VideoReader, open_with_config};
use crate::schema::LoaderConfig;

type LoadResult = Result<Box<dyn VideoReader>>;

/// Opens a reader on a background thread.
///
/// Usage:
/// ```ignore
/// let mut loader = ReaderLoader::spawn(config)?;
/// // each tick on the playback thread:
/// slot.poll(&mut loader);
/// ```
pub struct ReaderLoader {
    config: LoaderConfig,
    receiver: Receiver<LoadResult>,
    delivered: bool,
}

impl ReaderLoader {
    /// Start loading. Errors only if the thread cannot be spawned.
    pub fn spawn(config: LoaderConfig) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let thread_config = config.clone();

        std::thread::Builder::new()
            .name("texframe-loader".into())
            .spawn(move || {
                let start = Instant::now();
                let result = open_with_config(&thread_config);
                match &result {
                    Ok(reader) => log::info!(
                        "Loaded {} in {:.1} ms ({} frames)",
                        thread_config.path.display(),
                        start.elapsed().as_secs_f64() * 1000.0,
                        reader.frame_count()
                    ),
                    Err(e) => log::warn!("Failed to load {}: {}", thread_config.path.display(), e),
                }
                // The receiver is gone if the load was abandoned
                let _ = sender.send(result);
            })?;

        Ok(Self {
            config,
            receiver,
            delivered: false,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The finished load, once. `None` while still loading or after delivery.
    pub fn try_take(&mut self) -> Option<LoadResult> {
        if self.delivered {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(Error::LoaderDisconnected),
        };
        self.delivered = true;
        Some(result)
    }

    /// Block until the load finishes.
    pub fn wait(mut self) -> LoadResult {
        if self.delivered {
            return Err(Error::LoaderDisconnected);
        }
        self.delivered = true;
        self.receiver
            .recv()
            .map_err(|_| Error::LoaderDisconnected)?
    }
}

/// The playback side's single owner of the active reader.
///
/// Readers are never changed in place: a reload replaces the whole staging
/// buffer (and reader) in one assignment and bumps the generation, so code
/// holding on to a generation number can tell its frame data is stale.
#[derive(Default)]
pub struct ReaderSlot {
    staging: Option<FrameStagingBuffer>,
    generation: u64,
}

impl ReaderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented on every install and unload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.staging.is_some()
    }

    pub fn staging(&self) -> Option<&FrameStagingBuffer> {
        self.staging.as_ref()
    }

    pub fn staging_mut(&mut self) -> Option<&mut FrameStagingBuffer> {
        self.staging.as_mut()
    }

    /// Swap in a new reader, returning the previous one.
    ///
    /// If staging memory for the new reader cannot be allocated the active
    /// reader is kept and the generation is unchanged.
    pub fn install(
        &mut self,
        reader: Box<dyn VideoReader>,
    ) -> Result<Option<Box<dyn VideoReader>>> {
        let staging = FrameStagingBuffer::new(reader)?;
        let previous = self
            .staging
            .replace(staging)
            .map(FrameStagingBuffer::into_reader);
        self.generation += 1;
        log::info!("Installed reader, generation {}", self.generation);
        Ok(previous)
    }

    /// Drop the active reader, returning it.
    pub fn unload(&mut self) -> Option<Box<dyn VideoReader>> {
        let previous = self.staging.take().map(FrameStagingBuffer::into_reader);
        if previous.is_some() {
            self.generation += 1;
            log::info!("Unloaded reader, generation {}", self.generation);
        }
        previous
    }

    /// Install the loader's reader if it has finished.
    ///
    /// Returns `None` while loading, `Some(Ok(generation))` after a swap and
    /// `Some(Err(_))` if loading failed, in which case the active reader is
    /// kept.
    pub fn poll(&mut self, loader: &mut ReaderLoader) -> Option<Result<u64>> {
        let result = loader.try_take()?;
        Some(result.and_then(|reader| {
            self.install(reader)?;
            Ok(self.generation)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::GpuFormat;
    use crate::container::fixture::ContainerBuilder;
    use crate::reader::open_bytes;
    use crate::schema::LoadMode;
    use std::time::Duration;
    use tempfile::tempdir;

    fn poll_until_done(slot: &mut ReaderSlot, loader: &mut ReaderLoader) -> Result<u64> {
        for _ in 0..1000 {
            if let Some(result) = slot.poll(loader) {
                return result;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("loader did not finish");
    }

    #[test]
    fn test_install_and_unload_bump_generation() {
        let bytes = ContainerBuilder::new(16, 16, GpuFormat::Dxt1)
            .pattern_frames(2)
            .build();
        let mut slot = ReaderSlot::new();
        assert_eq!(slot.generation(), 0);
        assert!(!slot.is_loaded());
        assert!(slot.unload().is_none());
        assert_eq!(slot.generation(), 0);

        assert!(
            slot.install(open_bytes(bytes.clone(), LoadMode::Streaming).unwrap())
                .unwrap()
                .is_none()
        );
        assert_eq!(slot.generation(), 1);
        slot.staging_mut().unwrap().update(1).unwrap();

        let previous = slot
            .install(open_bytes(bytes, LoadMode::MemoryResident).unwrap())
            .unwrap();
        assert!(!previous.unwrap().is_thread_safe());
        assert_eq!(slot.generation(), 2);
        // New staging buffer starts empty
        assert_eq!(slot.staging().unwrap().current_frame(), None);

        assert!(slot.unload().is_some());
        assert_eq!(slot.generation(), 3);
        assert!(!slot.is_loaded());
    }

    #[test]
    fn test_background_load() {
        let dir = tempdir().unwrap();
        let builder = ContainerBuilder::new(32, 32, GpuFormat::Dxt5).pattern_frames(5);
        let path = builder.write_to(dir.path(), "bg.gv");

        let mut slot = ReaderSlot::new();
        let mut loader =
            ReaderLoader::spawn(LoaderConfig::new(&path, LoadMode::Precomputed)).unwrap();
        assert_eq!(loader.config().mode, LoadMode::Precomputed);

        assert_eq!(poll_until_done(&mut slot, &mut loader).unwrap(), 1);
        assert!(slot.poll(&mut loader).is_none());

        let staging = slot.staging_mut().unwrap();
        assert!(staging.reader().is_thread_safe());
        staging.update(4).unwrap();
        assert_eq!(staging.take_upload().unwrap(), &builder.frames()[4][..]);
    }

    #[test]
    fn test_failed_load_keeps_active_reader() {
        let dir = tempdir().unwrap();
        let bytes = ContainerBuilder::new(16, 16, GpuFormat::Dxt1)
            .pattern_frames(1)
            .build();

        let mut slot = ReaderSlot::new();
        slot.install(open_bytes(bytes, LoadMode::MemoryResident).unwrap())
            .unwrap();

        let mut loader = ReaderLoader::spawn(LoaderConfig::new(
            dir.path().join("missing.gv"),
            LoadMode::Streaming,
        ))
        .unwrap();
        let err = poll_until_done(&mut slot, &mut loader).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
        assert_eq!(slot.generation(), 1);
        assert!(slot.is_loaded());
    }

    #[test]
    fn test_wait() {
        let dir = tempdir().unwrap();
        let path = ContainerBuilder::new(16, 16, GpuFormat::Bc7)
            .pattern_frames(3)
            .write_to(dir.path(), "wait.gv");
        let loader = ReaderLoader::spawn(LoaderConfig::new(&path, LoadMode::Streaming)).unwrap();
        let reader = loader.wait().unwrap();
        assert_eq!(reader.frame_count(), 3);
    }
}
