//! Byte-level random access over files and in-memory buffers.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Seekable byte source a container can be parsed from.
///
/// Implementations keep one cursor, so a source is driven by a single caller
/// at a time (`&mut self`).
pub trait RandomAccessSource {
    /// Move the cursor, returning the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Read up to `buf.len()` bytes at the cursor. `Ok(0)` means end of data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Current cursor position.
    fn tell(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::Current(0))
    }

    /// Total length of the source. The cursor is left where it was.
    fn total_len(&mut self) -> io::Result<u64> {
        let pos = self.tell()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    /// Fill `buf` from the cursor, failing with [`Error::TruncatedRead`] if
    /// the source runs out first.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.tell()?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < buf.len() {
            return Err(Error::TruncatedRead {
                offset,
                expected: buf.len(),
                actual: filled,
            });
        }
        Ok(())
    }

    /// Seek to `offset` and fill `buf`.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_full(buf)
    }
}

/// Disk-backed source: one buffered file handle, one position.
pub struct FileSource {
    reader: BufReader<File>,
    path: PathBuf,
}

impl FileSource {
    /// Open a file, mapping a missing path to [`Error::FileNotFound`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| not_found_or_io(e, path))?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RandomAccessSource for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.reader.stream_position()
    }
}

/// In-memory source. Seeking is pure arithmetic on a cursor.
#[derive(Debug, Clone)]
pub struct MemorySource<B = Vec<u8>> {
    data: B,
    pos: u64,
}

impl<B: AsRef<[u8]>> MemorySource<B> {
    pub fn new(data: B) -> Self {
        Self { data, pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.data
    }

    /// Borrow `len` bytes at `offset` without moving the cursor.
    ///
    /// Takes `&self`, so any number of threads can slice one buffer at once.
    pub fn slice_at(&self, offset: u64, len: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let len = usize::try_from(len).ok()?;
        let end = start.checked_add(len)?;
        self.data.as_ref().get(start..end)
    }
}

impl<B: AsRef<[u8]>> RandomAccessSource for MemorySource<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.as_ref().len() as u64;
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.as_ref();
        let Ok(start) = usize::try_from(self.pos) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }

        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.data.as_ref().len() as u64)
    }
}

pub(crate) fn not_found_or_io(e: io::Error, path: &Path) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        Error::Io(e)
    }
}
