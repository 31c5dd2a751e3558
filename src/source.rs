//! Positioned-read byte sources.
//!
//! The search engine never owns a cursor: every access is an independent
//! `read_at(offset, buf)`. Memory-backed sources (`[u8]`, `Vec<u8>`,
//! [`MmapSource`]) serve reads from concurrent callers without coordination.
//! [`FileSource`] reads through a single file handle and serializes its
//! seeks behind a mutex.
//!
//! # Example
//!
//! ```no_run
//! use ip2loc::source::{ByteSource, MmapSource};
//!
//! let source = MmapSource::open("IP2LOCATION-LITE-DB11.BIN")?;
//! let mut header = [0u8; 5];
//! source.read_at(0, &mut header)?;
//! println!("schema id {}", header[0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{DecodeError, OpenError};
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Random-access view over an immutable byte sequence.
pub trait ByteSource: Send + Sync {
    /// Total number of bytes available.
    fn len(&self) -> u64;

    /// Fill `buf` with the bytes starting at 0-based `offset`.
    ///
    /// Fails with [`DecodeError::Truncated`] when the span extends past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError>;

    /// Returns true if the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `len` bytes at `offset` into a fresh buffer.
    fn read_vec(&self, offset: u64, len: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }
}

/// Bounds-checked copy out of an in-memory slice.
fn read_slice(data: &[u8], offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
    let truncated = DecodeError::Truncated {
        offset,
        len: buf.len(),
    };
    let start = usize::try_from(offset).map_err(|_| truncated.clone())?;
    let end = start.checked_add(buf.len()).ok_or_else(|| truncated.clone())?;
    let span = data.get(start..end).ok_or(truncated)?;
    buf.copy_from_slice(span);
    Ok(())
}

impl ByteSource for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        read_slice(self, offset, buf)
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        read_slice(self, offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        (**self).read_at(offset, buf)
    }
}

/// A read-only memory-mapped database file.
///
/// The file is unmapped when the `MmapSource` is dropped. Wrap it in an
/// [`Arc`] to share one mapping between several database handles.
pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    /// Open and memory-map a file.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError::Io`] if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| OpenError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
        // SAFETY: the mapping is read-only; database files are not modified in place.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| OpenError::Io(format!("Failed to mmap {}: {}", path.display(), e)))?;
        Ok(MmapSource { mmap })
    }

    /// Get a slice of the entire mapped memory.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap[..]
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        read_slice(&self.mmap, offset, buf)
    }
}

impl fmt::Debug for MmapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapSource")
            .field("size", &self.mmap.len())
            .finish()
    }
}

/// A database file read through one seekable handle.
///
/// Reads take a lock around seek + read, so concurrent callers queue on the
/// handle. Prefer [`MmapSource`] when true parallelism is wanted.
pub struct FileSource {
    file: Mutex<File>,
    size: u64,
}

impl FileSource {
    /// Open a file for positioned reads.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| OpenError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
        let size = file.metadata()?.len();
        Ok(FileSource {
            file: Mutex::new(file),
            size,
        })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        let end = offset.checked_add(buf.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(DecodeError::Truncated {
                offset,
                len: buf.len(),
            });
        }

        let mut file = self
            .file
            .lock()
            .map_err(|_| DecodeError::Io("file handle lock poisoned".to_string()))?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_slice_read_at() {
        let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut buf = [0u8; 3];
        data.read_at(2, &mut buf).unwrap();
        assert_eq!(buf, [3, 4, 5]);

        // Exactly at the end is fine, one past is not
        data.read_at(5, &mut buf).unwrap();
        assert_eq!(buf, [6, 7, 8]);
        assert_eq!(
            data.read_at(6, &mut buf),
            Err(DecodeError::Truncated { offset: 6, len: 3 })
        );
        assert!(data.read_at(u64::MAX, &mut buf).is_err());
    }

    #[test]
    fn test_read_vec() {
        let data: &[u8] = &[9, 8, 7];
        assert_eq!(data.read_vec(1, 2).unwrap(), vec![8, 7]);
        assert_eq!(data.read_vec(3, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_mmap_source() {
        let file = create_test_file(&[10, 20, 30, 40]);
        let source = MmapSource::open(file.path()).unwrap();
        assert_eq!(ByteSource::len(&source), 4);
        assert_eq!(source.read_vec(1, 3).unwrap(), vec![20, 30, 40]);
        assert!(source.read_vec(2, 3).is_err());
        assert_eq!(source.as_slice(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_file_source() {
        let file = create_test_file(&[1, 2, 3, 4, 5]);
        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.len(), 5);
        assert_eq!(source.read_vec(3, 2).unwrap(), vec![4, 5]);
        // Out of order reads: no cursor leaks between calls
        assert_eq!(source.read_vec(0, 1).unwrap(), vec![1]);
        assert!(matches!(
            source.read_vec(4, 2),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_nonexistent_file() {
        let result = MmapSource::open("/nonexistent/path/to/db.bin");
        assert!(matches!(result, Err(OpenError::Io(_))));
        let result = FileSource::open("/nonexistent/path/to/db.bin");
        assert!(matches!(result, Err(OpenError::Io(_))));
    }

    #[test]
    fn test_arc_source_shares_bytes() {
        let shared: Arc<Vec<u8>> = Arc::new(vec![5, 6, 7]);
        let other = Arc::clone(&shared);
        assert_eq!(other.read_vec(0, 3).unwrap(), vec![5, 6, 7]);
        assert_eq!(ByteSource::len(&shared), 3);
    }
}
