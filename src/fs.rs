//! File-access primitives shaped like `std::fs`.
//!
//! Production code calls these instead of `std::fs` (usually just a changed
//! import) and keeps the exact same call sites. Outside a patched scope
//! every function lands on the host filesystem; inside one, on the
//! [`FakeFs`](crate::FakeFs) installed by [`crate::patch::activate`]. The
//! call sites cannot tell which is in force.
//!
//! Paths are accepted as `impl AsRef<Path>`, exactly like `std::fs`. The
//! virtual namespace is text-based, so non-UTF-8 path bytes are converted
//! lossily at this boundary.

use std::io::{self, Read, Write};
use std::path::Path;

use crate::core::{FileHandle, Metadata, OpenMode, Result, decode_utf8};
use crate::patch::with_provider;

fn as_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// An open file, real or virtual depending on the provider that was
/// installed when it was opened. Dropping it closes the file and, for
/// virtual write handles, commits the buffered content to the virtual tree.
pub struct File {
    inner: Box<dyn FileHandle>,
}

impl File {
    /// Opens the file at `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<File> {
        File::with_mode(path.as_ref(), OpenMode::Read)
    }

    /// Opens the file at `path` for writing, truncating or creating it.
    pub fn create(path: impl AsRef<Path>) -> Result<File> {
        File::with_mode(path.as_ref(), OpenMode::Write)
    }

    /// Opens the file at `path` for appending, creating it if absent.
    pub fn append(path: impl AsRef<Path>) -> Result<File> {
        File::with_mode(path.as_ref(), OpenMode::Append)
    }

    fn with_mode(path: &Path, mode: OpenMode) -> Result<File> {
        let inner = with_provider(|p| p.open(&as_text(path), mode))?;
        Ok(File { inner })
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reads the entire contents of a file.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    with_provider(|p| p.read(&as_text(path.as_ref())))
}

/// Reads the entire contents of a file as UTF-8.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    decode_utf8(read(path)?)
}

/// Writes `contents` to a file, replacing whatever was there.
pub fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    with_provider(|p| p.write(&as_text(path.as_ref()), contents.as_ref()))
}

/// Checks whether `path` points at an existing entry.
pub fn exists(path: impl AsRef<Path>) -> bool {
    with_provider(|p| p.exists(&as_text(path.as_ref())))
}

/// Checks whether `path` points at a regular file.
pub fn is_file(path: impl AsRef<Path>) -> bool {
    with_provider(|p| p.is_file(&as_text(path.as_ref())))
}

/// Checks whether `path` points at a directory.
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    with_provider(|p| p.is_dir(&as_text(path.as_ref())))
}

/// Lists the names of a directory's entries, sorted.
pub fn read_dir(path: impl AsRef<Path>) -> Result<Vec<String>> {
    with_provider(|p| p.read_dir(&as_text(path.as_ref())))
}

/// Creates a directory and all missing parents.
pub fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    with_provider(|p| p.create_dir_all(&as_text(path.as_ref())))
}

/// Removes a file.
pub fn remove_file(path: impl AsRef<Path>) -> Result<()> {
    with_provider(|p| p.remove_file(&as_text(path.as_ref())))
}

/// Removes a directory and everything below it.
pub fn remove_dir_all(path: impl AsRef<Path>) -> Result<()> {
    with_provider(|p| p.remove_dir_all(&as_text(path.as_ref())))
}

/// Moves the entry at `from` to `to`.
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    with_provider(|p| p.rename(&as_text(from.as_ref()), &as_text(to.as_ref())))
}

/// Copies the file at `from` to `to`, returning the number of bytes copied.
pub fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    with_provider(|p| p.copy(&as_text(from.as_ref()), &as_text(to.as_ref())))
}

/// Returns metadata for the entry at `path`.
pub fn metadata(path: impl AsRef<Path>) -> Result<Metadata> {
    with_provider(|p| p.metadata(&as_text(path.as_ref())))
}
