use std::io::{self, Read, Write};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsError>;

/// Errors produced by filesystem operations, virtual or real.
///
/// The boolean queries (`exists`, `is_file`, `is_dir`) never return these;
/// every other operation surfaces failures immediately.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path has no corresponding entry.
    #[error("{0} does not exist")]
    NotFound(String),

    /// A structural expectation was violated: expected a directory and found
    /// a file (or vice versa), removing a non-empty directory, or a path walk
    /// that tries to ascend above the root.
    #[error("{0}")]
    Conflict(String),

    /// The interception layer was activated while already active, or
    /// deactivated while inactive.
    #[error("{0}")]
    Usage(String),

    /// Host filesystem error passed through by the real backend.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        FsError::NotFound(path.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        FsError::Conflict(msg.into())
    }

    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        FsError::Usage(msg.into())
    }
}

/// Decodes file content as UTF-8, mapping decode failures to the same
/// `InvalidData` error `std::fs::read_to_string` produces. Shared by the
/// virtual backend and the substituted primitives.
pub(crate) fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| FsError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

impl From<FsError> for io::Error {
    fn from(e: FsError) -> io::Error {
        match e {
            FsError::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, e),
            FsError::Io(inner) => inner,
            _ => io::Error::other(e),
        }
    }
}

/// Mode an entry is opened with. Write truncates (or creates) up front,
/// append positions the cursor at the end of the existing content.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

/// Entry metadata. `modified` is a logical tick for the virtual backend and
/// seconds since the epoch for the real one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Metadata {
    len: u64,
    modified: u64,
    is_dir: bool,
}

impl Metadata {
    pub(crate) fn new(len: u64, modified: u64, is_dir: bool) -> Metadata {
        Metadata {
            len,
            modified,
            is_dir,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> u64 {
        self.modified
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// An open file, real or virtual. Closing is scoped: dropping the handle
/// commits buffered writes (the virtual handle writes its buffer back into
/// the owning [`FakeFs`](crate::FakeFs); the real handle is an ordinary
/// `std::fs::File`).
pub trait FileHandle: Read + Write + Send {}

/// The file-access capability the interception layer swaps out as a unit.
///
/// Production code calls through the [`fs`](crate::fs) module, which
/// dispatches every call to the currently installed `FileAccess` provider:
/// [`RealFs`](crate::RealFs) when no interception is active,
/// [`FakeFs`](crate::FakeFs) inside a patched scope. Paths use `/` as the
/// canonical separator.
pub trait FileAccess: Send + Sync {
    fn open(&self, path: &str, mode: OpenMode) -> Result<Box<dyn FileHandle>>;

    fn exists(&self, path: &str) -> bool;
    fn is_file(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<Vec<u8>>;
    fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    fn read_dir(&self, path: &str) -> Result<Vec<String>>;
    fn create_dir_all(&self, path: &str) -> Result<()>;

    fn remove_file(&self, path: &str) -> Result<()>;
    fn remove_dir_all(&self, path: &str) -> Result<()>;

    fn rename(&self, from: &str, to: &str) -> Result<()>;
    fn copy(&self, from: &str, to: &str) -> Result<u64>;

    fn metadata(&self, path: &str) -> Result<Metadata>;
}
