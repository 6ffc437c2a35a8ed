//! An in-memory fake filesystem for deterministic, side-effect-free tests.
//!
//! A test declares a small set of files and directories with known contents,
//! then redirects all file access performed by the code under test to this
//! virtual model instead of the real disk. No stray files, no leftover
//! state, no disk I/O.
//!
//! **Key ideas**:
//! - **Virtual model**: [`FakeFs`] holds a hierarchical tree of files and
//!   directories entirely in memory; nothing ever touches real storage.
//! - **Interception**: production code reads and writes through the
//!   primitives in [`fs`], which delegate to whichever file-access provider
//!   is installed — the real filesystem by default, the fake one inside a
//!   patched scope.
//! - **Scoped and reversible**: [`patch::activate`] returns a guard;
//!   dropping it restores the real primitives on every exit path, panics
//!   included.
//! - **Typed failures**: [`FsError`] distinguishes missing paths, structural
//!   conflicts, and interception misuse.
//!
//! ### Example
//!
//! ```
//! use std::io::Read;
//! use fakefs_kit::{FakeFs, fs};
//!
//! let vfs = FakeFs::new();
//! vfs.add_file("config.toml", "key = 1").unwrap();
//!
//! {
//!     let _guard = vfs.patch().unwrap();
//!
//!     // code under test, unchanged
//!     let mut file = fs::File::open("config.toml").unwrap();
//!     let mut text = String::new();
//!     file.read_to_string(&mut text).unwrap();
//!     assert_eq!(text, "key = 1");
//! }
//! // the real filesystem is back in force here
//! ```

mod core;
pub mod fs;
pub mod patch;
mod vfs;

pub use crate::core::{FileAccess, FileHandle, FsError, Metadata, OpenMode, Result};
pub use crate::patch::{PatchGuard, activate, deactivate, is_active};
pub use crate::vfs::{DirNode, FakeFs, FileNode, Node, NodeKind, RealFs};
