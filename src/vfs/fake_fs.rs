//! This module provides the in-memory fake filesystem used as a substitute
//! for the host filesystem during tests.

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{FileAccess, FileHandle, FsError, Metadata, OpenMode, Result, decode_utf8};
use crate::patch::{self, PatchGuard};
use crate::vfs::node::{DirNode, Node, NodeKind};
use crate::vfs::path;

/// An in-memory fake filesystem: a hierarchical tree of files and
/// directories that test code populates up front and production code reads
/// and writes through the substituted primitives in [`crate::fs`].
///
/// ### Internal state
///
/// * `root` — the single root directory. Every entry is owned, directly or
///   transitively, by this node; nothing else holds a node.
/// * `cwd` — current working directory as a normalized segment list.
///   Relative paths resolve against it. Default: `/`.
/// * `clock` — monotonic counter stamped onto files as their last-modified
///   marker. Logical, not wall-clock, so runs are reproducible.
///
/// ### Invariants
///
/// 1. The root always exists and is a directory.
/// 2. Names are unique within a directory; listings are sorted by name.
/// 3. All paths are normalized before they touch the tree (`.` dropped,
///    `..` popped, `/` canonical separator).
///
/// ### Sharing
///
/// `FakeFs` is a cheap `Clone` over shared state, so a test can keep one
/// handle for assertions while the interception layer holds another. The
/// state sits behind a `Mutex` because the interception layer publishes the
/// filesystem process-wide; the model itself is meant for one test at a time.
///
/// ### Example
///
/// ```
/// use fakefs_kit::FakeFs;
///
/// let fs = FakeFs::new();
/// fs.add_file("/docs/note.txt", "Hello").unwrap();
///
/// assert!(fs.exists("/docs/note.txt"));
/// assert_eq!(fs.read("/docs/note.txt").unwrap(), b"Hello");
///
/// fs.rm("/docs/note.txt").unwrap();
/// ```
#[derive(Clone, Default)]
pub struct FakeFs {
    state: Arc<Mutex<FsState>>,
}

#[derive(Default)]
struct FsState {
    root: DirNode,
    cwd: Vec<String>,
    clock: u64,
}

impl FakeFs {
    /// Creates an empty filesystem containing only the root directory,
    /// with the working directory set to `/`.
    pub fn new() -> FakeFs {
        FakeFs::default()
    }

    // A test that panics mid-assertion must not poison the fixture for the
    // teardown checks that follow, so poisoning is recovered from.
    fn lock(&self) -> MutexGuard<'_, FsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates or replaces the file at `path`, creating missing parent
    /// directories along the way. Replacing an existing file is deliberate:
    /// it keeps declarative setup idempotent.
    pub fn add_file(&self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.put_file(&segs, content.as_ref(), true)
    }

    /// Creates the directory at `path` and all missing parents. Calling it
    /// again for an existing directory succeeds and changes nothing.
    pub fn add_dir(&self, path: &str) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.add_dir(&segs)
    }

    /// Checks whether `path` denotes any entry. Never fails: any resolution
    /// problem answers `false`.
    pub fn exists(&self, path: &str) -> bool {
        let st = self.lock();
        match path::normalize(&st.cwd, path) {
            Ok(segs) => st.kind(&segs).is_ok(),
            Err(_) => false,
        }
    }

    /// Checks whether `path` denotes a file. Same no-fail contract as
    /// [`exists`](FakeFs::exists).
    pub fn is_file(&self, path: &str) -> bool {
        let st = self.lock();
        match path::normalize(&st.cwd, path) {
            Ok(segs) => matches!(st.kind(&segs), Ok(NodeKind::File)),
            Err(_) => false,
        }
    }

    /// Checks whether `path` denotes a directory. Same no-fail contract as
    /// [`exists`](FakeFs::exists).
    pub fn is_dir(&self, path: &str) -> bool {
        let st = self.lock();
        match path::normalize(&st.cwd, path) {
            Ok(segs) => matches!(st.kind(&segs), Ok(NodeKind::Directory)),
            Err(_) => false,
        }
    }

    /// Returns the content of the file at `path`, byte for byte as last
    /// written.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.read(&segs)
    }

    /// Like [`read`](FakeFs::read), decoded as UTF-8.
    pub fn read_to_string(&self, path: &str) -> Result<String> {
        decode_utf8(self.read(path)?)
    }

    /// Creates or overwrites the file at `path`. Unlike
    /// [`add_file`](FakeFs::add_file), parent directories must already exist.
    pub fn write(&self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.put_file(&segs, content.as_ref(), false)
    }

    /// Appends to the end of an existing file.
    pub fn append(&self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.append(&segs, content.as_ref())
    }

    /// Lists the names of the immediate children of the directory at `path`,
    /// sorted by name.
    pub fn ls(&self, path: &str) -> Result<Vec<String>> {
        let st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.ls(&segs)
    }

    /// Lists every entry below the directory at `path` recursively, as full
    /// absolute paths, depth-first.
    pub fn tree(&self, path: &str) -> Result<Vec<String>> {
        let st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.tree(&segs)
    }

    /// Removes the file or empty directory at `path`. Removing a non-empty
    /// directory is a conflict; use [`rm_all`](FakeFs::rm_all) for that.
    pub fn rm(&self, path: &str) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.rm(&segs, false)
    }

    /// Removes the entry at `path` and, for a directory, everything below it.
    pub fn rm_all(&self, path: &str) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.rm(&segs, true)
    }

    /// Moves the entry at `from` to `to`. An existing file at `to` is
    /// replaced; an existing directory at `to` is a conflict.
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut st = self.lock();
        let from = path::normalize(&st.cwd, from)?;
        let to = path::normalize(&st.cwd, to)?;
        st.rename(&from, &to)
    }

    /// Copies the file at `from` to `to` and returns the number of bytes
    /// copied. The destination's parent directory must already exist.
    pub fn copy(&self, from: &str, to: &str) -> Result<u64> {
        let mut st = self.lock();
        let from = path::normalize(&st.cwd, from)?;
        let to = path::normalize(&st.cwd, to)?;
        st.copy(&from, &to)
    }

    /// Returns size and last-modified tick for the entry at `path`.
    pub fn metadata(&self, path: &str) -> Result<Metadata> {
        let st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.metadata(&segs)
    }

    /// Changes the working directory. `path` must denote an existing
    /// directory.
    pub fn cd(&self, path: &str) -> Result<()> {
        let mut st = self.lock();
        let segs = path::normalize(&st.cwd, path)?;
        st.cd(segs)
    }

    /// Returns the working directory as an absolute path.
    pub fn cwd(&self) -> String {
        path::display(&self.lock().cwd)
    }

    /// Removes everything but the root directory and resets the working
    /// directory to `/`. The logical clock keeps counting.
    pub fn clear(&self) {
        let mut st = self.lock();
        st.root = DirNode::new();
        st.cwd = Vec::new();
    }

    /// Installs this filesystem as the process-wide file-access provider and
    /// returns the guard that undoes it. See [`crate::patch::activate`].
    pub fn patch(&self) -> Result<PatchGuard> {
        patch::activate(self.clone())
    }
}

impl FsState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Walks `segs` expecting directories all the way down.
    fn find_dir(&self, segs: &[String]) -> Result<&DirNode> {
        let mut cur = &self.root;
        for (i, name) in segs.iter().enumerate() {
            cur = match cur.child(name) {
                Some(Node::Dir(next)) => next,
                Some(Node::File(_)) => {
                    return Err(FsError::conflict(format!(
                        "{} is not a directory",
                        path::display(&segs[..=i])
                    )));
                }
                None => return Err(FsError::not_found(path::display(&segs[..=i]))),
            };
        }
        Ok(cur)
    }

    /// Mutable walk. With `create` set, missing intermediate directories are
    /// created as the walk proceeds (populate-time behavior).
    fn find_dir_mut(&mut self, segs: &[String], create: bool) -> Result<&mut DirNode> {
        let mut cur = &mut self.root;
        for (i, name) in segs.iter().enumerate() {
            if create && cur.child(name).is_none() {
                cur.insert(name.clone(), Node::dir());
            }
            cur = match cur.child_mut(name) {
                Some(Node::Dir(next)) => next,
                Some(Node::File(_)) => {
                    return Err(FsError::conflict(format!(
                        "{} is not a directory",
                        path::display(&segs[..=i])
                    )));
                }
                None => return Err(FsError::not_found(path::display(&segs[..=i]))),
            };
        }
        Ok(cur)
    }

    /// Resolves `segs` to its node. `Ok(None)` is the root itself.
    fn node(&self, segs: &[String]) -> Result<Option<&Node>> {
        let Some((name, parents)) = segs.split_last() else {
            return Ok(None);
        };
        match self.find_dir(parents)?.child(name) {
            Some(node) => Ok(Some(node)),
            None => Err(FsError::not_found(path::display(segs))),
        }
    }

    fn kind(&self, segs: &[String]) -> Result<NodeKind> {
        match self.node(segs)? {
            None => Ok(NodeKind::Directory),
            Some(node) => Ok(node.kind()),
        }
    }

    fn put_file(&mut self, segs: &[String], content: &[u8], create_parents: bool) -> Result<()> {
        let Some((name, parents)) = segs.split_last() else {
            return Err(FsError::conflict("/ is a directory"));
        };
        let modified = self.tick();
        let display = path::display(segs);
        let dir = self.find_dir_mut(parents, create_parents)?;
        match dir.child_mut(name) {
            Some(Node::Dir(_)) => Err(FsError::conflict(format!("{display} is a directory"))),
            Some(Node::File(file)) => {
                file.set_content(content, modified);
                Ok(())
            }
            None => {
                dir.insert(name.clone(), Node::file(content, modified));
                Ok(())
            }
        }
    }

    fn add_dir(&mut self, segs: &[String]) -> Result<()> {
        let Some((name, parents)) = segs.split_last() else {
            return Ok(()); // the root always exists
        };
        let dir = self.find_dir_mut(parents, true)?;
        match dir.child(name) {
            Some(Node::File(_)) => Err(FsError::conflict(format!(
                "{} is not a directory",
                path::display(segs)
            ))),
            Some(Node::Dir(_)) => Ok(()),
            None => {
                dir.insert(name.clone(), Node::dir());
                Ok(())
            }
        }
    }

    fn read(&self, segs: &[String]) -> Result<Vec<u8>> {
        match self.node(segs)? {
            Some(Node::File(file)) => Ok(file.content().to_vec()),
            Some(Node::Dir(_)) | None => Err(FsError::conflict(format!(
                "{} is a directory",
                path::display(segs)
            ))),
        }
    }

    fn append(&mut self, segs: &[String], content: &[u8]) -> Result<()> {
        let Some((name, parents)) = segs.split_last() else {
            return Err(FsError::conflict("/ is a directory"));
        };
        let modified = self.tick();
        let display = path::display(segs);
        let dir = self.find_dir_mut(parents, false)?;
        match dir.child_mut(name) {
            Some(Node::File(file)) => {
                file.append_content(content, modified);
                Ok(())
            }
            Some(Node::Dir(_)) => Err(FsError::conflict(format!("{display} is a directory"))),
            None => Err(FsError::not_found(display)),
        }
    }

    fn ls(&self, segs: &[String]) -> Result<Vec<String>> {
        match self.node(segs)? {
            None => Ok(self.root.names()),
            Some(Node::Dir(dir)) => Ok(dir.names()),
            Some(Node::File(_)) => Err(FsError::conflict(format!(
                "{} is not a directory",
                path::display(segs)
            ))),
        }
    }

    fn tree(&self, segs: &[String]) -> Result<Vec<String>> {
        let dir = match self.node(segs)? {
            None => &self.root,
            Some(Node::Dir(dir)) => dir,
            Some(Node::File(_)) => {
                return Err(FsError::conflict(format!(
                    "{} is not a directory",
                    path::display(segs)
                )));
            }
        };
        let mut out = Vec::new();
        collect_tree(dir, &path::display(segs), &mut out);
        Ok(out)
    }

    fn rm(&mut self, segs: &[String], recursive: bool) -> Result<()> {
        let Some((name, parents)) = segs.split_last() else {
            return Err(FsError::conflict("the root cannot be removed"));
        };
        let display = path::display(segs);
        let dir = self.find_dir_mut(parents, false)?;
        match dir.child(name) {
            None => Err(FsError::not_found(display)),
            Some(Node::Dir(sub)) if !recursive && !sub.is_empty() => {
                Err(FsError::conflict(format!("{display} is not empty")))
            }
            Some(_) => {
                dir.remove(name);
                Ok(())
            }
        }
    }

    fn rename(&mut self, from: &[String], to: &[String]) -> Result<()> {
        let Some((from_name, from_parents)) = from.split_last() else {
            return Err(FsError::conflict("the root cannot be renamed"));
        };
        // A missing source is reported before anything else, even when the
        // destination would make the move degenerate.
        if self.find_dir(from_parents)?.child(from_name).is_none() {
            return Err(FsError::not_found(path::display(from)));
        }
        if from == to {
            return Ok(());
        }
        if to.len() > from.len() && to[..from.len()] == *from {
            return Err(FsError::conflict(format!(
                "cannot move {} into itself",
                path::display(from)
            )));
        }
        let Some((to_name, to_parents)) = to.split_last() else {
            return Err(FsError::conflict("/ is a directory"));
        };
        if matches!(self.find_dir(to_parents)?.child(to_name), Some(Node::Dir(_))) {
            return Err(FsError::conflict(format!(
                "{} is a directory",
                path::display(to)
            )));
        }

        let node = self
            .find_dir_mut(from_parents, false)?
            .remove(from_name)
            .ok_or_else(|| FsError::not_found(path::display(from)))?;
        self.find_dir_mut(to_parents, false)?
            .insert(to_name.clone(), node);
        Ok(())
    }

    fn copy(&mut self, from: &[String], to: &[String]) -> Result<u64> {
        let content = match self.node(from)? {
            Some(Node::File(file)) => file.content().to_vec(),
            Some(Node::Dir(_)) | None => {
                return Err(FsError::conflict(format!(
                    "{} is a directory",
                    path::display(from)
                )));
            }
        };
        self.put_file(to, &content, false)?;
        Ok(content.len() as u64)
    }

    fn metadata(&self, segs: &[String]) -> Result<Metadata> {
        match self.node(segs)? {
            Some(Node::File(file)) => Ok(Metadata::new(file.len(), file.modified(), false)),
            Some(Node::Dir(_)) | None => Ok(Metadata::new(0, 0, true)),
        }
    }

    fn cd(&mut self, segs: Vec<String>) -> Result<()> {
        match self.node(&segs)? {
            None | Some(Node::Dir(_)) => {
                self.cwd = segs;
                Ok(())
            }
            Some(Node::File(_)) => Err(FsError::conflict(format!(
                "{} is not a directory",
                path::display(&segs)
            ))),
        }
    }
}

fn collect_tree(dir: &DirNode, prefix: &str, out: &mut Vec<String>) {
    for (name, node) in dir.iter() {
        let full = if prefix == "/" {
            format!("/{name}")
        } else {
            format!("{prefix}/{name}")
        };
        out.push(full.clone());
        if let Node::Dir(sub) = node {
            collect_tree(sub, &full, out);
        }
    }
}

impl FileAccess for FakeFs {
    fn open(&self, path: &str, mode: OpenMode) -> Result<Box<dyn FileHandle>> {
        Ok(Box::new(VirtualHandle::open(self.clone(), path, mode)?))
    }

    fn exists(&self, path: &str) -> bool {
        FakeFs::exists(self, path)
    }

    fn is_file(&self, path: &str) -> bool {
        FakeFs::is_file(self, path)
    }

    fn is_dir(&self, path: &str) -> bool {
        FakeFs::is_dir(self, path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        FakeFs::read(self, path)
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        FakeFs::write(self, path, content)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        self.ls(path)
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        self.add_dir(path)
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        if FakeFs::is_dir(self, path) {
            return Err(FsError::conflict(format!("{path} is a directory")));
        }
        self.rm(path)
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        self.rm_all(path)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        FakeFs::rename(self, from, to)
    }

    fn copy(&self, from: &str, to: &str) -> Result<u64> {
        FakeFs::copy(self, from, to)
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        FakeFs::metadata(self, path)
    }
}

/// An open file backed by the virtual model. Reads come from a snapshot of
/// the content taken at open time; writes go into an in-memory buffer that
/// is committed back to the owning [`FakeFs`] on flush and on drop, so the
/// scoped-close idiom lands the bytes in the virtual tree, never on disk.
pub(crate) struct VirtualHandle {
    fs: FakeFs,
    path: String,
    cursor: Cursor<Vec<u8>>,
    writable: bool,
    dirty: bool,
}

impl VirtualHandle {
    pub(crate) fn open(fs: FakeFs, path: &str, mode: OpenMode) -> Result<VirtualHandle> {
        let buf = match mode {
            OpenMode::Read => fs.read(path)?,
            // Write truncates (or creates) immediately, so structural
            // conflicts surface at open time like they do on a real system.
            OpenMode::Write => {
                fs.write(path, b"")?;
                Vec::new()
            }
            OpenMode::Append => {
                if fs.is_file(path) {
                    fs.read(path)?
                } else {
                    fs.write(path, b"")?;
                    Vec::new()
                }
            }
        };
        let mut cursor = Cursor::new(buf);
        if mode == OpenMode::Append {
            let end = cursor.get_ref().len() as u64;
            cursor.set_position(end);
        }
        Ok(VirtualHandle {
            fs,
            path: path.to_string(),
            cursor,
            writable: mode != OpenMode::Read,
            dirty: false,
        })
    }
}

impl Read for VirtualHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for VirtualHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not open for writing", self.path),
            ));
        }
        self.dirty = true;
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.dirty {
            self.fs.write(&self.path, self.cursor.get_ref())?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for VirtualHandle {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl FileHandle for VirtualHandle {}
