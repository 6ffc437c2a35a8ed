//! Host-filesystem passthrough.
//!
//! [`RealFs`] is the provider in effect whenever no interception scope is
//! active: every call lands on `std::fs` unchanged. It exists so the
//! substituted primitives in [`crate::fs`] have a single capability
//! interface with two variants, real and virtual, selected by whichever
//! provider is currently installed.

use std::fs;
use std::io::{self, Read, Write};
use std::time::UNIX_EPOCH;

use crate::core::{FileAccess, FileHandle, FsError, Metadata, OpenMode, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

// NotFound keeps its typed kind across backends; everything else from the
// host passes through as Io.
fn host_err(path: &str, e: io::Error) -> FsError {
    if e.kind() == io::ErrorKind::NotFound {
        FsError::not_found(path)
    } else {
        FsError::Io(e)
    }
}

impl FileAccess for RealFs {
    fn open(&self, path: &str, mode: OpenMode) -> Result<Box<dyn FileHandle>> {
        let file = match mode {
            OpenMode::Read => fs::File::open(path),
            OpenMode::Write => fs::File::create(path),
            OpenMode::Append => fs::OpenOptions::new().create(true).append(true).open(path),
        }
        .map_err(|e| host_err(path, e))?;
        Ok(Box::new(RealHandle(file)))
    }

    fn exists(&self, path: &str) -> bool {
        fs::metadata(path).is_ok()
    }

    fn is_file(&self, path: &str) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    fn is_dir(&self, path: &str) -> bool {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| host_err(path, e))
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        fs::write(path, content).map_err(|e| host_err(path, e))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| host_err(path, e))? {
            let entry = entry.map_err(|e| host_err(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| host_err(path, e))
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        fs::remove_file(path).map_err(|e| host_err(path, e))
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| host_err(path, e))
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(from, to).map_err(|e| host_err(from, e))
    }

    fn copy(&self, from: &str, to: &str) -> Result<u64> {
        fs::copy(from, to).map_err(|e| host_err(from, e))
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let meta = fs::metadata(path).map_err(|e| host_err(path, e))?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Metadata::new(meta.len(), modified, meta.is_dir()))
    }
}

struct RealHandle(fs::File);

impl Read for RealHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for RealHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl FileHandle for RealHandle {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn path_of(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_round_trip_on_host() -> anyhow::Result<()> {
        let tmp = TempDir::new("realfs")?;
        let file = path_of(&tmp, "a.txt");

        RealFs.write(&file, b"on disk")?;
        assert!(RealFs.exists(&file));
        assert!(RealFs.is_file(&file));
        assert_eq!(RealFs.read(&file)?, b"on disk");

        RealFs.remove_file(&file)?;
        assert!(!RealFs.exists(&file));
        Ok(())
    }

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let tmp = TempDir::new("realfs").unwrap();
        let missing = path_of(&tmp, "missing.txt");

        assert!(matches!(RealFs.read(&missing), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_dirs_and_listing() -> anyhow::Result<()> {
        let tmp = TempDir::new("realfs")?;
        let sub = path_of(&tmp, "sub");

        RealFs.create_dir_all(&sub)?;
        assert!(RealFs.is_dir(&sub));

        RealFs.write(&format!("{sub}/b.txt"), b"b")?;
        RealFs.write(&format!("{sub}/a.txt"), b"a")?;
        assert_eq!(RealFs.read_dir(&sub)?, vec!["a.txt", "b.txt"]);

        RealFs.remove_dir_all(&sub)?;
        assert!(!RealFs.exists(&sub));
        Ok(())
    }

    #[test]
    fn test_handles_write_then_read() -> anyhow::Result<()> {
        let tmp = TempDir::new("realfs")?;
        let file = path_of(&tmp, "h.txt");

        {
            let mut h = RealFs.open(&file, OpenMode::Write)?;
            h.write_all(b"first")?;
        }
        {
            let mut h = RealFs.open(&file, OpenMode::Append)?;
            h.write_all(b" second")?;
        }

        let mut h = RealFs.open(&file, OpenMode::Read)?;
        let mut data = String::new();
        h.read_to_string(&mut data)?;
        assert_eq!(data, "first second");
        Ok(())
    }

    #[test]
    fn test_rename_copy_metadata() -> anyhow::Result<()> {
        let tmp = TempDir::new("realfs")?;
        let a = path_of(&tmp, "a.txt");
        let b = path_of(&tmp, "b.txt");
        let c = path_of(&tmp, "c.txt");

        RealFs.write(&a, b"payload")?;
        RealFs.rename(&a, &b)?;
        assert!(!RealFs.exists(&a));

        let copied = RealFs.copy(&b, &c)?;
        assert_eq!(copied, 7);
        assert_eq!(RealFs.metadata(&c)?.len(), 7);
        assert!(RealFs.metadata(&c)?.is_file());
        Ok(())
    }
}
