//! Scoped interception of the file-access primitives.
//!
//! The crate keeps one process-wide provider slot. While the slot is empty,
//! the primitives in [`crate::fs`] delegate to the real filesystem; while a
//! [`FakeFs`] is installed, they delegate to the virtual model instead.
//! Install and restore are a single slot swap, so other threads never
//! observe a half-patched state.
//!
//! The layer has two states, inactive and active. [`activate`] moves it to
//! active and returns a [`PatchGuard`]; dropping the guard moves it back,
//! on every exit path including panics, so a failing test cannot leak a
//! patched state into the next one. Activating while already active is a
//! usage error, not a no-op: stacking scopes would corrupt the snapshot of
//! what "restored" means.

use std::sync::{Arc, PoisonError, RwLock};

use crate::core::{FileAccess, FsError, Result};
use crate::vfs::{FakeFs, RealFs};

static INSTALLED: RwLock<Option<Arc<dyn FileAccess>>> = RwLock::new(None);

/// Runs `f` against the currently installed provider, falling back to the
/// real filesystem when no interception scope is active.
pub(crate) fn with_provider<R>(f: impl FnOnce(&dyn FileAccess) -> R) -> R {
    // Recover from poisoning: a panic inside a patched scope must not take
    // the provider slot down with it.
    let slot = INSTALLED.read().unwrap_or_else(PoisonError::into_inner);
    match slot.as_deref() {
        Some(provider) => f(provider),
        None => f(&RealFs),
    }
}

/// Installs `fs` as the provider behind the [`crate::fs`] primitives.
///
/// Fails with [`FsError::Usage`] if a scope is already active; overlapping
/// scopes are rejected outright rather than stacked.
pub fn activate(fs: FakeFs) -> Result<PatchGuard> {
    let mut slot = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(FsError::usage(
            "file-access interception is already active",
        ));
    }
    *slot = Some(Arc::new(fs));
    Ok(PatchGuard { _priv: () })
}

/// Restores the real file-access primitives.
///
/// Usually invoked by [`PatchGuard`] on drop; calling it with no active
/// scope fails with [`FsError::Usage`].
pub fn deactivate() -> Result<()> {
    let mut slot = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
    if slot.take().is_none() {
        return Err(FsError::usage("file-access interception is not active"));
    }
    Ok(())
}

/// Reports whether an interception scope is currently active.
pub fn is_active() -> bool {
    INSTALLED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Active interception scope. Exists only between [`activate`] and the end
/// of the scoped region; dropping it always restores the real primitives,
/// whether or not any substitute was ever called.
#[must_use = "dropping the guard immediately would end the patched scope"]
pub struct PatchGuard {
    _priv: (),
}

impl Drop for PatchGuard {
    fn drop(&mut self) {
        // Deactivating twice (explicit deactivate() followed by the guard
        // going out of scope) is harmless here.
        let _ = deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs;

    use std::io::{Read, Write};
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::{Mutex, MutexGuard};

    use tempdir::TempDir;

    // The cargo test harness is multi-threaded and the provider slot is
    // process-wide, so every test touching it serializes on this lock.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serialized() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_activate_routes_and_drop_restores() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        vfs.add_file("dir/file.txt", "hello")?;

        {
            let _guard = vfs.patch()?;
            assert!(is_active());

            let mut handle = fs::File::open("dir/file.txt")?;
            let mut data = String::new();
            handle.read_to_string(&mut data)?;
            assert_eq!(data, "hello");

            let missing = fs::File::open("dir/missing.txt");
            assert!(matches!(missing, Err(FsError::NotFound(_))));
        }

        assert!(!is_active());
        Ok(())
    }

    #[test]
    fn test_nested_activation_is_usage_error() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        let _guard = vfs.patch()?;

        let second = FakeFs::new().patch();
        assert!(matches!(second, Err(FsError::Usage(_))));

        // the failed attempt must not have disturbed the active scope
        assert!(is_active());
        Ok(())
    }

    #[test]
    fn test_deactivate_while_inactive_is_usage_error() {
        let _serial = serialized();

        assert!(!is_active());
        assert!(matches!(deactivate(), Err(FsError::Usage(_))));
    }

    #[test]
    fn test_restored_after_panic_inside_scope() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        vfs.add_file("/poison.txt", "boom")?;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _guard = vfs.patch().unwrap();
            assert!(fs::exists("/poison.txt"));
            panic!("code under test failed");
        }));
        assert!(outcome.is_err());

        // the guard ran on the unwind path
        assert!(!is_active());
        Ok(())
    }

    #[test]
    fn test_writes_inside_scope_land_in_virtual_model() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        vfs.add_file("a.txt", "x")?;

        {
            let _guard = vfs.patch()?;
            let mut handle = fs::File::create("a.txt")?;
            handle.write_all(b"y")?;
        }

        // a fresh read through the virtual filesystem, after scope exit
        assert_eq!(vfs.read("a.txt")?, b"y");
        Ok(())
    }

    #[test]
    fn test_post_scope_operations_hit_the_real_disk() -> anyhow::Result<()> {
        let _serial = serialized();

        let tmp = TempDir::new("patch")?;
        let real_file = tmp.path().join("real.txt").to_string_lossy().into_owned();
        std::fs::write(&real_file, b"on disk")?;

        let vfs = FakeFs::new();
        vfs.add_file("/virtual-only.txt", "in memory")?;

        {
            let _guard = vfs.patch()?;
            // the real file is invisible while the virtual model is in force
            assert!(!fs::exists(&real_file));
            assert!(fs::exists("/virtual-only.txt"));
        }

        // bindings are back: the real file is visible, the virtual one is not
        assert!(fs::exists(&real_file));
        assert!(!fs::exists("/virtual-only.txt"));
        assert_eq!(fs::read(&real_file)?, b"on disk");
        Ok(())
    }

    #[test]
    fn test_bulk_primitives_route_to_virtual_model() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        vfs.add_file("/app/config.toml", "key = 1")?;

        {
            let _guard = vfs.patch()?;

            assert_eq!(fs::read_to_string("/app/config.toml")?, "key = 1");
            assert!(fs::is_file("/app/config.toml"));
            assert!(fs::is_dir("/app"));

            fs::create_dir_all("/app/cache")?;
            fs::write("/app/cache/entry", b"cached")?;
            assert_eq!(fs::read_dir("/app")?, vec!["cache", "config.toml"]);

            fs::copy("/app/config.toml", "/app/config.bak")?;
            fs::rename("/app/config.bak", "/app/config.old")?;
            assert_eq!(fs::metadata("/app/config.old")?.len(), 7);

            fs::remove_file("/app/config.old")?;
            fs::remove_dir_all("/app/cache")?;
            assert_eq!(fs::read_dir("/app")?, vec!["config.toml"]);
        }

        // everything happened in memory
        assert!(vfs.exists("/app/config.toml"));
        assert!(!vfs.exists("/app/cache"));
        Ok(())
    }

    #[test]
    fn test_primitives_accept_path_types() -> anyhow::Result<()> {
        let _serial = serialized();

        let vfs = FakeFs::new();
        vfs.add_file("/app/config.toml", "key = 1")?;

        {
            let _guard = vfs.patch()?;

            // &Path and PathBuf work wherever std::fs would take them
            let as_path = std::path::Path::new("/app/config.toml");
            assert!(fs::exists(as_path));
            assert_eq!(fs::read_to_string(as_path)?, "key = 1");

            let as_buf = std::path::PathBuf::from("/app").join("copy.toml");
            fs::copy(as_path, &as_buf)?;
            assert_eq!(fs::read(&as_buf)?, b"key = 1");

            let mut handle = fs::File::open(as_buf)?;
            let mut data = String::new();
            handle.read_to_string(&mut data)?;
            assert_eq!(data, "key = 1");
        }
        Ok(())
    }

    #[test]
    fn test_explicit_deactivate_then_guard_drop() -> anyhow::Result<()> {
        let _serial = serialized();

        let guard = FakeFs::new().patch()?;
        deactivate()?;
        assert!(!is_active());

        // the guard's own drop finds nothing to restore and stays quiet
        drop(guard);
        assert!(!is_active());
        Ok(())
    }
}
