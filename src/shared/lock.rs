use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

// Exclusive OS file lock held for as long as a monitor owns its serial port.
// Two monitors writing queries to one receiver would interleave frames.
pub struct LockGuard {
    file: File,
}

impl LockGuard {
    // Take the lock or fail at once; never waits.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("creating lock directory failed: {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("opening lock file failed: {}", path.display()))?;

        file.try_lock_exclusive()
            .with_context(|| format!("another monitor holds the lock: {}", path.display()))?;

        Ok(Self { file })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails() {
        let path = std::env::temp_dir().join(format!("tsip-monitor-{}.lock", std::process::id()));
        let first = LockGuard::acquire(&path).unwrap();
        assert!(LockGuard::acquire(&path).is_err());
        drop(first);
        assert!(LockGuard::acquire(&path).is_ok());
        let _ = fs::remove_file(&path);
    }
}
