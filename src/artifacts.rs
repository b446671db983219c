//! Intermediate artifact lifecycle.
//!
//! Every file the pipeline creates is tracked here until it is either
//! retired at a stage transition or promoted to the deliverable. Dropping
//! the guard removes whatever is still tracked, so any abort path leaves the
//! working directory holding only the source (and, on success, the preview).

use std::fs;
use std::path::{Path, PathBuf};

/// Removes a single artifact. Already-absent files count as removed;
/// other failures are logged and reported but never escalate.
pub fn remove_artifact(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            log::warn!(
                target: "loopvid::artifacts",
                "failed to remove {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}

/// Scoped tracker for created-but-not-yet-retired artifacts.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    pending: Vec<PathBuf>,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a path that is about to be created.
    pub fn track(&mut self, path: PathBuf) {
        self.pending.push(path);
    }

    /// Delete the given artifacts now and stop tracking them.
    pub fn release(&mut self, paths: &[PathBuf]) {
        for path in paths {
            remove_artifact(path);
            self.pending.retain(|p| p != path);
        }
    }

    /// Delete everything still tracked.
    pub fn release_all(&mut self) {
        for path in std::mem::take(&mut self.pending) {
            remove_artifact(&path);
        }
    }

    /// Stop tracking a path without deleting it. Used to hand the finished
    /// preview over to the caller.
    pub fn forget(&mut self, path: &Path) {
        self.pending.retain(|p| p != path);
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn release_removes_and_untracks() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.ts");
        let b = touch(dir.path(), "b.ts");

        let mut guard = ArtifactGuard::new();
        guard.track(a.clone());
        guard.track(b.clone());
        guard.release(std::slice::from_ref(&a));

        assert!(!a.exists());
        assert!(b.exists());
        assert_eq!(guard.pending(), &[b.clone()]);
    }

    #[test]
    fn release_is_idempotent_on_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.ts");

        let mut guard = ArtifactGuard::new();
        guard.track(a.clone());
        guard.release(std::slice::from_ref(&a));
        // Second release of the same (now absent) path must be harmless.
        guard.release(std::slice::from_ref(&a));
        assert!(!a.exists());
    }

    #[test]
    fn drop_removes_everything_still_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.ts");
        let b = touch(dir.path(), "b.ts");

        {
            let mut guard = ArtifactGuard::new();
            guard.track(a.clone());
            guard.track(b.clone());
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn forget_keeps_the_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let keep = touch(dir.path(), "preview.webp");

        {
            let mut guard = ArtifactGuard::new();
            guard.track(keep.clone());
            guard.forget(&keep);
        }
        assert!(keep.exists());
    }

    #[test]
    fn remove_artifact_reports_missing_as_removed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_artifact(&dir.path().join("never-created.ts")));
    }
}
