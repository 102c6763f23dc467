//! Filesystem layout of baseline, current and diff images
//!
//! Images live at `{root}/{template}/{screen}/{device}/{baseline,current,diff}.png`.
//! The theme is deliberately not part of the key.

use crate::types::ImageArtifactPaths;
use crate::Result;
use std::path::{Path, PathBuf};

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the images of one target
    pub fn target_dir(&self, template: &str, screen: &str, device: &str) -> PathBuf {
        self.root.join(template).join(screen).join(device)
    }

    /// Resolve the image paths of a target, creating its directory if needed.
    pub fn resolve(&self, template: &str, screen: &str, device: &str) -> Result<ImageArtifactPaths> {
        let dir = self.target_dir(template, screen, device);
        std::fs::create_dir_all(&dir)?;

        Ok(ImageArtifactPaths {
            baseline: dir.join("baseline.png"),
            current: dir.join("current.png"),
            diff: dir.join("diff.png"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_layout() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path().join("screenshots"));

        let paths = store.resolve("demo", "search", "desktop").unwrap();
        let dir = temp.path().join("screenshots/demo/search/desktop");

        assert!(dir.is_dir());
        assert_eq!(paths.baseline, dir.join("baseline.png"));
        assert_eq!(paths.current, dir.join("current.png"));
        assert_eq!(paths.diff, dir.join("diff.png"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path());

        let first = store.resolve("demo", "consent", "mobile320").unwrap();
        std::fs::write(&first.baseline, b"keep").unwrap();

        let second = store.resolve("demo", "consent", "mobile320").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second.baseline).unwrap(), b"keep");
    }
}
