//! Asset lookup in the configured assets directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use mdpost_pipeline::AssetResolver;

/// Resolves embed names to files under a directory.
///
/// A name is tried as a relative path first, then as a bare file name
/// anywhere one level below the root. Names escaping the root are rejected.
#[derive(Debug, Clone)]
pub(crate) struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn find_in_subdirs(&self, name: &str) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.root).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let candidate = entry.path().join(name);
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

fn is_safe_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

#[async_trait]
impl AssetResolver for FsAssetResolver {
    async fn resolve(&self, name: &str) -> Option<String> {
        if !is_safe_relative(name) {
            tracing::warn!(name, "asset name outside the assets directory, ignored");
            return None;
        }

        let direct = self.root.join(name);
        let found = if is_file(&direct).await {
            Some(direct)
        } else {
            self.find_in_subdirs(name).await
        };
        found.map(|path| path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_resolve_direct_and_nested() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("cat.png"), b"png").unwrap();
        std::fs::create_dir(dir.path().join("2024")).unwrap();
        std::fs::write(dir.path().join("2024").join("dog.png"), b"png").unwrap();

        let resolver = FsAssetResolver::new(dir.path());
        assert_eq!(
            resolver.resolve("cat.png").await,
            Some(dir.path().join("cat.png").display().to_string())
        );
        assert_eq!(
            resolver.resolve("dog.png").await,
            Some(dir.path().join("2024").join("dog.png").display().to_string())
        );
        assert_eq!(resolver.resolve("bird.png").await, None);
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolver = FsAssetResolver::new(dir.path().join("assets"));
        assert_eq!(resolver.resolve("../secret.png").await, None);
        assert_eq!(resolver.resolve("/etc/passwd").await, None);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let resolver = FsAssetResolver::new("/nonexistent/mdpost-assets");
        assert_eq!(resolver.resolve("cat.png").await, None);
    }
}
