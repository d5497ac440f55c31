//! `tokio::fs` implementation of [`ILocalFileSystem`]
//!
//! ## Design Decisions
//!
//! - **Direct writes**: downloads are written straight to the destination.
//!   An interrupted write leaves a short file behind, which the next pass
//!   detects by size and downloads again.
//! - **Non-recursive mkdir**: `create_dir` fails if the parent is missing;
//!   callers create parents first.
//! - **Symlinks**: classified by their target. Symlinked directories are
//!   listed but not descended into; dangling links are skipped.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use boxmirror_core::ports::local_filesystem::{FileSystemState, ILocalFileSystem, LocalTree};
use tracing::{debug, instrument, warn};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Real-disk [`ILocalFileSystem`]
///
/// Stateless: every call is fully described by its path arguments. The
/// mirror roots live in the `PathMapper`.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pre-order walk: each directory is pushed before its children.
    fn walk_directory<'a>(
        &'a self,
        dir: &'a Path,
        tree: &'a mut LocalTree,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut entries = tokio::fs::read_dir(dir)
                .await
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

            let mut children = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                children.push(entry);
            }
            children.sort_by_key(|e| e.file_name());

            for entry in children {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                let metadata = match tokio::fs::metadata(&path).await {
                    Ok(m) => m,
                    Err(e) if e.kind() == ErrorKind::NotFound && file_type.is_symlink() => {
                        warn!(path = %path.display(), "Skipping dangling symlink");
                        continue;
                    }
                    Err(e) => {
                        return Err(anyhow::Error::new(e)
                            .context(format!("Failed to stat: {}", path.display())))
                    }
                };

                if metadata.is_dir() {
                    tree.dirs.push(path.clone());
                    if file_type.is_dir() {
                        self.walk_directory(&path, tree).await?;
                    }
                } else if metadata.is_file() {
                    tree.files.push(path);
                }
            }

            Ok(())
        })
    }
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn state(&self, path: &Path) -> anyhow::Result<FileSystemState> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(FileSystemState::not_found());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(FileSystemState {
            exists: true,
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
        })
    }

    #[instrument(skip(self), fields(root = %root.display()))]
    async fn walk(&self, root: &Path) -> anyhow::Result<LocalTree> {
        let mut tree = LocalTree::default();
        self.walk_directory(root, &mut tree).await?;
        debug!(
            files = tree.files.len(),
            dirs = tree.dirs.len(),
            "walk complete"
        );
        Ok(tree)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        tokio::fs::write(path, data)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn create_dir(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir(path)
            .await
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::remove_dir_all(path)
            .await
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
