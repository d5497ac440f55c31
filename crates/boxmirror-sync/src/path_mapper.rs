//! Path translation between the local root and the remote root
//!
//! Translation is prefix substitution on path components. The remote root
//! `/` composes remote paths directly under the storage root.

use std::path::{Component, Path, PathBuf};

use boxmirror_core::{
    domain::{errors::DomainError, newtypes::RemotePath},
    ports::remote_store::IRemoteStore,
};
use tracing::instrument;

use crate::SyncError;

/// A (local root, remote root) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    local_root: PathBuf,
    remote_root: RemotePath,
}

impl PathMapper {
    /// # Errors
    /// Returns error if `local_root` is not absolute
    pub fn new(local_root: PathBuf, remote_root: RemotePath) -> Result<Self, DomainError> {
        if !local_root.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Local root must be absolute: {}",
                local_root.display()
            )));
        }

        Ok(Self {
            local_root,
            remote_root,
        })
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &RemotePath {
        &self.remote_root
    }

    /// Strips the remote root and joins the remainder onto the local root
    pub fn remote_to_local(&self, remote: &RemotePath) -> Result<PathBuf, DomainError> {
        let relative = remote
            .relative_to(&self.remote_root)
            .ok_or_else(|| DomainError::PathNotInSyncRoot(remote.to_string()))?;

        let mut local = self.local_root.clone();
        local.extend(relative.split('/').filter(|c| !c.is_empty()));
        Ok(local)
    }

    /// Strips the local root and appends the remainder onto the remote root
    pub fn local_to_remote(&self, local: &Path) -> Result<RemotePath, DomainError> {
        let relative = local
            .strip_prefix(&self.local_root)
            .map_err(|_| DomainError::PathNotInSyncRoot(local.display().to_string()))?;

        relative
            .components()
            .try_fold(self.remote_root.clone(), |remote, component| match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        DomainError::InvalidPath(format!(
                            "Non UTF-8 file name: {}",
                            local.display()
                        ))
                    })?;
                    remote.join(name)
                }
                _ => Err(DomainError::InvalidPath(local.display().to_string())),
            })
    }

    /// Asks the remote whether `path` exists
    ///
    /// A not-found answer is `false`. Any other failure is returned as an
    /// error because it says nothing about whether the path exists.
    #[instrument(skip(self, remote), fields(path = %path))]
    pub async fn remote_path_exists(
        &self,
        remote: &dyn IRemoteStore,
        path: &RemotePath,
    ) -> Result<bool, SyncError> {
        let metadata = remote.get_metadata(path).await.map_err(SyncError::Remote)?;
        Ok(metadata.is_some())
    }
}
