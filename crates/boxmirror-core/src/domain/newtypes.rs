//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for remote paths and the
//! case-folded keys that index remote snapshots. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemotePath
// ============================================================================

/// A remote storage path (must start with /)
///
/// Represents paths in display casing, e.g., "/Documents/Report.pdf".
/// The storage root is "/".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a new RemotePath
    ///
    /// # Errors
    /// Returns error if path doesn't start with /, ends with / (other than
    /// the root), or contains empty, "." or ".." components
    pub fn new(path: String) -> Result<Self, DomainError> {
        if !path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must start with '/': {path}"
            )));
        }

        if path.len() > 1 && path.ends_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must not end with '/': {path}"
            )));
        }

        if path.len() > 1 && path.contains("//") {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains invalid double slashes: {path}"
            )));
        }

        if path.split('/').any(|c| c == "." || c == "..") {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains invalid traversal: {path}"
            )));
        }

        Ok(Self(path))
    }

    /// Normalize user input into a RemotePath
    ///
    /// `""` and `"/"` both mean the storage root. Trailing slashes are
    /// dropped and a missing leading slash is added.
    ///
    /// # Errors
    /// Returns error if the normalized path is still invalid
    pub fn normalize(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        if trimmed.starts_with('/') {
            Self::new(trimmed.to_string())
        } else {
            Self::new(format!("/{trimmed}"))
        }
    }

    /// Create the root path "/"
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Whether this is the storage root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The case-folded key used to index snapshots
    #[must_use]
    pub fn key(&self) -> RemoteKey {
        RemoteKey::new(&self.0)
    }

    /// Number of components below the root ("/" is 0, "/a/b" is 2)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Iterate over the path components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Join a single path component
    ///
    /// # Errors
    /// Returns error if component is invalid
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        if component.is_empty() || component.contains('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Invalid path component: {component}"
            )));
        }

        let new_path = if self.is_root() {
            format!("/{component}")
        } else {
            format!("{}/{component}", self.0)
        };

        Self::new(new_path)
    }

    /// Join every component of a relative, '/'-separated path
    ///
    /// # Errors
    /// Returns error if any component is invalid
    pub fn join_relative(&self, relative: &str) -> Result<Self, DomainError> {
        relative
            .split('/')
            .filter(|c| !c.is_empty())
            .try_fold(self.clone(), |acc, component| acc.join(component))
    }

    /// The remainder of this path below `root`, without a leading slash
    ///
    /// Returns `Some("")` when the path equals the root and `None` when the
    /// path lies outside it. The prefix comparison ignores case, matching
    /// how the remote store resolves paths.
    #[must_use]
    pub fn relative_to(&self, root: &RemotePath) -> Option<&str> {
        if root.is_root() {
            return Some(&self.0[1..]);
        }

        let head = self.0.get(..root.0.len())?;
        if head != root.0 && head.to_lowercase() != root.0.to_lowercase() {
            return None;
        }

        match &self.0[root.0.len()..] {
            "" => Some(""),
            rest => rest.strip_prefix('/'),
        }
    }

    /// Get the parent path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Get the file name component
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }

        self.0.rsplit('/').next()
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

// ============================================================================
// RemoteKey
// ============================================================================

/// Lowercased remote path, the unique key of an entry within a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteKey(String);

impl RemoteKey {
    /// Build a key by case-folding a remote path
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(path.to_lowercase())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
