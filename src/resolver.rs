//! Mapping of archive identifiers to directories under the archive root.

use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

/// Longest identifier accepted, matching the usual file name limit.
const MAX_IDENTIFIER_LEN: usize = 255;

/// A directory that existed under the archive root when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    root: PathBuf,
    identifier: String,
}

impl SourceDirectory {
    /// The archive root, used as the compressor's working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The single path segment naming the directory inside the root.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Full path of the directory.
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.identifier)
    }
}

/// Resolves archive identifiers against a fixed root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `identifier` to an existing directory.
    ///
    /// Identifiers that could leave the root are rejected before touching
    /// the filesystem. Both that case and a missing directory come back as
    /// [`AppError::NotFound`].
    pub async fn resolve(&self, identifier: &str) -> Result<SourceDirectory, AppError> {
        if !is_valid_identifier(identifier) {
            tracing::debug!(archive = %identifier, "rejected archive identifier");
            return Err(AppError::NotFound(identifier.to_string()));
        }

        let source = SourceDirectory {
            root: self.root.clone(),
            identifier: identifier.to_string(),
        };

        match tokio::fs::metadata(source.path()).await {
            Ok(meta) if meta.is_dir() => Ok(source),
            _ => Err(AppError::NotFound(identifier.to_string())),
        }
    }
}

/// Check that `identifier` is a single plain path segment.
///
/// Besides traversal this refuses characters that cannot be placed in the
/// quoted `Content-Disposition` filename and a leading `-`, which the
/// compressor would read as an option.
pub fn is_valid_identifier(identifier: &str) -> bool {
    if identifier.is_empty() || identifier.len() > MAX_IDENTIFIER_LEN {
        return false;
    }

    if identifier.starts_with('-') {
        return false;
    }

    if identifier
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '"' || c.is_control())
    {
        return false;
    }

    let mut components = Path::new(identifier).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
