/* src/server/core/rust/src/source.rs */

// Filesystem helpers shared by the include loader and the page discoverer.

use std::path::{Component, Path, PathBuf};

use crate::errors::InitError;

/// Resolve a configured root to an absolute, existing directory.
pub(crate) fn resolve_dir(path: &Path) -> Result<PathBuf, InitError> {
  let resolved = std::fs::canonicalize(path)
    .map_err(|source| InitError::Resolve { path: path.to_path_buf(), source })?;
  if !resolved.is_dir() {
    return Err(InitError::NotADirectory { path: resolved });
  }
  Ok(resolved)
}

pub(crate) fn read_source(path: &Path) -> Result<String, InitError> {
  std::fs::read_to_string(path)
    .map_err(|source| InitError::Read { path: path.to_path_buf(), source })
}

/// Lookup key for a page: its path relative to `root`, joined with `/` on every platform.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Result<String, InitError> {
  let relative = path
    .strip_prefix(root)
    .map_err(|_| InitError::RelativePath { path: path.to_path_buf(), root: root.to_path_buf() })?;

  let mut segments = Vec::new();
  for component in relative.components() {
    match component {
      Component::Normal(segment) => segments.push(segment.to_string_lossy()),
      _ => {
        return Err(InitError::RelativePath { path: path.to_path_buf(), root: root.to_path_buf() });
      }
    }
  }
  if segments.is_empty() {
    return Err(InitError::RelativePath { path: path.to_path_buf(), root: root.to_path_buf() });
  }
  Ok(segments.join("/"))
}
