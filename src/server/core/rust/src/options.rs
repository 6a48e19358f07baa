/* src/server/core/rust/src/options.rs */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::InitError;

pub const DEFAULT_PAGES_ROOT: &str = "www";
pub const DEFAULT_INCLUDES_ROOT: &str = "include";

/// Where templates live and what the template language can call.
///
/// Deserializable so applications can keep it in their own TOML config:
///
/// ```toml
/// pages_root = "www"
/// includes_root = "include"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateOptions {
  /// Walked recursively; every regular file becomes a page keyed by its relative path.
  pub pages_root: PathBuf,
  /// Flat directory of shared fragments, each named after its file name.
  pub includes_root: PathBuf,
  /// Reserved for hot reload. Accepted but not acted upon.
  pub watch_for_changes: bool,
  /// Callables exposed to templates as globals, e.g. `minijinja::Value::from_function(..)`.
  #[serde(skip)]
  pub functions: BTreeMap<String, minijinja::Value>,
}

impl TemplateOptions {
  pub fn new(pages_root: impl Into<PathBuf>, includes_root: impl Into<PathBuf>) -> Self {
    Self {
      pages_root: pages_root.into(),
      includes_root: includes_root.into(),
      watch_for_changes: false,
      functions: BTreeMap::new(),
    }
  }

  pub fn function(mut self, name: impl Into<String>, function: minijinja::Value) -> Self {
    self.functions.insert(name.into(), function);
    self
  }

  pub fn watch_for_changes(mut self, watch: bool) -> Self {
    self.watch_for_changes = watch;
    self
  }

  pub fn from_toml_str(content: &str) -> Result<Self, InitError> {
    toml::from_str(content).map_err(|e| InitError::Config(e.to_string()))
  }

  /// Relative roots are taken relative to the directory holding the file.
  pub fn from_toml_file(path: &Path) -> Result<Self, InitError> {
    let content = std::fs::read_to_string(path)
      .map_err(|source| InitError::Read { path: path.to_path_buf(), source })?;
    let mut options = Self::from_toml_str(&content)?;
    if let Some(dir) = path.parent() {
      options.pages_root = dir.join(&options.pages_root);
      options.includes_root = dir.join(&options.includes_root);
    }
    Ok(options)
  }
}

impl Default for TemplateOptions {
  fn default() -> Self {
    Self::new(DEFAULT_PAGES_ROOT, DEFAULT_INCLUDES_ROOT)
  }
}
