/* src/server/core/rust/src/pages.rs */

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, Template};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::errors::{InitError, TemplateError};
use crate::includes::{BASE_LAYOUT, IncludeSet, PAGE_GLOBAL};
use crate::source::{read_source, relative_key, resolve_dir};

/// One discovered page: a private copy of the include set with the page parsed into it.
pub struct PageTemplate {
  key: String,
  entry_point: String,
  layout: bool,
  env: Environment<'static>,
  provided: Arc<BTreeSet<String>>,
}

impl PageTemplate {
  /// Clone `includes` and add the page under `key`. The clone is independent of
  /// every other page and of the include set itself.
  ///
  /// In layout mode a page keyed `base.html` is rejected, since adding it
  /// would replace the layout in its own clone.
  pub fn compose(key: String, source: String, includes: &IncludeSet) -> Result<Self, InitError> {
    let layout = includes.base_exists();
    if layout && key == BASE_LAYOUT {
      return Err(InitError::LayoutShadowed { key });
    }
    let mut env = includes.environment().clone();
    env
      .add_template_owned(key.clone(), source)
      .map_err(|source| InitError::Parse { name: key.clone(), source })?;
    env.add_global(PAGE_GLOBAL, key.clone());

    let entry_point = if layout { BASE_LAYOUT.to_string() } else { key.clone() };
    Ok(Self { key, entry_point, layout, env, provided: Arc::clone(includes.provided()) })
  }

  /// Path relative to the pages root, `/`-separated.
  pub fn key(&self) -> &str {
    &self.key
  }

  /// Template invoked at render time: the base layout in layout mode, else the page.
  pub fn entry_point(&self) -> &str {
    &self.entry_point
  }

  pub fn is_layout(&self) -> bool {
    self.layout
  }

  pub fn environment(&self) -> &Environment<'static> {
    &self.env
  }

  /// The compiled entry-point template, for callers that drive rendering themselves.
  pub fn template(&self) -> Result<Template<'_, '_>, TemplateError> {
    self
      .env
      .get_template(&self.entry_point)
      .map_err(|source| TemplateError::Render { name: self.entry_point.clone(), source })
  }

  /// Whether a top-level name is supplied by the environment instead of the view model.
  pub fn provides(&self, name: &str) -> bool {
    self.provided.contains(name)
  }
}

/// Walk `root` recursively and compose one page per regular file. Any failure
/// aborts the whole discovery.
pub fn discover(
  root: &Path,
  includes: &IncludeSet,
) -> Result<BTreeMap<String, Arc<PageTemplate>>, InitError> {
  let root = resolve_dir(root)?;
  info!(dir = %root.display(), "loading pages");

  let mut pages = BTreeMap::new();
  for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
    let entry = entry.map_err(|source| InitError::Walk { root: root.clone(), source })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let key = relative_key(&root, entry.path())?;
    let source = read_source(entry.path())?;
    let page = PageTemplate::compose(key.clone(), source, includes)?;
    debug!(page = %key, entry_point = page.entry_point(), "loaded page");
    pages.insert(key, Arc::new(page));
  }

  Ok(pages)
}
