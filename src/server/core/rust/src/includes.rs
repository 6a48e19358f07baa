/* src/server/core/rust/src/includes.rs */

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, UndefinedBehavior};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::InitError;
use crate::source::{read_source, resolve_dir};

/// Include fragment that, when present, wraps every page.
pub const BASE_LAYOUT: &str = "base.html";

/// Global holding the current page's lookup key, so a layout can `{% include current_page %}`.
pub const PAGE_GLOBAL: &str = "current_page";

// Names minijinja resolves itself (builtin functions and template-scoped variables).
const ENGINE_NAMES: &[&str] =
  &["range", "dict", "debug", "namespace", "loop", "self", "super", "caller", "varargs", "kwargs"];

/// Shared namespace of parsed fragments, cloned into every page.
pub struct IncludeSet {
  env: Environment<'static>,
  names: Vec<String>,
  base_exists: bool,
  provided: Arc<BTreeSet<String>>,
}

impl IncludeSet {
  /// Parse every regular file directly inside `root` (no recursion), named by file name.
  pub fn load(
    root: &Path,
    functions: &BTreeMap<String, minijinja::Value>,
  ) -> Result<Self, InitError> {
    let root = resolve_dir(root)?;
    info!(dir = %root.display(), "loading includes");

    let mut sources = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).max_depth(1).sort_by_file_name() {
      let entry = entry.map_err(|source| InitError::Walk { root: root.clone(), source })?;
      if !entry.file_type().is_file() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      sources.push((name, read_source(entry.path())?));
    }

    Self::from_sources(sources, functions)
  }

  /// Build from in-memory `(name, source)` pairs. A repeated name replaces the earlier fragment.
  pub fn from_sources<I>(
    sources: I,
    functions: &BTreeMap<String, minijinja::Value>,
  ) -> Result<Self, InitError>
  where
    I: IntoIterator<Item = (String, String)>,
  {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    for (name, function) in functions {
      env.add_global(name.clone(), function.clone());
    }

    let mut names: Vec<String> = Vec::new();
    for (name, source) in sources {
      env
        .add_template_owned(name.clone(), source)
        .map_err(|source| InitError::Parse { name: name.clone(), source })?;
      if names.contains(&name) {
        warn!(include = %name, "include defined twice, later definition wins");
      } else {
        debug!(include = %name, "loaded include");
        names.push(name);
      }
    }

    let base_exists = names.iter().any(|n| n == BASE_LAYOUT);
    let provided = ENGINE_NAMES
      .iter()
      .map(|n| (*n).to_string())
      .chain(functions.keys().cloned())
      .chain(std::iter::once(PAGE_GLOBAL.to_string()))
      .collect();

    Ok(Self { env, names, base_exists, provided: Arc::new(provided) })
  }

  pub fn environment(&self) -> &Environment<'static> {
    &self.env
  }

  /// Fragment names in load order.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn base_exists(&self) -> bool {
    self.base_exists
  }

  /// Top-level names supplied by the environment rather than the view model.
  pub(crate) fn provided(&self) -> &Arc<BTreeSet<String>> {
    &self.provided
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sources(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(n, s)| ((*n).to_string(), (*s).to_string())).collect()
  }

  #[test]
  fn no_base_layout() {
    let set = IncludeSet::from_sources(
      sources(&[("nav.html", "<nav></nav>"), ("footer.html", "<footer></footer>")]),
      &BTreeMap::new(),
    )
    .unwrap();
    assert!(!set.base_exists());
    assert_eq!(set.names(), ["nav.html", "footer.html"]);
  }

  #[test]
  fn base_layout_detected_by_exact_name() {
    let set = IncludeSet::from_sources(
      sources(&[("base.html", "{% include current_page %}")]),
      &BTreeMap::new(),
    )
    .unwrap();
    assert!(set.base_exists());

    let near_miss =
      IncludeSet::from_sources(sources(&[("base.htm", "x"), ("Base.html", "y")]), &BTreeMap::new())
        .unwrap();
    assert!(!near_miss.base_exists());
  }

  #[test]
  fn later_fragment_wins() {
    let set = IncludeSet::from_sources(
      sources(&[("nav.html", "first"), ("nav.html", "second")]),
      &BTreeMap::new(),
    )
    .unwrap();
    assert_eq!(set.names(), ["nav.html"]);
    let template = set.environment().get_template("nav.html").unwrap();
    let rendered = template.render(minijinja::context! {}).unwrap();
    assert_eq!(rendered, "second");
  }

  #[test]
  fn syntax_error_reports_fragment() {
    let err = IncludeSet::from_sources(sources(&[("broken.html", "{% if %}")]), &BTreeMap::new())
      .err()
      .unwrap();
    match err {
      InitError::Parse { name, .. } => assert_eq!(name, "broken.html"),
      other => panic!("expected parse error, got {other}"),
    }
  }

  #[test]
  fn functions_are_globals_and_provided() {
    let mut functions = BTreeMap::new();
    functions.insert(
      "shout".to_string(),
      minijinja::Value::from_function(|s: String| s.to_uppercase()),
    );
    let set =
      IncludeSet::from_sources(sources(&[("greet.html", "{{ shout('hi') }}")]), &functions)
        .unwrap();
    let template = set.environment().get_template("greet.html").unwrap();
    let rendered = template.render(minijinja::context! {}).unwrap();
    assert_eq!(rendered, "HI");
    assert!(set.provided().contains("shout"));
    assert!(set.provided().contains(PAGE_GLOBAL));
    assert!(set.provided().contains("range"));
  }

  #[test]
  fn load_reads_one_level_sorted() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("b.html"), "b").unwrap();
    std::fs::write(tmp.path().join("a.html"), "a").unwrap();
    std::fs::create_dir(tmp.path().join("nested")).unwrap();
    std::fs::write(tmp.path().join("nested").join("c.html"), "c").unwrap();

    let set = IncludeSet::load(tmp.path(), &BTreeMap::new()).unwrap();
    assert_eq!(set.names(), ["a.html", "b.html"]);
  }

  #[test]
  fn load_missing_dir() {
    let err = IncludeSet::load(Path::new("/no/such/includes"), &BTreeMap::new()).err().unwrap();
    assert!(matches!(err, InitError::Resolve { .. }));
  }
}
