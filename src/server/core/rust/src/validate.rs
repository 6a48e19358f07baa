/* src/server/core/rust/src/validate.rs */

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::pages::PageTemplate;
use crate::shape::Shape;

/// Why a view-model shape cannot satisfy a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
  pub template: String,
  pub problems: Vec<String>,
}

impl Mismatch {
  pub fn new(template: impl Into<String>, problems: Vec<String>) -> Self {
    Self { template: template.into(), problems }
  }
}

impl fmt::Display for Mismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (in {})", self.problems.join("; "), self.template)
  }
}

/// Decides whether a view model can feed a page's entry point.
pub trait Validator: Send + Sync {
  fn validate(
    &self,
    shape: &Shape,
    page: &PageTemplate,
    entry_point: &str,
  ) -> Result<(), Mismatch>;
}

/// Requires every field path a template reads to exist on the shape.
///
/// Paths come from static analysis of the entry point and of every fragment it
/// reaches through a literal `include`, `import`, `from` or `extends`. In
/// layout mode the page itself is analysed too, since the layout pulls it in
/// by name at render time. Names bound by an enclosing template (`for`
/// targets, `set`, `with`) are not required from a fragment it includes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldPathValidator;

impl FieldPathValidator {
  /// Dotted paths the templates read that the environment does not supply, sorted.
  pub fn required_paths(
    page: &PageTemplate,
    entry_point: &str,
  ) -> Result<BTreeSet<String>, Mismatch> {
    let mut roots = vec![entry_point];
    if entry_point != page.key() {
      roots.push(page.key());
    }

    let mut walk = Walk { page, visited: BTreeSet::new(), required: BTreeSet::new() };
    for name in roots {
      walk.visit(name, &BTreeSet::new())?;
    }
    let mut required = walk.required;
    required.retain(|path: &String| !page.provides(root_segment(path)));
    Ok(required)
  }
}

impl Validator for FieldPathValidator {
  fn validate(
    &self,
    shape: &Shape,
    page: &PageTemplate,
    entry_point: &str,
  ) -> Result<(), Mismatch> {
    let required = Self::required_paths(page, entry_point)?;
    let problems: Vec<String> =
      required.iter().filter_map(|path| shape.check_path(path).err()).collect();
    if problems.is_empty() { Ok(()) } else { Err(Mismatch::new(entry_point, problems)) }
  }
}

struct Walk<'a> {
  page: &'a PageTemplate,
  visited: BTreeSet<String>,
  required: BTreeSet<String>,
}

impl Walk<'_> {
  /// Collect the paths of `name` and of every fragment it references. `bound`
  /// holds names the including templates define; the first visit of a
  /// fragment wins, which also breaks include cycles.
  fn visit(&mut self, name: &str, bound: &BTreeSet<String>) -> Result<(), Mismatch> {
    if !self.visited.insert(name.to_string()) {
      return Ok(());
    }
    let page = self.page;
    let template = page
      .environment()
      .get_template(name)
      .map_err(|e| Mismatch::new(name, vec![format!("template is not loaded: {e}")]))?;
    self.required.extend(
      template
        .undeclared_variables(true)
        .into_iter()
        .filter(|path| !bound.contains(root_segment(path))),
    );

    let source = template.source();
    let mut scope = bound.clone();
    scope.extend(bound_names(source));
    for reference in referenced_templates(source) {
      if reference.optional && page.environment().get_template(&reference.name).is_err() {
        continue;
      }
      self.visit(&reference.name, &scope)?;
    }
    Ok(())
  }
}

struct Reference {
  name: String,
  /// `ignore missing` was given.
  optional: bool,
}

fn reference_tag() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?s)\{%[-+]?\s*(?:include|import|from|extends)\b(.*?)[-+]?%\}").unwrap()
  })
}

fn string_literal() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).unwrap())
}

fn binding_tag() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(concat!(
      r"(?s)\{%[-+]?\s*(?:",
      r"for\s+(.+?)\s+in\b",
      r"|set\s+([\w\s,()]+?)\s*(?:=|[-+]?%\})",
      r"|with\b(.*?)[-+]?%\}",
      r")",
    ))
    .unwrap()
  })
}

fn identifier() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"[A-Za-z_]\w*").unwrap())
}

fn assignment_target() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"([A-Za-z_]\w*)\s*=[^=]").unwrap())
}

/// Template names written as string literals in reference tags.
fn referenced_templates(source: &str) -> Vec<Reference> {
  let mut references = Vec::new();
  for tag in reference_tag().captures_iter(source) {
    let body = &tag[1];
    let optional = body.contains("ignore missing");
    for literal in string_literal().captures_iter(body) {
      if let Some(name) = literal.get(1).or_else(|| literal.get(2)) {
        references.push(Reference { name: name.as_str().to_string(), optional });
      }
    }
  }
  references
}

/// Names a template binds for the fragments it includes.
fn bound_names(source: &str) -> BTreeSet<String> {
  let mut names = BTreeSet::new();
  for tag in binding_tag().captures_iter(source) {
    if let Some(targets) = tag.get(1).or_else(|| tag.get(2)) {
      names.extend(identifier().find_iter(targets.as_str()).map(|m| m.as_str().to_string()));
    } else if let Some(assignments) = tag.get(3) {
      let targets = assignment_target().captures_iter(assignments.as_str());
      names.extend(targets.map(|c| c[1].to_string()));
    }
  }
  names
}

fn root_segment(path: &str) -> &str {
  path.split('.').next().unwrap_or(path)
}
