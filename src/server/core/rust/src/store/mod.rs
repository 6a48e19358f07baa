/* src/server/core/rust/src/store/mod.rs */

// Immutable lookup from page key to composed template, plus the validated
// executor construction path on top of it.


use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::ViewModel;
use crate::errors::TemplateError;
use crate::executor::Executor;
use crate::includes::{BASE_LAYOUT, IncludeSet};
use crate::options::TemplateOptions;
use crate::pages::{self, PageTemplate};
use crate::shape::Shape;
use crate::validate::{FieldPathValidator, Validator};

pub struct TemplateStore {
  pages: BTreeMap<String, Arc<PageTemplate>>,
  includes: Vec<String>,
  base_exists: bool,
}

impl TemplateStore {
  /// Load includes, then discover pages. Either everything loads or nothing does.
  pub fn load(options: &TemplateOptions) -> Result<Self, TemplateError> {
    if options.watch_for_changes {
      warn!("watch_for_changes is not supported, templates are loaded once");
    }
    let includes = IncludeSet::load(&options.includes_root, &options.functions)?;
    let pages = pages::discover(&options.pages_root, &includes)?;
    info!(
      pages = pages.len(),
      includes = includes.names().len(),
      layout = includes.base_exists(),
      "template store ready"
    );
    Ok(Self::from_parts(&includes, pages))
  }

  pub fn from_parts(includes: &IncludeSet, pages: BTreeMap<String, Arc<PageTemplate>>) -> Self {
    Self { pages, includes: includes.names().to_vec(), base_exists: includes.base_exists() }
  }

  pub fn get(&self, key: &str) -> Result<&Arc<PageTemplate>, TemplateError> {
    self.pages.get(key).ok_or_else(|| TemplateError::not_found(key))
  }

  pub fn contains(&self, key: &str) -> bool {
    self.pages.contains_key(key)
  }

  /// Page keys in sorted order.
  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.pages.keys().map(String::as_str)
  }

  pub fn includes(&self) -> &[String] {
    &self.includes
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  pub fn base_exists(&self) -> bool {
    self.base_exists
  }

  pub fn entry_point<'a>(&self, key: &'a str) -> &'a str {
    if self.base_exists { BASE_LAYOUT } else { key }
  }

  /// Validated raw template, for callers that render through minijinja directly.
  pub fn template<M: Serialize + ?Sized>(
    &self,
    key: &str,
    example: &M,
  ) -> Result<Arc<PageTemplate>, TemplateError> {
    let shape = describe(key, example)?;
    self.template_with(key, &shape, &FieldPathValidator)
  }

  pub fn template_with(
    &self,
    key: &str,
    shape: &Shape,
    validator: &dyn Validator,
  ) -> Result<Arc<PageTemplate>, TemplateError> {
    let page = self.get(key)?;
    validator
      .validate(shape, page, self.entry_point(key))
      .map_err(|mismatch| TemplateError::validation(key, mismatch.to_string()))?;
    Ok(Arc::clone(page))
  }

  /// Build an executor, validating the template against a representative example value.
  pub fn executor<M: Serialize + ?Sized>(
    &self,
    key: &str,
    example: &M,
  ) -> Result<Executor, TemplateError> {
    self.template(key, example).map(Executor::new)
  }

  /// Build an executor from a type's declared shape, no example value needed.
  pub fn executor_for<M: ViewModel>(&self, key: &str) -> Result<Executor, TemplateError> {
    self.executor_with(key, &M::shape(), &FieldPathValidator)
  }

  pub fn executor_with(
    &self,
    key: &str,
    shape: &Shape,
    validator: &dyn Validator,
  ) -> Result<Executor, TemplateError> {
    self.template_with(key, shape, validator).map(Executor::new)
  }
}

fn describe<M: Serialize + ?Sized>(key: &str, example: &M) -> Result<Shape, TemplateError> {
  Shape::of(example)
    .map_err(|e| TemplateError::validation(key, format!("view model cannot be serialized: {e}")))
}
