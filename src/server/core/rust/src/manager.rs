/* src/server/core/rust/src/manager.rs */

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::info;

use crate::ViewModel;
use crate::errors::TemplateError;
use crate::executor::Executor;
use crate::options::TemplateOptions;
use crate::pages::PageTemplate;
use crate::store::TemplateStore;

/// Entry point for applications: owns the options and the current store snapshot.
///
/// ```no_run
/// use temple_server::{TemplateManager, TemplateOptions};
///
/// #[derive(serde::Serialize)]
/// struct Index {
///   name: String,
/// }
///
/// let manager = TemplateManager::new(TemplateOptions::new("www", "include"))?;
/// let exec = manager.executor("index.html", &Index { name: String::new() })?;
/// let _html = exec.render_to_string(&Index { name: "Bob Dobbs".into() })?;
/// # Ok::<(), temple_server::TemplateError>(())
/// ```
pub struct TemplateManager {
  options: TemplateOptions,
  store: RwLock<Arc<TemplateStore>>,
}

impl TemplateManager {
  pub fn new(options: TemplateOptions) -> Result<Self, TemplateError> {
    let store = TemplateStore::load(&options)?;
    Ok(Self { options, store: RwLock::new(Arc::new(store)) })
  }

  pub fn options(&self) -> &TemplateOptions {
    &self.options
  }

  /// Current snapshot. Holding it keeps that generation alive across reloads.
  pub fn store(&self) -> Arc<TemplateStore> {
    Arc::clone(&self.store.read().unwrap_or_else(PoisonError::into_inner))
  }

  /// Rebuild the store from disk and publish it in one swap. On failure the
  /// previous store stays in place. Executors built earlier keep rendering
  /// the templates they were built from.
  pub fn reload(&self) -> Result<(), TemplateError> {
    let fresh = Arc::new(TemplateStore::load(&self.options)?);
    let pages = fresh.len();
    *self.store.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    info!(pages, "template store reloaded");
    Ok(())
  }

  pub fn executor<M: Serialize + ?Sized>(
    &self,
    key: &str,
    example: &M,
  ) -> Result<Executor, TemplateError> {
    self.store().executor(key, example)
  }

  pub fn executor_for<M: ViewModel>(&self, key: &str) -> Result<Executor, TemplateError> {
    self.store().executor_for::<M>(key)
  }

  pub fn template<M: Serialize + ?Sized>(
    &self,
    key: &str,
    example: &M,
  ) -> Result<Arc<PageTemplate>, TemplateError> {
    self.store().template(key, example)
  }
}
