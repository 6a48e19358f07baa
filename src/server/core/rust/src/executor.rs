/* src/server/core/rust/src/executor.rs */

use std::io;
use std::sync::Arc;

use serde::Serialize;

use crate::errors::TemplateError;
use crate::pages::PageTemplate;

/// A page whose view model has already been validated, ready to render.
///
/// Cheap to clone and safe to share between request handlers. Validation is
/// not repeated per render: data whose shape drifts from the example used at
/// construction (a field that is `None` at runtime, say) surfaces as a
/// render error.
#[derive(Clone)]
pub struct Executor {
  page: Arc<PageTemplate>,
}

impl Executor {
  pub(crate) fn new(page: Arc<PageTemplate>) -> Self {
    Self { page }
  }

  pub fn lookup_key(&self) -> &str {
    self.page.key()
  }

  pub fn entry_point(&self) -> &str {
    self.page.entry_point()
  }

  /// Whether the page renders through the base layout.
  pub fn base_exists(&self) -> bool {
    self.page.is_layout()
  }

  pub fn page(&self) -> &Arc<PageTemplate> {
    &self.page
  }

  pub fn render_to_string<D: Serialize + ?Sized>(&self, data: &D) -> Result<String, TemplateError> {
    let mut buffer = Vec::new();
    self.render_to_writer(&mut buffer, data)?;
    // minijinja only ever writes str slices
    Ok(String::from_utf8_lossy(&buffer).into_owned())
  }

  pub fn render_to_writer<W, D>(&self, writer: W, data: &D) -> Result<(), TemplateError>
  where
    W: io::Write,
    D: Serialize + ?Sized,
  {
    let template = self.page.template()?;
    template
      .render_to_write(data, writer)
      .map(|_| ())
      .map_err(|source| TemplateError::Render { name: self.entry_point().to_string(), source })
  }
}

impl std::fmt::Debug for Executor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Executor")
      .field("lookup_key", &self.lookup_key())
      .field("entry_point", &self.entry_point())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use serde::Serialize;

  use super::*;
  use crate::errors::ErrorKind;
  use crate::includes::IncludeSet;

  fn executor(includes: &[(&str, &str)], key: &str, source: &str) -> Executor {
    let sources = includes.iter().map(|(n, s)| ((*n).to_string(), (*s).to_string()));
    let set = IncludeSet::from_sources(sources, &BTreeMap::new()).unwrap();
    let page = PageTemplate::compose(key.to_string(), source.to_string(), &set).unwrap();
    Executor::new(Arc::new(page))
  }

  #[derive(Serialize)]
  #[allow(non_snake_case)]
  struct IndexViewModel {
    Name: String,
  }

  #[test]
  fn render_substitutes_values() {
    let exec = executor(&[], "index.html", "<p>Hello {{ Name }}</p>");
    let html = exec.render_to_string(&IndexViewModel { Name: "Bob Dobbs".into() }).unwrap();
    assert_eq!(html, "<p>Hello Bob Dobbs</p>");
  }

  #[test]
  fn string_and_writer_output_identical() {
    let exec = executor(
      &[("base.html", "<html>{% include current_page %}</html>\n")],
      "index.html",
      "<p>{{ Name }} & co</p>\n",
    );
    let data = IndexViewModel { Name: "<Bob>".into() };
    let as_string = exec.render_to_string(&data).unwrap();
    let mut sink = Vec::new();
    exec.render_to_writer(&mut sink, &data).unwrap();
    assert_eq!(as_string.as_bytes(), sink.as_slice());
    assert!(as_string.contains("&lt;Bob&gt;"));
  }

  #[test]
  fn renders_through_layout() {
    let exec = executor(
      &[("base.html", "<body>{% include current_page %}</body>")],
      "blog/post.html",
      "{{ Name }}",
    );
    assert!(exec.base_exists());
    assert_eq!(exec.entry_point(), "base.html");
    assert_eq!(exec.lookup_key(), "blog/post.html");
    let html = exec.render_to_string(&IndexViewModel { Name: "x".into() }).unwrap();
    assert_eq!(html, "<body>x</body>");
  }

  #[test]
  fn runtime_missing_field_is_render_error() {
    #[derive(Serialize)]
    struct Nothing {}
    let exec = executor(&[], "index.html", "{{ Name }}");
    let err = exec.render_to_string(&Nothing {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(err.to_string().starts_with("error executing template [index.html]"));
  }

  #[test]
  fn writer_failure_is_render_error() {
    struct Broken;
    impl io::Write for Broken {
      fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("closed"))
      }
      fn flush(&mut self) -> io::Result<()> {
        Ok(())
      }
    }
    let exec = executor(&[], "index.html", "{{ Name }}");
    let err = exec.render_to_writer(Broken, &IndexViewModel { Name: "x".into() }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
  }

  #[test]
  fn executor_is_shareable_across_threads() {
    let exec = executor(&[], "index.html", "{{ Name }}");
    let handles: Vec<_> = (0..4)
      .map(|i| {
        let exec = exec.clone();
        std::thread::spawn(move || {
          exec.render_to_string(&IndexViewModel { Name: format!("n{i}") }).unwrap()
        })
      })
      .collect();
    let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs, vec!["n0", "n1", "n2", "n3"]);
  }
}
