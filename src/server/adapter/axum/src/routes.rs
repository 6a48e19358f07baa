/* src/server/adapter/axum/src/routes.rs */

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::response::{Html, IntoResponse};
use axum::routing::{MethodRouter, any, get};
use serde::Serialize;
use temple_server::{Executor, PageTemplate, TemplateError, TemplateManager, ViewModel};
use tracing::{debug, info, warn};

use crate::error::{RenderFailure, RouteError, StartupError};

/// Builder that binds page templates to axum routes.
///
/// Every template is fetched and validated while the route is registered. A
/// failure does not stop registration; it is recorded and reported by
/// [`Routes::into_router`] together with every other failure.
pub struct Routes {
  manager: Arc<TemplateManager>,
  router: Router,
  paths: BTreeSet<String>,
  failures: Vec<RouteError>,
}

impl Routes {
  pub fn new(manager: Arc<TemplateManager>) -> Self {
    Self { manager, router: Router::new(), paths: BTreeSet::new(), failures: Vec::new() }
  }

  pub fn manager(&self) -> &Arc<TemplateManager> {
    &self.manager
  }

  /// Route any method on `path` to `handler` with a validated executor for `key`.
  pub fn executor_route<M, H, Fut, R>(
    mut self,
    path: &str,
    key: &str,
    example: &M,
    handler: H,
  ) -> Self
  where
    M: Serialize + ?Sized,
    H: Fn(Arc<Executor>, Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
  {
    if !self.claim(path) {
      return self;
    }
    match self.manager.executor(key, example) {
      Ok(executor) => {
        let executor = Arc::new(executor);
        let route = any(move |request: Request| async move { handler(executor, request).await });
        self.mount(path, key, route);
      }
      Err(err) => self.fail(path, err),
    }
    self
  }

  /// Like [`Routes::executor_route`], but hands the handler the validated raw template.
  pub fn template_route<M, H, Fut, R>(
    mut self,
    path: &str,
    key: &str,
    example: &M,
    handler: H,
  ) -> Self
  where
    M: Serialize + ?Sized,
    H: Fn(Arc<PageTemplate>, Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
  {
    if !self.claim(path) {
      return self;
    }
    match self.manager.template(key, example) {
      Ok(page) => {
        let route = any(move |request: Request| async move { handler(page, request).await });
        self.mount(path, key, route);
      }
      Err(err) => self.fail(path, err),
    }
    self
  }

  /// GET `path` renders `key` with the view model built by `data`.
  ///
  /// The template is validated against `M`'s declared shape. Render failures
  /// become a JSON error response through [`RenderFailure`].
  pub fn page<M, F>(mut self, path: &str, key: &str, data: F) -> Self
  where
    M: ViewModel + Serialize + Send + 'static,
    F: Fn(&Request) -> M + Clone + Send + Sync + 'static,
  {
    if !self.claim(path) {
      return self;
    }
    match self.manager.executor_for::<M>(key) {
      Ok(executor) => {
        let executor = Arc::new(executor);
        let route = get(move |request: Request| async move {
          let model = data(&request);
          executor.render_to_string(&model).map(Html).map_err(RenderFailure)
        });
        self.mount(path, key, route);
      }
      Err(err) => self.fail(path, err),
    }
    self
  }

  /// Failures recorded so far.
  pub fn failures(&self) -> &[RouteError] {
    &self.failures
  }

  pub fn into_router(self) -> Result<Router, StartupError> {
    if self.failures.is_empty() {
      Ok(self.router)
    } else {
      Err(StartupError { failures: self.failures })
    }
  }

  pub async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_router()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("temple server running on http://localhost:{}", local_addr.port());
    axum::serve(listener, router).await?;
    Ok(())
  }

  fn claim(&mut self, path: &str) -> bool {
    if !path.starts_with('/') {
      self.failures.push(RouteError::InvalidPath { path: path.to_string() });
      return false;
    }
    if !self.paths.insert(path.to_string()) {
      self.failures.push(RouteError::Duplicate { path: path.to_string() });
      return false;
    }
    true
  }

  fn mount(&mut self, path: &str, key: &str, route: MethodRouter) {
    debug!(path, key, "route registered");
    self.router = std::mem::take(&mut self.router).route(path, route);
  }

  fn fail(&mut self, path: &str, source: TemplateError) {
    warn!(path, "{source}");
    self.failures.push(RouteError::Template { path: path.to_string(), source });
  }
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::StatusCode;
  use http_body_util::BodyExt;
  use temple_server::TemplateOptions;
  use tower::ServiceExt;

  use super::*;

  #[derive(Serialize, temple_server::ViewModel)]
  #[allow(non_snake_case)]
  struct IndexViewModel {
    Name: String,
  }

  #[derive(Serialize, temple_server::ViewModel)]
  struct Profile {
    user: Option<User>,
  }

  #[derive(Serialize, temple_server::ViewModel)]
  struct User {
    name: String,
  }

  fn manager(
    pages: &[(&str, &str)],
    includes: &[(&str, &str)],
  ) -> (tempfile::TempDir, Arc<TemplateManager>) {
    let tmp = tempfile::tempdir().unwrap();
    for (dir, files) in [("www", pages), ("include", includes)] {
      let root = tmp.path().join(dir);
      std::fs::create_dir_all(&root).unwrap();
      for (name, content) in files {
        std::fs::write(root.join(name), content).unwrap();
      }
    }
    let opts = TemplateOptions::new(tmp.path().join("www"), tmp.path().join("include"));
    (tmp, Arc::new(TemplateManager::new(opts).unwrap()))
  }

  async fn call(router: Router, uri: &str) -> (StatusCode, String) {
    let req = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn index(
    executor: Arc<Executor>,
    _request: Request,
  ) -> Result<Html<String>, RenderFailure> {
    let html = executor.render_to_string(&IndexViewModel { Name: "Bob Dobbs".into() })?;
    Ok(Html(html))
  }

  #[tokio::test]
  async fn executor_route_renders_through_layout() {
    let (_tmp, tm) = manager(
      &[("index.html", "<h1>Hello {{ Name }}</h1>")],
      &[("base.html", "<body>{% include current_page %}</body>")],
    );
    let router = Routes::new(tm)
      .executor_route("/", "index.html", &IndexViewModel { Name: String::new() }, index)
      .into_router()
      .unwrap();
    let (status, body) = call(router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<body><h1>Hello Bob Dobbs</h1></body>");
  }

  #[tokio::test]
  async fn template_route_exposes_raw_template() {
    let (_tmp, tm) = manager(&[("about.html", "about {{ Name }}")], &[]);
    let router = Routes::new(tm)
      .template_route(
        "/about",
        "about.html",
        &IndexViewModel { Name: String::new() },
        |page: Arc<PageTemplate>, _request: Request| async move {
          let template = page.template().map_err(RenderFailure)?;
          let html = template
            .render(temple_server::minijinja::context! { Name => "raw" })
            .map_err(|source| TemplateError::Render { name: "about.html".into(), source })?;
          Ok::<_, RenderFailure>(Html(html))
        },
      )
      .into_router()
      .unwrap();
    let (status, body) = call(router, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "about raw");
  }

  #[tokio::test]
  async fn page_renders_typed_view_model() {
    let (_tmp, tm) = manager(&[("index.html", "Hello {{ Name }}")], &[]);
    let router = Routes::new(tm)
      .page("/", "index.html", |_request: &Request| IndexViewModel { Name: "Bob Dobbs".into() })
      .into_router()
      .unwrap();
    let (status, body) = call(router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello Bob Dobbs");
  }

  #[tokio::test]
  async fn render_failure_is_500_json() {
    let (_tmp, tm) = manager(&[("profile.html", "{{ user.name }}")], &[]);
    let router = Routes::new(tm)
      .page("/profile", "profile.html", |_request: &Request| Profile { user: None })
      .into_router()
      .unwrap();
    let (status, body) = call(router, "/profile").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "RENDER_ERROR");
  }

  #[test]
  fn startup_collects_every_failure() {
    let (_tmp, tm) = manager(&[("index.html", "{{ Name }}"), ("title.html", "{{ Title }}")], &[]);
    let example = IndexViewModel { Name: String::new() };
    let routes = Routes::new(tm)
      .executor_route("/", "index.html", &example, index)
      .executor_route("/missing", "missing.html", &example, index)
      .executor_route("/title", "title.html", &example, index)
      .executor_route("/", "index.html", &example, index)
      .executor_route("nope", "index.html", &example, index);
    assert_eq!(routes.failures().len(), 4);

    let err = routes.into_router().unwrap_err();
    let paths: Vec<&str> = err.failures.iter().map(RouteError::path).collect();
    assert_eq!(paths, vec!["/missing", "/title", "/", "nope"]);
    assert!(matches!(
      &err.failures[0],
      RouteError::Template { source, .. } if source.code() == "NOT_FOUND"
    ));
    assert!(matches!(
      &err.failures[1],
      RouteError::Template { source, .. } if source.code() == "VALIDATION_ERROR"
    ));
    assert!(matches!(err.failures[2], RouteError::Duplicate { .. }));
    assert!(matches!(err.failures[3], RouteError::InvalidPath { .. }));
  }

  #[tokio::test]
  async fn unmatched_path_is_404() {
    let (_tmp, tm) = manager(&[("index.html", "x")], &[]);
    let router = Routes::new(tm)
      .page("/", "index.html", |_request: &Request| IndexViewModel { Name: String::new() })
      .into_router()
      .unwrap();
    let (status, _) = call(router, "/elsewhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
