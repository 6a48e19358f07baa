/* src/server/adapter/axum/src/error.rs */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use temple_server::TemplateError;

/// Newtype wrapper to implement `IntoResponse` for `TemplateError`.
/// Required because the orphan rule prevents `impl IntoResponse for TemplateError`
/// when both types are foreign to this crate.
#[derive(Debug)]
pub struct RenderFailure(pub TemplateError);

impl IntoResponse for RenderFailure {
  fn into_response(self) -> Response {
    let err = self.0;
    tracing::error!(code = err.code(), "{err}");
    let status =
      StatusCode::from_u16(err.kind().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
      "ok": false,
      "error": {
        "code": err.code(),
        "message": err.to_string(),
      }
    });
    (status, axum::Json(body)).into_response()
  }
}

impl From<TemplateError> for RenderFailure {
  fn from(err: TemplateError) -> Self {
    Self(err)
  }
}

/// A single route that could not be registered.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
  #[error("route {path}: {source}")]
  Template {
    path: String,
    #[source]
    source: TemplateError,
  },
  #[error("route {path}: already registered")]
  Duplicate { path: String },
  #[error("route {path}: path must start with '/'")]
  InvalidPath { path: String },
}

impl RouteError {
  pub fn path(&self) -> &str {
    match self {
      Self::Template { path, .. } | Self::Duplicate { path } | Self::InvalidPath { path } => path,
    }
  }
}

/// Every registration failure, reported together so one restart fixes them all.
#[derive(Debug, thiserror::Error)]
#[error("{} route(s) failed to register: {}", .failures.len(), join(.failures))]
pub struct StartupError {
  pub failures: Vec<RouteError>,
}

fn join(failures: &[RouteError]) -> String {
  failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
  use http_body_util::BodyExt;

  use super::*;

  #[tokio::test]
  async fn not_found_maps_to_404_json() {
    let resp = RenderFailure(TemplateError::not_found("missing.html")).into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "couldn't find template: missing.html");
  }

  #[test]
  fn validation_maps_to_500() {
    let err = TemplateError::validation("index.html", "missing field `Name`");
    let resp = RenderFailure(err).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn startup_error_lists_every_failure() {
    let err = StartupError {
      failures: vec![
        RouteError::Template { path: "/".into(), source: TemplateError::not_found("a.html") },
        RouteError::Duplicate { path: "/b".into() },
      ],
    };
    assert_eq!(
      err.to_string(),
      "2 route(s) failed to register: \
       route /: couldn't find template: a.html; route /b: already registered"
    );
    assert_eq!(err.failures[1].path(), "/b");
  }
}
