/* src/server/core/rust/src/errors.rs */

use std::path::PathBuf;

/// Failure while building the template store. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
  #[error("cannot resolve template directory {}: {source}", .path.display())]
  Resolve {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("template root {} is not a directory", .path.display())]
  NotADirectory { path: PathBuf },
  #[error("failed to walk {}: {source}", .root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },
  #[error("failed to read template {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse template {name}: {source}")]
  Parse {
    name: String,
    #[source]
    source: minijinja::Error,
  },
  #[error("page {key} would replace the base layout it renders through")]
  LayoutShadowed { key: String },
  #[error("{} is not inside {}", .path.display(), .root.display())]
  RelativePath { path: PathBuf, root: PathBuf },
  #[error("invalid template options: {0}")]
  Config(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  Initialization,
  NotFound,
  Validation,
  Render,
}

impl ErrorKind {
  pub fn code(self) -> &'static str {
    match self {
      Self::Initialization => "INITIALIZATION_ERROR",
      Self::NotFound => "NOT_FOUND",
      Self::Validation => "VALIDATION_ERROR",
      Self::Render => "RENDER_ERROR",
    }
  }

  /// HTTP status an adapter should answer with.
  pub fn status(self) -> u16 {
    match self {
      Self::NotFound => 404,
      Self::Initialization | Self::Validation | Self::Render => 500,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
  #[error(transparent)]
  Init(#[from] InitError),
  #[error("couldn't find template: {key}")]
  NotFound { key: String },
  #[error("couldn't validate view model for {key}: {message}")]
  Validation { key: String, message: String },
  #[error("error executing template [{name}]: {source}")]
  Render {
    name: String,
    #[source]
    source: minijinja::Error,
  },
}

impl TemplateError {
  pub fn not_found(key: impl Into<String>) -> Self {
    Self::NotFound { key: key.into() }
  }

  pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation { key: key.into(), message: message.into() }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Init(_) => ErrorKind::Initialization,
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::Validation { .. } => ErrorKind::Validation,
      Self::Render { .. } => ErrorKind::Render,
    }
  }

  pub fn code(&self) -> &'static str {
    self.kind().code()
  }
}
