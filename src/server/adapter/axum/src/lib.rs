/* src/server/adapter/axum/src/lib.rs */

//! Serve validated page templates from an axum router.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use temple_server_axum::Routes;
//! use temple_server_axum::temple_server::{TemplateManager, TemplateOptions, ViewModel};
//!
//! #[derive(serde::Serialize, ViewModel)]
//! struct Index {
//!   name: String,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(TemplateManager::new(TemplateOptions::new("www", "include"))?);
//! Routes::new(manager)
//!   .page("/", "index.html", |_req| Index { name: "Bob Dobbs".into() })
//!   .serve("0.0.0.0:3000")
//!   .await
//! # }
//! ```

mod error;
mod routes;

pub use error::{RenderFailure, RouteError, StartupError};
pub use routes::Routes;

/// Re-export temple-server core for convenience
pub use temple_server;
