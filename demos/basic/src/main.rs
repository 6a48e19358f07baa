/* demos/basic/src/main.rs */

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use temple_server::{Executor, TemplateManager, TemplateOptions, ViewModel};
use temple_server_axum::Routes;

#[derive(Serialize, ViewModel)]
#[allow(non_snake_case)]
struct IndexViewModel {
  Name: String,
}

#[derive(Serialize, ViewModel)]
struct BlogViewModel {
  title: String,
  posts: Vec<Post>,
}

#[derive(Serialize, ViewModel)]
struct Post {
  href: String,
  label: String,
  draft: bool,
}

async fn index(executor: Arc<Executor>, _request: Request) -> Response {
  match executor.render_to_string(&IndexViewModel { Name: "Bob Dobbs".into() }) {
    Ok(html) => (StatusCode::OK, Html(html)).into_response(),
    Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "500 error").into_response(),
  }
}

fn blog(_request: &Request) -> BlogViewModel {
  BlogViewModel {
    title: "Posts".into(),
    posts: vec![
      Post { href: "/blog/hello".into(), label: "Hello".into(), draft: false },
      Post { href: "/blog/next".into(), label: "Next".into(), draft: true },
    ],
  }
}

/// `TEMPLE_CONFIG` points at a TOML file whose relative roots sit next to it;
/// otherwise use the directories next to this crate.
fn options() -> Result<TemplateOptions, temple_server::InitError> {
  match env::var("TEMPLE_CONFIG") {
    Ok(path) => TemplateOptions::from_toml_file(Path::new(&path)),
    Err(_) => {
      let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
      Ok(TemplateOptions::new(root.join("www"), root.join("include")))
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
  let manager = Arc::new(TemplateManager::new(options()?)?);
  eprintln!("Loaded {} pages", manager.store().len());

  Routes::new(manager)
    .executor_route("/", "index.html", &IndexViewModel { Name: String::new() }, index)
    .page("/blog", "blog/index.html", blog)
    .serve(&format!("0.0.0.0:{port}"))
    .await
}
