/* src/server/core/rust/src/lib.rs */

//! Discover page templates on disk, compose them with shared includes and an
//! optional base layout, and hand out executors that render only after the
//! view model has been checked against the fields each template reads.

pub mod errors;
pub mod executor;
pub mod includes;
pub mod manager;
pub mod options;
pub mod pages;
pub mod shape;
pub mod store;
pub mod validate;

mod source;

// Re-exports for ergonomic use
pub use errors::{ErrorKind, InitError, TemplateError};
pub use executor::Executor;
pub use includes::{BASE_LAYOUT, IncludeSet, PAGE_GLOBAL};
pub use manager::TemplateManager;
pub use minijinja;
pub use options::TemplateOptions;
pub use pages::PageTemplate;
pub use shape::Shape;
pub use store::TemplateStore;
pub use temple_macros::ViewModel;
pub use validate::{FieldPathValidator, Mismatch, Validator};

/// Trait for types that can describe the fields they expose to templates.
/// Derive with `#[derive(ViewModel)]` or implement manually.
pub trait ViewModel {
  fn shape() -> Shape;
}

// -- Primitive ViewModel impls --

macro_rules! impl_view_model_scalar {
  ($($rust_ty:ty),* $(,)?) => {
    $(
      impl ViewModel for $rust_ty {
        fn shape() -> Shape {
          Shape::Scalar
        }
      }
    )*
  };
}

impl_view_model_scalar!(
  String, str, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl ViewModel for () {
  fn shape() -> Shape {
    Shape::Null
  }
}

impl ViewModel for serde_json::Value {
  fn shape() -> Shape {
    Shape::Any
  }
}

impl<T: ViewModel> ViewModel for Option<T> {
  fn shape() -> Shape {
    T::shape().optional()
  }
}

impl<T: ViewModel> ViewModel for Vec<T> {
  fn shape() -> Shape {
    Shape::List(Box::new(T::shape()))
  }
}

impl<T: ViewModel> ViewModel for [T] {
  fn shape() -> Shape {
    Shape::List(Box::new(T::shape()))
  }
}

impl<T: ViewModel + ?Sized> ViewModel for &T {
  fn shape() -> Shape {
    T::shape()
  }
}

impl<T: ViewModel + ?Sized> ViewModel for Box<T> {
  fn shape() -> Shape {
    T::shape()
  }
}

impl<T: ViewModel + ?Sized> ViewModel for std::sync::Arc<T> {
  fn shape() -> Shape {
    T::shape()
  }
}

impl<T: ViewModel> ViewModel for std::collections::HashMap<String, T> {
  fn shape() -> Shape {
    Shape::Map(Box::new(T::shape()))
  }
}

impl<T: ViewModel> ViewModel for std::collections::BTreeMap<String, T> {
  fn shape() -> Shape {
    Shape::Map(Box::new(T::shape()))
  }
}

#[cfg(test)]
extern crate self as temple_server;
