/* src/server/core/rust-macros/src/lib.rs */

mod view_model;

use proc_macro::TokenStream;

/// Derive `temple_server::ViewModel`, describing the fields a template may read.
///
/// Field names follow serde: `#[serde(rename = "...")]` is honoured,
/// `#[serde(skip)]` / `#[serde(skip_serializing)]` fields are left out,
/// `flatten` merges the inner fields and `skip_serializing_if` marks a field optional.
#[proc_macro_derive(ViewModel, attributes(serde))]
pub fn derive_view_model(input: TokenStream) -> TokenStream {
  let input = syn::parse_macro_input!(input as syn::DeriveInput);
  match view_model::expand(input) {
    Ok(tokens) => tokens.into(),
    Err(e) => e.to_compile_error().into(),
  }
}
