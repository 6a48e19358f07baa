/* src/server/core/rust-macros/src/view_model.rs */

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Token};

pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
  let name = &input.ident;
  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

  let body = match &input.data {
    Data::Struct(data) => expand_struct(&data.fields, RenameRule::parse(&input.attrs)?)?,
    Data::Enum(data) => expand_enum(data)?,
    Data::Union(_) => {
      return Err(syn::Error::new_spanned(
        &input.ident,
        "ViewModel can only be derived for structs and enums",
      ));
    }
  };

  Ok(quote! {
    impl #impl_generics temple_server::ViewModel for #name #ty_generics #where_clause {
      fn shape() -> temple_server::Shape {
        #body
      }
    }
  })
}

/// Unit-only enums serialize as plain strings.
fn expand_enum(data: &syn::DataEnum) -> syn::Result<TokenStream> {
  for variant in &data.variants {
    if !variant.fields.is_empty() {
      return Err(syn::Error::new_spanned(
        variant,
        "ViewModel enum derive only supports unit variants (no fields)",
      ));
    }
  }
  Ok(quote! { temple_server::Shape::Scalar })
}

fn expand_struct(fields: &Fields, rule: RenameRule) -> syn::Result<TokenStream> {
  let Fields::Named(named) = fields else {
    return Err(syn::Error::new_spanned(fields, "ViewModel requires named fields"));
  };

  let mut inserts = Vec::new();
  let mut flattened = false;
  for field in &named.named {
    let ident = field
      .ident
      .as_ref()
      .ok_or_else(|| syn::Error::new_spanned(field, "ViewModel requires named fields"))?;
    let attrs = SerdeAttrs::parse(&field.attrs)?;
    if attrs.skip {
      continue;
    }
    let ty = &field.ty;

    if attrs.flatten {
      flattened = true;
      inserts.push(quote! {
        if !<#ty as temple_server::ViewModel>::shape().flatten_into(&mut fields) {
          open = true;
        }
      });
      continue;
    }

    let key = attrs.rename.unwrap_or_else(|| rule.apply(&ident.unraw().to_string()));
    // skip_serializing_if may drop the key at render time
    let shape = if attrs.maybe_absent {
      quote! { <#ty as temple_server::ViewModel>::shape().optional() }
    } else {
      quote! { <#ty as temple_server::ViewModel>::shape() }
    };
    inserts.push(quote! {
      fields.insert(#key.to_string(), #shape);
    });
  }

  // a flattened map or other open shape means any key may appear
  if flattened {
    return Ok(quote! {
      let mut fields = ::std::collections::BTreeMap::new();
      let mut open = false;
      #(#inserts)*
      if open { temple_server::Shape::Any } else { temple_server::Shape::Object(fields) }
    });
  }
  Ok(quote! {
    #[allow(unused_mut)]
    let mut fields = ::std::collections::BTreeMap::new();
    #(#inserts)*
    temple_server::Shape::Object(fields)
  })
}

#[derive(Default)]
struct SerdeAttrs {
  rename: Option<String>,
  skip: bool,
  flatten: bool,
  maybe_absent: bool,
}

impl SerdeAttrs {
  fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
    let mut out = Self::default();
    for attr in attrs {
      if !attr.path().is_ident("serde") {
        continue;
      }
      attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("rename") {
          if meta.input.peek(Token![=]) {
            out.rename = Some(meta.value()?.parse::<LitStr>()?.value());
          } else {
            // rename(serialize = "..", deserialize = "..")
            meta.parse_nested_meta(|inner| {
              let lit: LitStr = inner.value()?.parse()?;
              if inner.path.is_ident("serialize") {
                out.rename = Some(lit.value());
              }
              Ok(())
            })?;
          }
        } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
          out.skip = true;
        } else if meta.path.is_ident("flatten") {
          out.flatten = true;
        } else if meta.path.is_ident("skip_serializing_if") {
          out.maybe_absent = true;
          meta.value()?.parse::<LitStr>()?;
        } else if meta.input.peek(Token![=]) {
          meta.value()?.parse::<syn::Expr>()?;
        } else if meta.input.peek(syn::token::Paren) {
          let content;
          syn::parenthesized!(content in meta.input);
          content.parse::<TokenStream>()?;
        }
        Ok(())
      })?;
    }
    Ok(out)
  }
}

/// Container-level `rename_all`, applied to fields without an explicit `rename`.
#[derive(Clone, Copy, Default)]
enum RenameRule {
  #[default]
  None,
  Lower,
  Upper,
  Pascal,
  Camel,
  Snake,
  ScreamingSnake,
  Kebab,
  ScreamingKebab,
}

impl RenameRule {
  fn from_lit(lit: &LitStr) -> syn::Result<Self> {
    Ok(match lit.value().as_str() {
      "lowercase" => Self::Lower,
      "UPPERCASE" => Self::Upper,
      "PascalCase" => Self::Pascal,
      "camelCase" => Self::Camel,
      "snake_case" => Self::Snake,
      "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
      "kebab-case" => Self::Kebab,
      "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
      other => {
        return Err(syn::Error::new_spanned(lit, format!("unknown rename rule `{other}`")));
      }
    })
  }

  fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
    let mut rule = Self::None;
    for attr in attrs {
      if !attr.path().is_ident("serde") {
        continue;
      }
      attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("rename_all") {
          if meta.input.peek(Token![=]) {
            rule = Self::from_lit(&meta.value()?.parse()?)?;
          } else {
            meta.parse_nested_meta(|inner| {
              let lit: LitStr = inner.value()?.parse()?;
              if inner.path.is_ident("serialize") {
                rule = Self::from_lit(&lit)?;
              }
              Ok(())
            })?;
          }
        } else if meta.input.peek(Token![=]) {
          meta.value()?.parse::<syn::Expr>()?;
        } else if meta.input.peek(syn::token::Paren) {
          let content;
          syn::parenthesized!(content in meta.input);
          content.parse::<TokenStream>()?;
        }
        Ok(())
      })?;
    }
    Ok(rule)
  }

  /// Field names are snake_case in Rust, so each rule starts from underscores.
  fn apply(self, field: &str) -> String {
    match self {
      Self::None | Self::Lower | Self::Snake => field.to_string(),
      Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
      Self::Pascal => pascal(field),
      Self::Camel => {
        let pascal = pascal(field);
        let mut chars = pascal.chars();
        match chars.next() {
          Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
          None => pascal,
        }
      }
      Self::Kebab => field.replace('_', "-"),
      Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
    }
  }
}

fn pascal(field: &str) -> String {
  let mut out = String::with_capacity(field.len());
  let mut capitalize = true;
  for ch in field.chars() {
    if ch == '_' {
      capitalize = true;
    } else if capitalize {
      out.push(ch.to_ascii_uppercase());
      capitalize = false;
    } else {
      out.push(ch);
    }
  }
  out
}
