/* src/server/core/rust/src/shape.rs */

use std::collections::BTreeMap;

use serde::Serialize;

/// Structural description of a view model: which fields exist and which may be absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
  /// Unknown structure; every path below it is accepted.
  Any,
  /// A value that is `none` in the example.
  Null,
  /// String, number, bool or unit enum.
  Scalar,
  List(Box<Shape>),
  /// String-keyed map with dynamic keys.
  Map(Box<Shape>),
  Optional(Box<Shape>),
  Object(BTreeMap<String, Shape>),
}

impl Shape {
  /// Describe a representative example value.
  pub fn of<T: Serialize + ?Sized>(example: &T) -> Result<Self, serde_json::Error> {
    Ok(Self::from_json(&serde_json::to_value(example)?))
  }

  pub fn from_json(value: &serde_json::Value) -> Self {
    match value {
      serde_json::Value::Null => Self::Null,
      serde_json::Value::Bool(_) | serde_json::Value::Number(_) | serde_json::Value::String(_) => {
        Self::Scalar
      }
      serde_json::Value::Array(items) => {
        Self::List(Box::new(items.first().map_or(Self::Any, Self::from_json)))
      }
      serde_json::Value::Object(map) => {
        Self::Object(map.iter().map(|(k, v)| (k.clone(), Self::from_json(v))).collect())
      }
    }
  }

  pub fn optional(self) -> Self {
    match self {
      Self::Optional(_) => self,
      other => Self::Optional(Box::new(other)),
    }
  }

  /// Merge this shape's fields into a parent object the way `#[serde(flatten)]`
  /// does. An optional object contributes optional fields. Returns `false` when
  /// the flattened keys cannot be known statically (a map, say).
  pub fn flatten_into(self, fields: &mut BTreeMap<String, Shape>) -> bool {
    match self {
      Self::Object(inner) => {
        fields.extend(inner);
        true
      }
      Self::Optional(inner) => match *inner {
        Self::Object(inner) => {
          fields.extend(inner.into_iter().map(|(name, shape)| (name, shape.optional())));
          true
        }
        other => other.flatten_into(fields),
      },
      Self::Null => true,
      Self::Any | Self::Scalar | Self::List(_) | Self::Map(_) => false,
    }
  }

  /// Field names at the top level, if this shape is an object.
  pub fn fields(&self) -> Option<impl Iterator<Item = &str>> {
    match self {
      Self::Object(fields) => Some(fields.keys().map(String::as_str)),
      _ => None,
    }
  }

  /// Check that a dotted field path (`user.name`) can be read from this shape.
  /// On failure returns a human-readable reason.
  pub fn check_path(&self, path: &str) -> Result<(), String> {
    let mut current = self;
    let mut walked = String::new();
    let mut segments = path.split('.').peekable();

    while let Some(&segment) = segments.peek() {
      match current {
        // an optional layer does not consume a segment
        Self::Optional(inner) => {
          current = inner.as_ref();
          continue;
        }
        Self::Object(fields) => match fields.get(segment) {
          Some(next) => current = next,
          None if walked.is_empty() => return Err(format!("missing field `{segment}`")),
          None => return Err(format!("`{walked}` has no field `{segment}`")),
        },
        Self::Any | Self::List(_) | Self::Map(_) => return Ok(()),
        Self::Null => return Err(format!("{} is none, cannot read `{segment}`", describe(&walked))),
        Self::Scalar => {
          return Err(format!("{} is a plain value, cannot read `{segment}`", describe(&walked)));
        }
      }
      if !walked.is_empty() {
        walked.push('.');
      }
      walked.push_str(segment);
      segments.next();
    }
    Ok(())
  }
}

fn describe(walked: &str) -> String {
  if walked.is_empty() { "the view model".to_string() } else { format!("`{walked}`") }
}
