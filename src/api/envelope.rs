//! Response envelope normalization.
//!
//! The backend wraps payloads inconsistently across endpoints:
//! `{"data": {"content": [...]}}`, `{"content": [...]}`, or a bare array for
//! lists; `{"data": {...}}` or a bare object for single records. All of the
//! unwrapping lives here so call sites decode exactly once, and a shape that
//! matches nothing degrades to empty rather than erroring.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Decode a list payload, trying the known envelope shapes in priority order:
/// nested-wrapped, flat-wrapped, then bare array.
pub fn decode_list<T: DeserializeOwned>(value: &Value) -> Vec<T> {
  let candidates = [
    value.pointer("/data/content"),
    value.pointer("/content"),
    Some(value),
  ];

  for candidate in candidates.into_iter().flatten() {
    if !candidate.is_array() {
      continue;
    }
    match serde_json::from_value(candidate.clone()) {
      Ok(items) => return items,
      Err(e) => debug!("list payload did not match expected item shape: {e}"),
    }
  }

  Vec::new()
}

/// Decode a single-record payload: `{"data": {...}}` or a bare object.
pub fn decode_item<T: DeserializeOwned>(value: &Value) -> Option<T> {
  let candidates = [value.pointer("/data"), Some(value)];

  for candidate in candidates.into_iter().flatten() {
    if !candidate.is_object() {
      continue;
    }
    match serde_json::from_value(candidate.clone()) {
      Ok(item) => return Some(item),
      Err(e) => debug!("record payload did not match expected shape: {e}"),
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Collection, RecipeSummary};
  use serde_json::json;

  fn summary(id: &str) -> Value {
    json!({"id": id, "title": format!("Recipe {id}"), "likeCount": 3})
  }

  #[test]
  fn decodes_nested_wrapped_lists() {
    let value = json!({"data": {"content": [summary("a"), summary("b")]}});
    let items: Vec<RecipeSummary> = decode_list(&value);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "a");
  }

  #[test]
  fn decodes_flat_wrapped_lists() {
    let value = json!({"content": [summary("a")]});
    let items: Vec<RecipeSummary> = decode_list(&value);
    assert_eq!(items.len(), 1);
  }

  #[test]
  fn decodes_bare_arrays() {
    let value = json!([summary("a"), summary("b"), summary("c")]);
    let items: Vec<RecipeSummary> = decode_list(&value);
    assert_eq!(items.len(), 3);
  }

  #[test]
  fn nested_shape_wins_over_bare_interpretation() {
    // Both /data/content and /content present; nested is tried first
    let value = json!({
      "data": {"content": [summary("nested")]},
      "content": [summary("flat")]
    });
    let items: Vec<RecipeSummary> = decode_list(&value);
    assert_eq!(items[0].id, "nested");
  }

  #[test]
  fn unrecognized_shapes_degrade_to_empty() {
    let items: Vec<RecipeSummary> = decode_list(&json!({"weird": true}));
    assert!(items.is_empty());

    let items: Vec<RecipeSummary> = decode_list(&json!("just a string"));
    assert!(items.is_empty());
  }

  #[test]
  fn item_arrays_with_wrong_shape_degrade_to_empty() {
    let items: Vec<RecipeSummary> = decode_list(&json!([{"noId": 1}]));
    assert!(items.is_empty());
  }

  #[test]
  fn decodes_wrapped_and_bare_records() {
    let record = json!({"id": "c1", "name": "Weeknight dinners"});

    let wrapped: Option<Collection> = decode_item(&json!({"data": record}));
    assert_eq!(wrapped.unwrap().name, "Weeknight dinners");

    let bare: Option<Collection> = decode_item(&record);
    assert_eq!(bare.unwrap().id, "c1");

    let none: Option<Collection> = decode_item(&json!([1, 2]));
    assert!(none.is_none());
  }
}
