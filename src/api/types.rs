//! Serde-deserializable domain types matching the recipe backend's payloads.

use serde::{Deserialize, Serialize};

/// A user-curated collection of recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub cover_image: Option<String>,
  #[serde(default)]
  pub recipe_count: u32,
}

/// Summary of a recipe for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub like_count: u32,
}

/// Full recipe details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub ingredients: Vec<String>,
  #[serde(default)]
  pub steps: Vec<String>,
  #[serde(default)]
  pub servings: Option<u32>,
  #[serde(default)]
  pub prep_minutes: Option<u32>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub like_count: u32,
}
