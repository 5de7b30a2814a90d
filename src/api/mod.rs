//! Recipe-domain binding of the generic cache layer.

pub mod envelope;
pub mod loaders;
pub mod types;

pub use loaders::{CachedRecipeApi, Loaded};
