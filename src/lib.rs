//! Pantry Match - recipe recommendations from what is already in the pantry
//!
//! Matches a free-text ingredient list against a recipe catalog, ranks recipes
//! by how complete they are, and points at nearby stores for the missing items.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Catalog, Matcher, Normalizer, Recommender, StoreLocator, distance::haversine_distance};
pub use crate::error::RecommendError;
pub use crate::models::{MatchResult, RecommendationResponse, StoreMatch, Location, Coordinates};
