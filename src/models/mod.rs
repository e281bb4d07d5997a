// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Ingredient, Recipe, RecipeIngredient, Coordinates, Store, Location, IngredientLine, MatchResult, Nutrition, StoreMatch, BoundingBox};
pub use requests::{RecommendQuery, RecommendRequest};
pub use responses::{RecommendationResponse, HealthResponse, ErrorResponse};
