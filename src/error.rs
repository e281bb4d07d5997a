use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors surfaced by the recommendation pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecommendError {
    #[error("Unresolved ingredients: {}", .0.join(", "))]
    UnresolvedIngredient(Vec<String>),

    #[error("Could not resolve location: {0}")]
    LocationResolution(String),

    #[error("Upstream {0} did not answer in time")]
    UpstreamTimeout(String),

    #[error("Recipe catalog is empty")]
    EmptyCatalog,
}

impl RecommendError {
    /// Stable name reported in the `error` field of responses
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::UnresolvedIngredient(_) => "UnresolvedIngredientError",
            RecommendError::LocationResolution(_) => "LocationResolutionError",
            RecommendError::UpstreamTimeout(_) => "UpstreamTimeoutError",
            RecommendError::EmptyCatalog => "EmptyCatalogError",
        }
    }
}

impl ResponseError for RecommendError {
    fn status_code(&self) -> StatusCode {
        match self {
            RecommendError::UnresolvedIngredient(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RecommendError::LocationResolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RecommendError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RecommendError::EmptyCatalog => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let unresolved = match self {
            RecommendError::UnresolvedIngredient(tokens) => tokens.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
            unresolved,
        })
    }
}
