use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Location;

/// Query string of `GET /recommend`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendQuery {
    #[validate(length(min = 1, message = "ingredients must not be empty"))]
    #[serde(default)]
    pub ingredients: String,
    #[validate(length(min = 1, message = "location must not be empty"))]
    #[serde(default)]
    pub location: String,
}

impl RecommendQuery {
    /// Trim both parameters and validate them into a typed request
    pub fn into_request(self) -> Result<RecommendRequest, validator::ValidationErrors> {
        let trimmed = RecommendQuery {
            ingredients: self.ingredients.trim().to_string(),
            location: self.location.trim().to_string(),
        };
        trimmed.validate()?;

        Ok(RecommendRequest {
            location: Location::parse(&trimmed.location),
            ingredients: trimmed.ingredients,
        })
    }
}

/// Validated recommendation request handed to the core
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub ingredients: String,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_parameters_rejected() {
        let query = RecommendQuery {
            ingredients: "   ".to_string(),
            location: "Tempe".to_string(),
        };
        let errors = query.into_request().unwrap_err();
        assert!(errors.to_string().contains("ingredients"));

        let query = RecommendQuery {
            ingredients: "rice".to_string(),
            location: String::new(),
        };
        let errors = query.into_request().unwrap_err();
        assert!(errors.to_string().contains("location"));
    }

    #[test]
    fn test_valid_query() {
        let query = RecommendQuery {
            ingredients: " tomato, rice ".to_string(),
            location: "33.42,-111.93".to_string(),
        };
        let request = query.into_request().unwrap();
        assert_eq!(request.ingredients, "tomato, rice");
        assert!(matches!(request.location, Location::Coordinates(_)));
    }
}
