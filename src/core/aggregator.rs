use crate::core::locator::LocatedStores;
use crate::error::RecommendError;
use crate::models::{MatchResult, RecommendationResponse};

/// Result-count limits applied to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationLimits {
    pub max_recipes: usize,
    pub max_stores: usize,
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self {
            max_recipes: 10,
            max_stores: 5,
        }
    }
}

/// Assemble the response from ranked recipes and the store lookup outcome
///
/// A failed store lookup does not fail the response: the recipes are kept,
/// `stores` is omitted and the error is reported in `error`/`message`.
pub fn aggregate(
    mut recipes: Vec<MatchResult>,
    stores: Result<LocatedStores, RecommendError>,
    unresolved: Vec<String>,
    limits: &AggregationLimits,
    request_id: String,
) -> RecommendationResponse {
    recipes.truncate(limits.max_recipes);

    let (stores, partial, error, message) = match stores {
        Ok(mut located) => {
            located.stores.truncate(limits.max_stores);
            (Some(located.stores), located.partial, None, None)
        }
        Err(e) => (None, false, Some(e.kind().to_string()), Some(e.to_string())),
    };

    RecommendationResponse {
        recipes,
        stores,
        partial,
        error,
        message,
        unresolved,
        request_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, StoreMatch};
    use std::collections::BTreeSet;

    fn result(name: &str) -> MatchResult {
        MatchResult {
            name: name.to_string(),
            have: BTreeSet::new(),
            missing: BTreeSet::new(),
            score: 0.0,
            ingredients: vec![],
            ..MatchResult::default()
        }
    }

    fn located(count: usize, partial: bool) -> LocatedStores {
        LocatedStores {
            origin: Coordinates::new(0.0, 0.0),
            stores: (0..count)
                .map(|i| StoreMatch {
                    id: i.to_string(),
                    name: format!("Store {}", i),
                    address: String::new(),
                    distance_km: i as f64,
                    carries: None,
                })
                .collect(),
            partial,
        }
    }

    #[test]
    fn test_truncates_to_limits() {
        let recipes = (0..12).map(|i| result(&i.to_string())).collect();
        let response = aggregate(
            recipes,
            Ok(located(8, false)),
            vec![],
            &AggregationLimits::default(),
            "req".into(),
        );

        assert_eq!(response.recipes.len(), 10);
        assert_eq!(response.stores.as_ref().unwrap().len(), 5);
        assert_eq!(response.recipes[0].name, "0");
        assert!(!response.partial);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_partial_flag_carried() {
        let response = aggregate(vec![], Ok(located(1, true)), vec![], &AggregationLimits::default(), "req".into());
        assert!(response.partial);
    }

    #[test]
    fn test_location_error_keeps_recipes() {
        let response = aggregate(
            vec![result("Tomato Rice")],
            Err(RecommendError::LocationResolution("no match for 'Atlantis'".into())),
            vec!["kale".into()],
            &AggregationLimits::default(),
            "req".into(),
        );

        assert_eq!(response.recipes.len(), 1);
        assert!(response.stores.is_none());
        assert_eq!(response.error.as_deref(), Some("LocationResolutionError"));
        assert_eq!(response.unresolved, vec!["kale".to_string()]);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("stores").is_none());
        assert_eq!(json["error"], "LocationResolutionError");
    }
}
