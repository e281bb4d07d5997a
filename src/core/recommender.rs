use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::{
    aggregator::{aggregate, AggregationLimits},
    catalog::Catalog,
    locator::StoreLocator,
    matcher::Matcher,
    normalizer::{NormalizationMode, Normalizer, SynonymTable},
};
use crate::error::RecommendError;
use crate::models::{MatchResult, RecommendRequest, RecommendationResponse};

/// Runs one request through normalizer, matcher, locator and aggregator
///
/// Holds only read-only state, so one instance serves every request.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    normalizer: Normalizer,
    matcher: Matcher,
    locator: StoreLocator,
    limits: AggregationLimits,
}

impl Recommender {
    pub fn new(
        catalog: Arc<Catalog>,
        mode: NormalizationMode,
        matcher: Matcher,
        locator: StoreLocator,
        limits: AggregationLimits,
    ) -> Self {
        let table = SynonymTable::from_catalog(&catalog);
        tracing::info!(
            "Recommender ready: {} recipes, {} known spellings, {:?} normalization",
            catalog.recipes().len(),
            table.len(),
            mode
        );

        Self {
            catalog,
            normalizer: Normalizer::new(table.clone(), mode),
            matcher,
            locator: locator.with_synonyms(table),
            limits,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn locator(&self) -> &StoreLocator {
        &self.locator
    }

    /// Produce recommendations for one validated request
    ///
    /// Only strict-mode normalization failures are returned as `Err`; store
    /// lookup failures are reported inside the response next to the recipes.
    pub async fn recommend(
        &self,
        request: &RecommendRequest,
    ) -> Result<RecommendationResponse, RecommendError> {
        let normalized = self.normalizer.normalize(&request.ingredients)?;

        let recipes: Vec<MatchResult> = self
            .matcher
            .rank(&normalized.ingredients, &self.catalog)
            .take(self.limits.max_recipes)
            .collect();

        let needed: BTreeSet<String> = recipes
            .iter()
            .flat_map(|m| m.missing.iter().cloned())
            .collect();

        tracing::debug!(
            "Matched {} recipes from {} owned ingredients, {} ingredients to source",
            recipes.len(),
            normalized.ingredients.len(),
            needed.len()
        );

        let stores = self.locator.locate(&request.location, &needed).await;
        if let Err(e) = &stores {
            tracing::warn!("Store lookup failed: {}", e);
        }

        Ok(aggregate(
            recipes,
            stores,
            normalized.unresolved,
            &self.limits,
            uuid::Uuid::new_v4().to_string(),
        ))
    }
}
