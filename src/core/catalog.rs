use std::collections::BTreeSet;

use crate::core::normalizer::canonicalize;
use crate::error::RecommendError;
use crate::models::{Ingredient, Recipe};

/// Read-only ingredient and recipe reference data
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it while
/// requests are being served.
#[derive(Debug, Clone)]
pub struct Catalog {
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
}

impl Catalog {
    /// Build a catalog, canonicalizing ingredient ids the way request tokens are
    ///
    /// Recipes without ingredients are dropped. Ingredients referenced by a
    /// recipe but missing from the ingredient list are registered with no
    /// synonyms so they still resolve by their own name.
    pub fn new(ingredients: Vec<Ingredient>, recipes: Vec<Recipe>) -> Result<Self, RecommendError> {
        let mut ingredients: Vec<Ingredient> = ingredients
            .into_iter()
            .map(|i| Ingredient {
                id: canonicalize(&i.id),
                synonyms: i.synonyms,
            })
            .filter(|i| !i.id.is_empty())
            .collect();

        let recipes: Vec<Recipe> = recipes
            .into_iter()
            .filter_map(|mut recipe| {
                for line in &mut recipe.ingredients {
                    line.ingredient = canonicalize(&line.ingredient);
                }
                recipe.ingredients.retain(|line| !line.ingredient.is_empty());

                if recipe.ingredients.is_empty() {
                    tracing::warn!("Dropping recipe '{}' with no ingredients", recipe.name);
                    None
                } else {
                    Some(recipe)
                }
            })
            .collect();

        if recipes.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let known: BTreeSet<String> = ingredients.iter().map(|i| i.id.clone()).collect();
        let referenced: BTreeSet<String> = recipes
            .iter()
            .flat_map(|r| r.ingredients.iter().map(|i| i.ingredient.clone()))
            .filter(|id| !known.contains(id))
            .collect();

        for id in referenced {
            tracing::debug!("Registering ingredient '{}' referenced only by recipes", id);
            ingredients.push(Ingredient { id, synonyms: Vec::new() });
        }

        Ok(Self { ingredients, recipes })
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }
}
