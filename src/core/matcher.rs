use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::core::{
    catalog::Catalog,
    format::{format_amount, format_duration},
    scoring::{completeness_score, meets_threshold},
};
use crate::models::{IngredientLine, MatchResult, Recipe};

/// Ranks the recipe catalog against a set of owned ingredients
///
/// # Pipeline Stages
/// 1. Count owned vs. required ingredients per recipe
/// 2. Completeness scoring and threshold filter
/// 3. Sort by score (descending), then name (ascending)
/// 4. Lazily build have/missing sets while the caller iterates
#[derive(Debug, Clone)]
pub struct Matcher {
    min_score: f64,
}

impl Matcher {
    pub fn new(min_score: f64) -> Self {
        Self {
            min_score: min_score.clamp(0.0, 1.0),
        }
    }

    /// Rank every recipe in `catalog` for the given owned ingredients
    ///
    /// Each call starts from scratch; the returned iterator holds no state
    /// beyond this call and can simply be requested again.
    pub fn rank<'a>(&self, owned: &'a BTreeSet<String>, catalog: &'a Catalog) -> RankedMatches<'a> {
        let mut order: Vec<(usize, f64)> = catalog
            .recipes()
            .iter()
            .enumerate()
            .filter_map(|(idx, recipe)| {
                let required = recipe.required();
                let have = required.iter().filter(|id| owned.contains(**id)).count();
                let score = completeness_score(have, required.len() - have);

                meets_threshold(score, self.min_score).then_some((idx, score))
            })
            .collect();

        let recipes = catalog.recipes();
        order.sort_by(|(a_idx, a_score), (b_idx, b_score)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| recipes[*a_idx].name.cmp(&recipes[*b_idx].name))
                .then_with(|| a_idx.cmp(b_idx))
        });

        RankedMatches {
            recipes,
            owned,
            order: order.into_iter(),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Recipes in rank order, materialized one at a time
#[derive(Debug)]
pub struct RankedMatches<'a> {
    recipes: &'a [Recipe],
    owned: &'a BTreeSet<String>,
    order: std::vec::IntoIter<(usize, f64)>,
}

impl Iterator for RankedMatches<'_> {
    type Item = MatchResult;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, score) = self.order.next()?;
        Some(build_match(&self.recipes[idx], self.owned, score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl ExactSizeIterator for RankedMatches<'_> {}

fn build_match(recipe: &Recipe, owned: &BTreeSet<String>, score: f64) -> MatchResult {
    let (have, missing): (BTreeSet<&str>, BTreeSet<&str>) =
        recipe.required().into_iter().partition(|id| owned.contains(*id));

    let ingredients = recipe
        .ingredients
        .iter()
        .map(|line| IngredientLine {
            ingredient: line.ingredient.clone(),
            amount: line.quantity.as_deref().map(format_amount),
            owned: owned.contains(&line.ingredient),
        })
        .collect();

    MatchResult {
        name: recipe.name.clone(),
        have: have.into_iter().map(str::to_string).collect(),
        missing: missing.into_iter().map(str::to_string).collect(),
        score,
        ingredients,
        instructions: recipe.instructions.clone(),
        description: recipe.description.clone(),
        url: recipe.url.clone(),
        image: recipe.image.clone(),
        prep_time: recipe.prep_time.as_deref().map(format_duration),
        cook_time: recipe.cook_time.as_deref().map(format_duration),
        total_time: recipe.total_time.as_deref().map(format_duration),
        servings: recipe.servings,
        nutrition: recipe.nutrition.clone().filter(|n| !n.is_empty()),
    }
}
