use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::core::catalog::Catalog;
use crate::error::RecommendError;

/// Separators accepted between ingredient tokens
const DELIMITERS: &[char] = &[',', ';', '|', '\n'];

lazy_static! {
    /// Leading quantity and optional unit, e.g. "2", "1 1/2 cups", "3 cloves of"
    static ref AMOUNT_PREFIX: Regex = Regex::new(
        r"^(?:\d+\s+\d+/\d+|\d+/\d+|\d+(?:\.\d+)?|[½⅓⅔¼¾⅛⅜⅝⅞])\s+(?:(?:cups?|tablespoons?|tbsps?|teaspoons?|tsps?|pounds?|lbs?|ounces?|oz|grams?|g|kg|ml|l|liters?|litres?|cloves?|cans?|pinch(?:es)?|dash(?:es)?|slices?|pieces?|handfuls?|bunch(?:es)?|sticks?|packets?|bags?)\.?\s+(?:of\s+)?)?(.+)$"
    )
    .unwrap();
}

/// What to do with tokens that match no known ingredient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// Fail the request
    Strict,
    /// Drop the token and report it back
    #[default]
    Lenient,
}

/// Lookup from any known spelling to its canonical ingredient id
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, String>,
}

impl SynonymTable {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut entries = HashMap::new();

        for ingredient in catalog.ingredients() {
            entries.insert(ingredient.id.clone(), ingredient.id.clone());
        }

        // Canonical ids win over synonyms that collide with them
        for ingredient in catalog.ingredients() {
            for synonym in &ingredient.synonyms {
                let key = canonicalize(synonym);
                if key.is_empty() {
                    continue;
                }
                if let Some(existing) = entries.get(&key) {
                    if existing != &ingredient.id {
                        tracing::warn!(
                            "Synonym '{}' of '{}' already maps to '{}'",
                            key,
                            ingredient.id,
                            existing
                        );
                    }
                    continue;
                }
                entries.insert(key, ingredient.id.clone());
            }
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a cleaned token, trying singular and plural spellings
    pub fn resolve(&self, token: &str) -> Option<&str> {
        if let Some(id) = self.entries.get(token) {
            return Some(id);
        }

        inflections(token)
            .iter()
            .find_map(|candidate| self.entries.get(candidate))
            .map(String::as_str)
    }
}

/// Canonical ingredients parsed from one raw request string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub ingredients: BTreeSet<String>,
    pub unresolved: Vec<String>,
}

/// Turns free text into canonical ingredient ids
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: SynonymTable,
    mode: NormalizationMode,
}

impl Normalizer {
    pub fn new(table: SynonymTable, mode: NormalizationMode) -> Self {
        Self { table, mode }
    }

    /// Split, clean and resolve every token of `raw`
    ///
    /// A token that does not resolve as written is retried without its
    /// leading amount ("2 tomatoes", "1 cup basmati rice"). Unresolved
    /// tokens fail the call in strict mode and are returned in
    /// `Normalized::unresolved` in lenient mode.
    pub fn normalize(&self, raw: &str) -> Result<Normalized, RecommendError> {
        let mut normalized = Normalized::default();

        for token in raw.split(DELIMITERS).map(canonicalize).filter(|t| !t.is_empty()) {
            if let Some(id) = self.table.resolve(&token) {
                normalized.ingredients.insert(id.to_string());
                continue;
            }

            let name = strip_amount(&token).unwrap_or(token.as_str()).to_string();
            match self.table.resolve(&name) {
                Some(id) => {
                    normalized.ingredients.insert(id.to_string());
                }
                None => {
                    if !normalized.unresolved.contains(&name) {
                        normalized.unresolved.push(name);
                    }
                }
            }
        }

        if !normalized.unresolved.is_empty() {
            match self.mode {
                NormalizationMode::Strict => {
                    return Err(RecommendError::UnresolvedIngredient(normalized.unresolved));
                }
                NormalizationMode::Lenient => {
                    tracing::debug!("Dropping unresolved ingredients: {:?}", normalized.unresolved);
                }
            }
        }

        Ok(normalized)
    }
}

/// Lowercase, trim and collapse inner whitespace
///
/// Shared by catalog ids, synonyms, request tokens and store stock so all
/// of them compare equal once cleaned.
pub fn canonicalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ingredient name left after dropping a leading quantity and unit
fn strip_amount(token: &str) -> Option<&str> {
    AMOUNT_PREFIX
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}

/// Singular and plural spellings worth trying for a token
fn inflections(token: &str) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(stem) = token.strip_suffix("ies") {
        out.push(format!("{}y", stem));
    }
    for suffix in ["oes", "ches", "shes", "sses", "xes"] {
        if token.ends_with(suffix) {
            out.push(token[..token.len() - 2].to_string());
        }
    }
    if token.ends_with('s') && !token.ends_with("ss") {
        out.push(token[..token.len() - 1].to_string());
    }

    if !token.ends_with('s') {
        if let Some(stem) = token.strip_suffix('y') {
            out.push(format!("{}ies", stem));
        }
        out.push(format!("{}s", token));
        out.push(format!("{}es", token));
    }

    out
}
