use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical ingredient with the free-text names that resolve to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// One required ingredient of a recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub ingredient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// Per-serving nutrition facts, as published with the recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<String>,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.calories.is_none() && self.protein.is_none() && self.carbohydrates.is_none() && self.fat.is_none()
    }
}

/// Recipe reference data
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "prepTime", alias = "prep_time", default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(rename = "cookTime", alias = "cook_time", default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(rename = "totalTime", alias = "total_time", default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

impl Recipe {
    /// Distinct required ingredient identifiers
    pub fn required(&self) -> BTreeSet<&str> {
        self.ingredients.iter().map(|i| i.ingredient.as_str()).collect()
    }
}

/// Point on the globe in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Grocery store as published by the store directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Ingredient ids the store is known to stock; `None` means unknown
    #[serde(default)]
    pub stock: Option<BTreeSet<String>>,
}

impl Store {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }
}

/// Where the caller is: either explicit coordinates or text to geocode
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates(Coordinates),
    Address(String),
}

impl Location {
    /// Parse `"lat,lon"` as coordinates, anything else as an address
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some((lat, lon)) = trimmed.split_once(',') {
            if let (Ok(latitude), Ok(longitude)) =
                (lat.trim().parse::<f64>(), lon.trim().parse::<f64>())
            {
                let coords = Coordinates { latitude, longitude };
                if coords.is_valid() {
                    return Location::Coordinates(coords);
                }
            }
        }
        Location::Address(trimmed.to_string())
    }
}

/// Display line of a matched recipe's ingredient list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientLine {
    pub ingredient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub owned: bool,
}

/// Scored recipe for one request, with its display details
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub name: String,
    pub have: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub score: f64,
    pub ingredients: Vec<IngredientLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "prepTime", default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(rename = "cookTime", default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(rename = "totalTime", default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

/// Store ranked by distance from the request location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreMatch {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    /// Needed ingredients the store stocks; `None` when its stock is unknown
    pub carries: Option<Vec<String>>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
