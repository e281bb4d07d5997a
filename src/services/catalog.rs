use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::Catalog;
use crate::error::RecommendError;
use crate::models::{Ingredient, Recipe};

/// Errors that can occur while loading the recipe catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Invalid(#[from] RecommendError),
}

/// Read interface of the ingredient database
#[async_trait]
pub trait IngredientDatabase: Send + Sync {
    async fn load_catalog(&self) -> Result<Catalog, CatalogError>;
}

/// Catalog stored as a TOML file of `[[ingredients]]` and `[[recipes]]`
pub struct FileCatalog {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    ingredients: Vec<Ingredient>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(contents: &str) -> Result<Catalog, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        Ok(Catalog::new(file.ingredients, file.recipes)?)
    }
}

#[async_trait]
impl IngredientDatabase for FileCatalog {
    async fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        tracing::info!("Loading recipe catalog from {}", self.path.display());
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Self::parse(&contents)
    }
}
