use crate::domain::recipe::{Recipe, RecipesFile};
use crate::error::{PlannerError, PlannerResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CATALOG_SCHEMA: &str = include_str!("../schema/recipes.schema.json");

/// Supplies the full recipe catalog, all or nothing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_catalog(&self) -> PlannerResult<Vec<Recipe>>;
}

/// Reads a catalog file shaped like `{ "recipes": [...] }`.
///
/// `.yaml` and `.yml` files are parsed as YAML, everything else as JSON. Both
/// go through the same schema and consistency checks before any recipe is
/// returned.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    pub path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn load_catalog(&self) -> PlannerResult<Vec<Recipe>> {
        debug!("Reading recipe catalog from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PlannerError::Load(format!("{}: {}", self.path.display(), e)))?;
        let recipes = parse_catalog(&content, is_yaml(&self.path))?;
        info!("Loaded {} recipes from {}", recipes.len(), self.path.display());
        Ok(recipes)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Parses and validates catalog text.
pub fn parse_catalog(content: &str, yaml: bool) -> PlannerResult<Vec<Recipe>> {
    let document: Value = if yaml {
        serde_yaml::from_str(content).map_err(|e| PlannerError::Load(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| PlannerError::Load(e.to_string()))?
    };

    validate_schema(&document)?;

    let file: RecipesFile =
        serde_json::from_value(document).map_err(|e| PlannerError::Load(e.to_string()))?;
    validate_recipes(&file.recipes)?;
    Ok(file.recipes)
}

fn validate_schema(document: &Value) -> PlannerResult<()> {
    let schema: Value = serde_json::from_str(CATALOG_SCHEMA)
        .map_err(|e| PlannerError::Load(format!("catalog schema is invalid: {}", e)))?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| PlannerError::Load(format!("failed to compile catalog schema: {}", e)))?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();
    if !errors.is_empty() {
        return Err(PlannerError::Load(format!(
            "catalog does not match schema: {}",
            errors.join(", ")
        )));
    }
    Ok(())
}

fn validate_recipes(recipes: &[Recipe]) -> PlannerResult<()> {
    let mut seen = HashSet::new();
    for recipe in recipes {
        if recipe.id.trim().is_empty() {
            return Err(PlannerError::Load(format!(
                "recipe '{}' has an empty id",
                recipe.name
            )));
        }
        if !seen.insert(recipe.id.as_str()) {
            return Err(PlannerError::Load(format!("duplicate recipe id '{}'", recipe.id)));
        }
        if recipe.servings == 0 {
            return Err(PlannerError::Load(format!(
                "recipe '{}' must serve at least one person",
                recipe.id
            )));
        }
        if let Some(bad) = recipe
            .ingredients
            .iter()
            .find(|i| !i.quantity.is_finite() || i.quantity < 0.0)
        {
            return Err(PlannerError::Load(format!(
                "recipe '{}': ingredient '{}' has invalid quantity {}",
                recipe.id, bad.name, bad.quantity
            )));
        }
    }
    Ok(())
}

/// Serves a fixed list of recipes.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    recipes: Vec<Recipe>,
}

impl StaticCatalogSource {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn load_catalog(&self) -> PlannerResult<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }
}

// Exposed for integration testing
pub mod mocks {
    use super::*;

    /// A source whose fetch always fails with the given message.
    #[derive(Debug, Clone)]
    pub struct FailingCatalogSource {
        pub message: String,
    }

    impl FailingCatalogSource {
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for FailingCatalogSource {
        async fn load_catalog(&self) -> PlannerResult<Vec<Recipe>> {
            Err(PlannerError::Load(self.message.clone()))
        }
    }
}
