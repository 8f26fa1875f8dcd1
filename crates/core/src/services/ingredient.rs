//! Ingredient catalog lookups.

use forkful_common::{AppError, AppResult, id};
use forkful_db::{entities::ingredient, repositories::IngredientRepository};

/// Read-only ingredient catalog service.
#[derive(Clone)]
pub struct IngredientService {
    repo: IngredientRepository,
}

impl IngredientService {
    #[must_use]
    pub const fn new(repo: IngredientRepository) -> Self {
        Self { repo }
    }

    /// List ingredients, optionally narrowed to a case-insensitive
    /// name prefix.
    pub async fn list(&self, name_prefix: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        self.repo
            .search_by_name_prefix(name_prefix.unwrap_or_default())
            .await
    }

    /// Look up one ingredient by id.
    pub async fn get(&self, ingredient_id: &str) -> AppResult<ingredient::Model> {
        if !id::is_well_formed(ingredient_id) {
            return Err(AppError::InvalidIdentifier(ingredient_id.to_string()));
        }
        self.repo.get_by_id(ingredient_id).await
    }
}
