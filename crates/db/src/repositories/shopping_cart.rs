//! Shopping cart relation repository.

use std::sync::Arc;

use crate::entities::{ShoppingCartRecipe, shopping_cart_recipe};
use crate::repositories::map_unique_violation;
use forkful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

/// Shopping cart relation repository for database operations.
#[derive(Clone)]
pub struct ShoppingCartRepository {
    db: Arc<DatabaseConnection>,
}

impl ShoppingCartRepository {
    /// Create a new shopping cart repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether the (user, recipe) link exists.
    pub async fn exists(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_recipe(user_id, recipe_id)
            .await?
            .is_some())
    }

    /// Find a cart link by user and recipe.
    pub async fn find_by_user_and_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<shopping_cart_recipe::Model>> {
        ShoppingCartRecipe::find()
            .filter(shopping_cart_recipe::Column::UserId.eq(user_id))
            .filter(shopping_cart_recipe::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new cart link, mapping a lost unique-index race to
    /// `AlreadyExists`.
    pub async fn create(
        &self,
        model: shopping_cart_recipe::ActiveModel,
    ) -> AppResult<shopping_cart_recipe::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation("shopping cart", e))
    }

    /// Delete the (user, recipe) link, returning the number of rows removed.
    pub async fn delete(&self, user_id: &str, recipe_id: &str) -> AppResult<u64> {
        let result = ShoppingCartRecipe::delete_many()
            .filter(shopping_cart_recipe::Column::UserId.eq(user_id))
            .filter(shopping_cart_recipe::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// All recipe ids currently in a user's cart.
    pub async fn recipe_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        ShoppingCartRecipe::find()
            .select_only()
            .column(shopping_cart_recipe::Column::RecipeId)
            .filter(shopping_cart_recipe::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recipe ids in the user's cart, restricted to a candidate set.
    pub async fn recipe_ids_for_user_among(
        &self,
        user_id: &str,
        recipe_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        ShoppingCartRecipe::find()
            .select_only()
            .column(shopping_cart_recipe::Column::RecipeId)
            .filter(shopping_cart_recipe::Column::UserId.eq(user_id))
            .filter(shopping_cart_recipe::Column::RecipeId.is_in(recipe_ids.iter().cloned()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn link(id: &str, user_id: &str, recipe_id: &str) -> shopping_cart_recipe::Model {
        shopping_cart_recipe::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_exists() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[link("cart1", "user1", "recipe1")]])
                .append_query_results([Vec::<shopping_cart_recipe::Model>::new()])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        assert!(repo.exists("user1", "recipe1").await.unwrap());
        assert!(!repo.exists("user1", "recipe2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_reports_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        assert_eq!(repo.delete("user1", "recipe1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recipe_ids_for_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    BTreeMap::from([("recipe_id", sea_orm::Value::from("recipe1"))]),
                    BTreeMap::from([("recipe_id", sea_orm::Value::from("recipe2"))]),
                ]])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        let ids = repo.recipe_ids_for_user("user1").await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
