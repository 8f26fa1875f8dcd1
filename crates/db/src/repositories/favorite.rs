//! Favorite relation repository.

use std::sync::Arc;

use crate::entities::{FavoriteRecipe, favorite_recipe};
use crate::repositories::map_unique_violation;
use forkful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

/// Favorite relation repository for database operations.
#[derive(Clone)]
pub struct FavoriteRepository {
    db: Arc<DatabaseConnection>,
}

impl FavoriteRepository {
    /// Create a new favorite repository.
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

    /// Find a favorite link by user and recipe.
    pub async fn find_by_user_and_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<favorite_recipe::Model>> {
        FavoriteRecipe::find()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new favorite link.
    ///
    /// A unique-index violation (lost race against a concurrent create)
    /// is reported as `AlreadyExists`.
    pub async fn create(
        &self,
        model: favorite_recipe::ActiveModel,
    ) -> AppResult<favorite_recipe::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation("favorite", e))
    }

    /// Delete the (user, recipe) link. Returns the number of rows removed
    /// so the caller can distinguish "nothing to remove".
    pub async fn delete(&self, user_id: &str, recipe_id: &str) -> AppResult<u64> {
        let result = FavoriteRecipe::delete_many()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Recipe ids favorited by a user.
    pub async fn recipe_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        FavoriteRecipe::find()
            .select_only()
            .column(favorite_recipe::Column::RecipeId)
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recipe ids favorited by a user, restricted to a candidate set.
    ///
    /// Used to flag one listing page with a single query.
    pub async fn recipe_ids_for_user_among(
        &self,
        user_id: &str,
        recipe_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        FavoriteRecipe::find()
            .select_only()
            .column(favorite_recipe::Column::RecipeId)
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.is_in(recipe_ids.iter().cloned()))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn link(id: &str, user_id: &str, recipe_id: &str) -> favorite_recipe::Model {
        favorite_recipe::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_exists_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[link("fav1", "user1", "recipe1")]])
                .into_connection(),
        );

        let repo = FavoriteRepository::new(db);
        assert!(repo.exists("user1", "recipe1").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<favorite_recipe::Model>::new()])
                .into_connection(),
        );

        let repo = FavoriteRepository::new(db);
        assert!(!repo.exists("user1", "recipe1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FavoriteRepository::new(db);
        assert_eq!(repo.delete("user1", "recipe1").await.unwrap(), 1);
        assert_eq!(repo.delete("user1", "recipe1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recipe_ids_for_user_among_empty_set_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = FavoriteRepository::new(db);
        let ids = repo.recipe_ids_for_user_among("user1", &[]).await.unwrap();
        assert!(ids.is_empty());
    }
}
