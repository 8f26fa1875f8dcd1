//! Recipe repository.
//!
//! Owns the recipe row together with its join rows (ingredients, tags).
//! Multi-row writes run inside a single transaction: a recipe is never
//! observable with a half-written ingredient list.

use std::sync::Arc;

use crate::entities::{
    Ingredient, Recipe, RecipeIngredient, RecipeTag, ingredient, recipe, recipe_ingredient,
    recipe_tag, tag,
};
use forkful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

/// Filter for recipe listings. `id_in: Some(..)` restricts the listing to
/// an allow-set computed from relation tables; the set is already
/// deduplicated by the caller.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only recipes by this author.
    pub author_id: Option<String>,
    /// Only recipes whose id is in this set.
    pub id_in: Option<Vec<String>>,
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a recipe by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// List recipes matching the filter (newest first, paginated).
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find();
        if let Some(author_id) = &filter.author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }
        if let Some(ids) = &filter.id_in {
            query = query.filter(recipe::Column::Id.is_in(ids.iter().cloned()));
        }
        query
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .offset(page.saturating_sub(1).saturating_mul(limit))
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes matching the filter.
    pub async fn count(&self, filter: &RecipeFilter) -> AppResult<u64> {
        let mut query = Recipe::find();
        if let Some(author_id) = &filter.author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }
        if let Some(ids) = &filter.id_in {
            query = query.filter(recipe::Column::Id.is_in(ids.iter().cloned()));
        }
        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recipes by an author, newest first, optionally truncated.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::CreatedAt);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a recipe and its join rows in one transaction.
    pub async fn create_with_components(
        &self,
        recipe: recipe::ActiveModel,
        ingredients: Vec<recipe_ingredient::ActiveModel>,
        tags: Vec<recipe_tag::ActiveModel>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = recipe
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        RecipeIngredient::insert_many(ingredients)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if !tags.is_empty() {
            RecipeTag::insert_many(tags)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(model)
    }

    /// Update a recipe, replacing all of its join rows, in one transaction.
    ///
    /// The ingredient set has no identity across updates: existing join
    /// rows are dropped wholesale and the new set is bulk-inserted.
    pub async fn update_with_components(
        &self,
        recipe: recipe::ActiveModel,
        recipe_id: &str,
        ingredients: Vec<recipe_ingredient::ActiveModel>,
        tags: Vec<recipe_tag::ActiveModel>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = recipe
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        RecipeIngredient::insert_many(ingredients)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if !tags.is_empty() {
            RecipeTag::insert_many(tags)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(model)
    }

    /// Delete a recipe. Join rows and relation rows go with it via
    /// foreign-key cascade.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// (join row, ingredient) pairs for a set of recipes.
    pub async fn ingredients_for_recipes(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<Vec<(recipe_ingredient::Model, Option<ingredient::Model>)>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        RecipeIngredient::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().cloned()))
            .find_also_related(Ingredient)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// (join row, tag) pairs for a set of recipes.
    pub async fn tags_for_recipes(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<Vec<(recipe_tag::Model, Option<tag::Model>)>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        RecipeTag::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().cloned()))
            .find_also_related(crate::entities::Tag)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recipe ids carrying any of the given tags.
    ///
    /// A recipe with two matching tags produces two join rows; the result
    /// is deduplicated here so callers never see a fan-out.
    pub async fn recipe_ids_with_tags(&self, tag_ids: &[String]) -> AppResult<Vec<String>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = RecipeTag::find()
            .select_only()
            .column(recipe_tag::Column::RecipeId)
            .filter(recipe_tag::Column::TagId.is_in(tag_ids.iter().cloned()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_recipe(id: &str, author_id: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: "Pancakes".to_string(),
            image: "media/pancakes.png".to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time: 20,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_returns_page() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_recipe("recipe2", "user1"),
                    create_test_recipe("recipe1", "user1"),
                ]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let filter = RecipeFilter {
            author_id: Some("user1".to_string()),
            id_in: None,
        };
        let recipes = repo.list(&filter, 1, 6).await.unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_recipe_set_short_circuits() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = RecipeRepository::new(db);
        assert!(repo.ingredients_for_recipes(&[]).await.unwrap().is_empty());
        assert!(repo.tags_for_recipes(&[]).await.unwrap().is_empty());
        assert!(repo.recipe_ids_with_tags(&[]).await.unwrap().is_empty());
    }
}
