//! Ingredient catalog repository.

use std::sync::Arc;

use crate::entities::{Ingredient, ingredient};
use forkful_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Ingredient catalog repository (read-only reference data).
#[derive(Clone)]
pub struct IngredientRepository {
    db: Arc<DatabaseConnection>,
}

impl IngredientRepository {
    /// Create a new ingredient repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an ingredient by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ingredient::Model>> {
        Ingredient::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an ingredient by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ingredient::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::IngredientNotFound(id.to_string()))
    }

    /// Find ingredients by a set of ids.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<ingredient::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ingredient::find()
            .filter(ingredient::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Case-insensitive "starts with" search by name, sorted by name.
    ///
    /// An empty prefix lists the whole catalog.
    pub async fn search_by_name_prefix(&self, prefix: &str) -> AppResult<Vec<ingredient::Model>> {
        let mut query = Ingredient::find();
        if !prefix.is_empty() {
            let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            query = query.filter(
                Condition::all()
                    .add(Expr::col(ingredient::Column::Name).ilike(format!("{escaped}%"))),
            );
        }
        query
            .order_by_asc(ingredient::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_ingredient(id: &str, name: &str, unit: &str) -> ingredient::Model {
        ingredient::Model {
            id: id.to_string(),
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ingredient::Model>::new()])
                .into_connection(),
        );

        let repo = IngredientRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::IngredientNotFound(_))));
    }

    #[tokio::test]
    async fn test_search_by_name_prefix() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_ingredient("ing1", "flour", "g"),
                    create_test_ingredient("ing2", "flour, whole grain", "g"),
                ]])
                .into_connection(),
        );

        let repo = IngredientRepository::new(db);
        let found = repo.search_by_name_prefix("flo").await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_set_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = IngredientRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
