//! Tag catalog repository.

use std::sync::Arc;

use crate::entities::{Tag, tag};
use forkful_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Tag catalog repository (read-only reference data).
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List all tags, sorted by name.
    pub async fn find_all(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tag::Model>> {
        Tag::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a tag by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tag::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TagNotFound(id.to_string()))
    }

    /// Find tags by a set of ids.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<tag::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Tag::find()
            .filter(tag::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find tags by a set of slugs. Unknown slugs simply match nothing.
    pub async fn find_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<tag::Model>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        Tag::find()
            .filter(tag::Column::Slug.is_in(slugs.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_tag(id: &str, name: &str, slug: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            color: "#49B64E".to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_tag("tag1", "Breakfast", "breakfast"),
                    create_test_tag("tag2", "Dinner", "dinner"),
                ]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::TagNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_slugs_empty_set_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = TagRepository::new(db);
        assert!(repo.find_by_slugs(&[]).await.unwrap().is_empty());
    }
}
