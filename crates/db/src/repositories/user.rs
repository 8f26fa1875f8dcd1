//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use crate::repositories::map_unique_violation;
use forkful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, failing if they do not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by a set of ids.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by access token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List users (paginated, registration order).
    pub async fn list(&self, page: u64, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::Id)
            .offset(page.saturating_sub(1).saturating_mul(limit))
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user. Duplicate email or username (including a lost
    /// race against a concurrent registration) surfaces as `AlreadyExists`.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation("email or username", e))
    }

    /// Apply a partial update to a user row.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the user's access token.
    pub async fn set_token(&self, user_id: &str, token: &str) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            token: Set(Some(token.to_string())),
            ..Default::default()
        };
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Clear the user's access token.
    pub async fn clear_token(&self, user_id: &str) -> AppResult<()> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            token: Set(None),
            ..Default::default()
        };
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let mut u = create_test_user("user1", "alice");
        u.token = Some("token123".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[u]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("token123").await.unwrap();
        assert_eq!(found.unwrap().id, "user1");
    }

    #[tokio::test]
    async fn test_list_huge_page_saturates_offset() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        // An offset past the end yields an empty page, never an overflow.
        assert!(repo.list(u64::MAX, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_set_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
