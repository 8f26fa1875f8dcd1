//! Subscription relation repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use crate::repositories::map_unique_violation;
use forkful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Subscription relation repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether the (subscriber, author) link exists.
    pub async fn exists(&self, subscriber_id: &str, author_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_subscriber_and_author(subscriber_id, author_id)
            .await?
            .is_some())
    }

    /// Find a subscription by subscriber and author.
    pub async fn find_by_subscriber_and_author(
        &self,
        subscriber_id: &str,
        author_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new subscription, mapping a lost unique-index race to
    /// `AlreadyExists`.
    pub async fn create(&self, model: subscription::ActiveModel) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation("subscription", e))
    }

    /// Delete the (subscriber, author) link, returning the number of rows
    /// removed.
    pub async fn delete(&self, subscriber_id: &str, author_id: &str) -> AppResult<u64> {
        let result = Subscription::delete_many()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Author ids a user subscribes to (paginated, oldest subscription first).
    pub async fn author_ids_for_subscriber(
        &self,
        subscriber_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<String>> {
        Subscription::find()
            .select_only()
            .column(subscription::Column::AuthorId)
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_asc(subscription::Column::Id)
            .offset(page.saturating_sub(1).saturating_mul(limit))
            .limit(limit)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Author ids the subscriber follows, restricted to a candidate set.
    pub async fn author_ids_for_subscriber_among(
        &self,
        subscriber_id: &str,
        author_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        Subscription::find()
            .select_only()
            .column(subscription::Column::AuthorId)
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::AuthorId.is_in(author_ids.iter().cloned()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count subscriptions held by a user.
    pub async fn count_for_subscriber(&self, subscriber_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn link(id: &str, subscriber_id: &str, author_id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_exists_round_trip() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new()])
                .append_query_results([[link("sub1", "user1", "author1")]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        assert!(!repo.exists("user1", "author1").await.unwrap());
        assert!(repo.exists("user1", "author1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        assert_eq!(repo.delete("user1", "author1").await.unwrap(), 1);
    }
}
