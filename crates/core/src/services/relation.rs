//! Relation toggle service.
//!
//! Favorite, shopping cart, and subscription links all follow the same
//! add/remove protocol: validate the target id, check self-reference
//! policy, check the target exists, then create or delete exactly one
//! link row. The kind is a tagged variant carrying its own store and
//! self-reference policy rather than a hierarchy of per-relation types.

use forkful_common::{AppError, AppResult, IdGenerator, id};
use forkful_db::{
    entities::{favorite_recipe, shopping_cart_recipe, subscription},
    repositories::{
        FavoriteRepository, RecipeRepository, ShoppingCartRepository, SubscriptionRepository,
        UserRepository,
    },
};
use sea_orm::Set;

/// The three relation kinds a user can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// User bookmarks a recipe.
    Favorite,
    /// User keeps a recipe in their shopping cart.
    Cart,
    /// User subscribes to a recipe author.
    Subscription,
}

impl RelationKind {
    /// Only subscriptions forbid `user == target`.
    #[must_use]
    pub const fn forbids_self_reference(self) -> bool {
        matches!(self, Self::Subscription)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Cart => "shopping cart",
            Self::Subscription => "subscription",
        }
    }
}

/// Relation toggle service enforcing the at-most-one-link invariant.
#[derive(Clone)]
pub struct RelationService {
    favorite_repo: FavoriteRepository,
    cart_repo: ShoppingCartRepository,
    subscription_repo: SubscriptionRepository,
    recipe_repo: RecipeRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl RelationService {
    /// Create a new relation service.
    #[must_use]
    pub const fn new(
        favorite_repo: FavoriteRepository,
        cart_repo: ShoppingCartRepository,
        subscription_repo: SubscriptionRepository,
        recipe_repo: RecipeRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            favorite_repo,
            cart_repo,
            subscription_repo,
            recipe_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check whether a relation link exists.
    pub async fn exists(
        &self,
        kind: RelationKind,
        user_id: &str,
        target_id: &str,
    ) -> AppResult<bool> {
        match kind {
            RelationKind::Favorite => self.favorite_repo.exists(user_id, target_id).await,
            RelationKind::Cart => self.cart_repo.exists(user_id, target_id).await,
            RelationKind::Subscription => self.subscription_repo.exists(user_id, target_id).await,
        }
    }

    /// Add a relation link.
    ///
    /// The existence pre-check produces the friendly `AlreadyExists`
    /// error; the store's unique index is what actually decides a race
    /// between concurrent adds, and the repositories map its violation to
    /// the same error.
    pub async fn add(&self, kind: RelationKind, user_id: &str, target_id: &str) -> AppResult<()> {
        Self::validate_target_id(target_id)?;

        if kind.forbids_self_reference() && user_id == target_id {
            return Err(AppError::SelfReference);
        }

        // Target must exist before a link can point at it.
        match kind {
            RelationKind::Favorite | RelationKind::Cart => {
                self.recipe_repo.get_by_id(target_id).await?;
            }
            RelationKind::Subscription => {
                self.user_repo.get_by_id(target_id).await?;
            }
        }

        if self.exists(kind, user_id, target_id).await? {
            return Err(AppError::AlreadyExists(kind.label().to_string()));
        }

        let id = self.id_gen.generate();
        let now = chrono::Utc::now().into();
        match kind {
            RelationKind::Favorite => {
                let model = favorite_recipe::ActiveModel {
                    id: Set(id),
                    user_id: Set(user_id.to_string()),
                    recipe_id: Set(target_id.to_string()),
                    created_at: Set(now),
                };
                self.favorite_repo.create(model).await?;
            }
            RelationKind::Cart => {
                let model = shopping_cart_recipe::ActiveModel {
                    id: Set(id),
                    user_id: Set(user_id.to_string()),
                    recipe_id: Set(target_id.to_string()),
                    created_at: Set(now),
                };
                self.cart_repo.create(model).await?;
            }
            RelationKind::Subscription => {
                let model = subscription::ActiveModel {
                    id: Set(id),
                    subscriber_id: Set(user_id.to_string()),
                    author_id: Set(target_id.to_string()),
                    created_at: Set(now),
                };
                self.subscription_repo.create(model).await?;
            }
        }
        Ok(())
    }

    /// Remove a relation link. Removing a pair that does not exist is a
    /// client error, not a no-op.
    pub async fn remove(
        &self,
        kind: RelationKind,
        user_id: &str,
        target_id: &str,
    ) -> AppResult<()> {
        Self::validate_target_id(target_id)?;

        let removed = match kind {
            RelationKind::Favorite => self.favorite_repo.delete(user_id, target_id).await?,
            RelationKind::Cart => self.cart_repo.delete(user_id, target_id).await?,
            RelationKind::Subscription => {
                self.subscription_repo.delete(user_id, target_id).await?
            }
        };

        if removed == 0 {
            return Err(AppError::RelationNotFound(kind.label().to_string()));
        }
        Ok(())
    }

    /// A malformed target id can never name a stored row. Reported as 400
    /// uniformly for all three kinds.
    fn validate_target_id(target_id: &str) -> AppResult<()> {
        if id::is_well_formed(target_id) {
            Ok(())
        } else {
            Err(AppError::InvalidIdentifier(target_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forkful_db::entities::{recipe, user};
    use forkful_db::test_utils::mock_connection;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_ids() -> (String, String) {
        let id_gen = IdGenerator::new();
        (id_gen.generate(), id_gen.generate())
    }

    fn test_recipe(id: &str, author_id: &str) -> recipe::Model {
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

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(
        favorite_db: Arc<sea_orm::DatabaseConnection>,
        cart_db: Arc<sea_orm::DatabaseConnection>,
        subscription_db: Arc<sea_orm::DatabaseConnection>,
        recipe_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
    ) -> RelationService {
        RelationService::new(
            FavoriteRepository::new(favorite_db),
            ShoppingCartRepository::new(cart_db),
            SubscriptionRepository::new(subscription_db),
            RecipeRepository::new(recipe_db),
            UserRepository::new(user_db),
        )
    }

    #[tokio::test]
    async fn test_add_rejects_malformed_target_id() {
        let (user_id, _) = test_ids();
        let service = service_with(
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
        );

        let result = service
            .add(RelationKind::Favorite, &user_id, "not-an-id")
            .await;
        assert!(matches!(result, Err(AppError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_self_subscription_always_rejected() {
        let (user_id, _) = test_ids();
        let service = service_with(
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
        );

        let result = service
            .add(RelationKind::Subscription, &user_id, &user_id)
            .await;
        assert!(matches!(result, Err(AppError::SelfReference)));
    }

    #[tokio::test]
    async fn test_add_favorite_target_missing() {
        let (user_id, recipe_id) = test_ids();
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );
        let service = service_with(
            mock_connection(),
            mock_connection(),
            mock_connection(),
            recipe_db,
            mock_connection(),
        );

        let result = service.add(RelationKind::Favorite, &user_id, &recipe_id).await;
        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_favorite_already_exists() {
        let (user_id, recipe_id) = test_ids();
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_recipe(&recipe_id, &user_id)]])
                .into_connection(),
        );
        let favorite_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[forkful_db::entities::favorite_recipe::Model {
                    id: "fav1".to_string(),
                    user_id: user_id.clone(),
                    recipe_id: recipe_id.clone(),
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let service = service_with(
            favorite_db,
            mock_connection(),
            mock_connection(),
            recipe_db,
            mock_connection(),
        );

        let result = service.add(RelationKind::Favorite, &user_id, &recipe_id).await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_add_subscription_checks_user_store() {
        let (user_id, author_id) = test_ids();
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = service_with(
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
            user_db,
        );

        let result = service
            .add(RelationKind::Subscription, &user_id, &author_id)
            .await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_nonexistent_pair() {
        let (user_id, recipe_id) = test_ids();
        let cart_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = service_with(
            mock_connection(),
            cart_db,
            mock_connection(),
            mock_connection(),
            mock_connection(),
        );

        let result = service.remove(RelationKind::Cart, &user_id, &recipe_id).await;
        assert!(matches!(result, Err(AppError::RelationNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_deletes_exactly_one_row() {
        let (user_id, recipe_id) = test_ids();
        let favorite_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service_with(
            favorite_db,
            mock_connection(),
            mock_connection(),
            mock_connection(),
            mock_connection(),
        );

        let result = service
            .remove(RelationKind::Favorite, &user_id, &recipe_id)
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_only_subscription_forbids_self_reference() {
        assert!(!RelationKind::Favorite.forbids_self_reference());
        assert!(!RelationKind::Cart.forbids_self_reference());
        assert!(RelationKind::Subscription.forbids_self_reference());
    }
}
