//! User accounts: registration, token auth, profiles, and the
//! subscription feed.

use std::collections::HashSet;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use forkful_common::{AppError, AppResult, IdGenerator, id};
use forkful_db::{
    entities::{recipe, user},
    repositories::{RecipeRepository, SubscriptionRepository, UserRepository},
};
use sea_orm::Set;
use validator::Validate;

/// Registration payload.
#[derive(Debug, Clone, Validate)]
pub struct RegisterUser {
    /// Login email, unique.
    #[validate(email, length(max = 254))]
    pub email: String,
    /// Display handle, unique.
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    /// Plaintext password, hashed before storage.
    #[validate(length(min = 8, max = 150))]
    pub password: String,
}

/// A user as seen by a specific caller.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// The user row.
    pub user: user::Model,
    /// Whether the caller subscribes to this user. Always `false`
    /// for anonymous callers and for the caller's own profile.
    pub is_subscribed: bool,
}

/// A subscribed-to author with a preview of their recipes.
#[derive(Debug, Clone)]
pub struct SubscribedAuthor {
    /// The author row.
    pub user: user::Model,
    /// The author's newest recipes, truncated to the requested limit.
    pub recipes: Vec<recipe::Model>,
    /// Total number of recipes the author has published.
    pub recipes_count: u64,
}

/// User service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        subscription_repo: SubscriptionRepository,
        recipe_repo: RecipeRepository,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account. A duplicate email or username surfaces
    /// as `AlreadyExists` via the unique indexes.
    pub async fn register(&self, input: RegisterUser) -> AppResult<user::Model> {
        input.validate()?;
        let password_hash = hash_password(&input.password)?;
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password_hash: Set(password_hash),
            token: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.user_repo.create(model).await
    }

    /// Exchange credentials for an access token. A fresh token replaces
    /// any previous one, so a login invalidates older sessions.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }
        let token = self.id_gen.generate_token();
        self.user_repo.set_token(&user.id, &token).await?;
        Ok(token)
    }

    /// Drop the caller's access token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.clear_token(user_id).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))
    }

    /// Change the caller's password after re-checking the current one.
    pub async fn change_password(
        &self,
        user: &user::Model,
        current: &str,
        new: &str,
    ) -> AppResult<()> {
        if !verify_password(current, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }
        if new.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }
        let model = user::ActiveModel {
            id: Set(user.id.clone()),
            password_hash: Set(hash_password(new)?),
            ..Default::default()
        };
        self.user_repo.update(model).await?;
        Ok(())
    }

    /// Look up a profile as seen by the caller.
    pub async fn profile(&self, viewer: Option<&str>, user_id: &str) -> AppResult<UserProfile> {
        if !id::is_well_formed(user_id) {
            return Err(AppError::InvalidIdentifier(user_id.to_string()));
        }
        let user = self.user_repo.get_by_id(user_id).await?;
        let is_subscribed = match viewer {
            Some(viewer) => self.subscription_repo.exists(viewer, &user.id).await?,
            None => false,
        };
        Ok(UserProfile { user, is_subscribed })
    }

    /// List users with the caller's subscription flags.
    pub async fn list(
        &self,
        viewer: Option<&str>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserProfile>, u64)> {
        let users = self.user_repo.list(page, limit).await?;
        let total = self.user_repo.count().await?;

        let subscribed: HashSet<String> = match viewer {
            Some(viewer) if !users.is_empty() => {
                let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
                self.subscription_repo
                    .author_ids_for_subscriber_among(viewer, &ids)
                    .await?
                    .into_iter()
                    .collect()
            }
            _ => HashSet::new(),
        };

        let profiles = users
            .into_iter()
            .map(|user| {
                let is_subscribed = subscribed.contains(&user.id);
                UserProfile { user, is_subscribed }
            })
            .collect();
        Ok((profiles, total))
    }

    /// Page through the authors the caller subscribes to, each with a
    /// recipe preview capped at `recipes_limit`.
    pub async fn subscriptions(
        &self,
        viewer_id: &str,
        page: u64,
        limit: u64,
        recipes_limit: Option<u64>,
    ) -> AppResult<(Vec<SubscribedAuthor>, u64)> {
        let author_ids = self
            .subscription_repo
            .author_ids_for_subscriber(viewer_id, page, limit)
            .await?;
        let total = self.subscription_repo.count_for_subscriber(viewer_id).await?;

        let mut authors = Vec::with_capacity(author_ids.len());
        for author_id in author_ids {
            let user = self.user_repo.get_by_id(&author_id).await?;
            let recipes = self.recipe_repo.find_by_author(&author_id, recipes_limit).await?;
            let recipes_count = self.recipe_repo.count_by_author(&author_id).await?;
            authors.push(SubscribedAuthor {
                user,
                recipes,
                recipes_count,
            });
        }
        Ok((authors, total))
    }

    /// One author with their recipe preview, as shown right after a
    /// subscription is created.
    pub async fn author_preview(
        &self,
        author_id: &str,
        recipes_limit: Option<u64>,
    ) -> AppResult<SubscribedAuthor> {
        let user = self.user_repo.get_by_id(author_id).await?;
        let recipes = self.recipe_repo.find_by_author(author_id, recipes_limit).await?;
        let recipes_count = self.recipe_repo.count_by_author(author_id).await?;
        Ok(SubscribedAuthor {
            user,
            recipes,
            recipes_count,
        })
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forkful_db::test_utils::mock_connection;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    use super::*;

    fn service(db: Arc<DatabaseConnection>) -> UserService {
        UserService::new(
            UserRepository::new(db.clone()),
            SubscriptionRepository::new(db.clone()),
            RecipeRepository::new(db),
        )
    }

    fn stored_user(id: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Alex".to_string(),
            last_name: "Baker".to_string(),
            password_hash: hash_password(password).unwrap(),
            token: None,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_register_payload_validation() {
        let input = RegisterUser {
            email: "not-an-email".to_string(),
            username: "cook".to_string(),
            first_name: "Alex".to_string(),
            last_name: "Baker".to_string(),
            password: "longenough".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterUser {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Alex".to_string(),
            last_name: "Baker".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let user = stored_user(&IdGenerator::new().generate(), "hunter2hunter2");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.login("cook@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.login("nobody@example.com", "whatever").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let user = stored_user(&IdGenerator::new().generate(), "hunter2hunter2");
        let mut updated = user.clone();
        updated.token = Some("issued".to_string());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user]])
                .append_query_results([vec![updated]])
                .into_connection(),
        );
        let svc = service(db);

        let token = svc.login("cook@example.com", "hunter2hunter2").await.unwrap();
        assert_eq!(token.len(), 32);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.authenticate("stale-token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_profile_rejects_malformed_id() {
        let svc = service(mock_connection());

        let err = svc.profile(None, "not-a-real-id").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_anonymous_profile_flag_is_false() {
        let user_id = IdGenerator::new().generate();
        let user = stored_user(&user_id, "hunter2hunter2");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user]])
                .into_connection(),
        );
        let svc = service(db);

        let profile = svc.profile(None, &user_id).await.unwrap();
        assert!(!profile.is_subscribed);
    }
}
