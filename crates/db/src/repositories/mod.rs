//! Repositories for database access.

pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;

pub use favorite::FavoriteRepository;
pub use ingredient::IngredientRepository;
pub use recipe::{RecipeFilter, RecipeRepository};
pub use shopping_cart::ShoppingCartRepository;
pub use subscription::SubscriptionRepository;
pub use tag::TagRepository;
pub use user::UserRepository;

use forkful_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert error to the domain error for a duplicate link row.
///
/// The application-level existence pre-check is only a usability layer;
/// two concurrent creates can both pass it. The store's unique index then
/// rejects one of them, and that rejection must surface as
/// `AlreadyExists`, never as a generic database fault.
pub(crate) fn map_unique_violation(relation: &str, err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::AlreadyExists(relation.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = DbErr::Custom("connection reset".to_string());
        match map_unique_violation("favorite", err) {
            AppError::Database(msg) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
