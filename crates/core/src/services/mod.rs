//! Service layer.

pub mod ingredient;
pub mod recipe;
pub mod relation;
pub mod shopping_list;
pub mod tag;
pub mod user;
