//! Business logic layer for forkful.
//!
//! Services own the rules on top of the repositories: relation toggling
//! with its uniqueness and self-reference invariants, shopping-list
//! aggregation, recipe write validation, and the caller-scoped annotated
//! read model.

pub mod services;

pub use services::ingredient::IngredientService;
pub use services::recipe::{
    IngredientAmount, RecipeDetails, RecipeListQuery, RecipeService, RecipeWrite,
    RecipeWriteIngredient,
};
pub use services::relation::{RelationKind, RelationService};
pub use services::shopping_list::{AggregatedIngredient, ShoppingListService};
pub use services::tag::TagService;
pub use services::user::{RegisterUser, SubscribedAuthor, UserProfile, UserService};
