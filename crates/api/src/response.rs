//! API response types.

use forkful_core::{RecipeDetails, SubscribedAuthor, UserProfile};
use forkful_db::entities::{ingredient, recipe, tag};
use serde::Serialize;

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    /// Total matching items across all pages.
    pub count: u64,
    /// Relative query string of the next page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Relative query string of the previous page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// This page's items.
    pub results: Vec<T>,
}

impl<T: Serialize> Page<T> {
    /// Build a page envelope for 1-based `page` with `limit` items
    /// per page.
    #[must_use]
    pub fn new(count: u64, page: u64, limit: u64, results: Vec<T>) -> Self {
        // page is caller-supplied and unbounded; the multiplication must
        // not overflow. An overflowing page is past the end by definition.
        let next = page
            .checked_mul(limit)
            .is_some_and(|seen| seen < count)
            .then(|| format!("?page={}&limit={limit}", page + 1));
        let previous = (page > 1).then(|| format!("?page={}&limit={limit}", page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// A user with the caller's subscription flag.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user.id,
            email: profile.user.email,
            username: profile.user.username,
            first_name: profile.user.first_name,
            last_name: profile.user.last_name,
            is_subscribed: profile.is_subscribed,
        }
    }
}

/// Tag catalog entry.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: String,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

/// Ingredient catalog entry.
#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

/// An ingredient line inside a recipe.
#[derive(Debug, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe view with caller flags.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: String,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<RecipeDetails> for RecipeResponse {
    fn from(details: RecipeDetails) -> Self {
        Self {
            id: details.recipe.id,
            tags: details.tags.into_iter().map(Into::into).collect(),
            author: details.author.into(),
            ingredients: details
                .ingredients
                .into_iter()
                .map(|item| RecipeIngredientResponse {
                    id: item.id,
                    name: item.name,
                    measurement_unit: item.measurement_unit,
                    amount: item.amount,
                })
                .collect(),
            is_favorited: details.is_favorited,
            is_in_shopping_cart: details.is_in_shopping_cart,
            name: details.recipe.name,
            image: details.recipe.image,
            text: details.recipe.text,
            cooking_time: details.recipe.cooking_time,
        }
    }
}

/// Brief recipe view used in relation responses and author previews.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeSummary {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// A subscribed-to author with a recipe preview.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
}

impl From<SubscribedAuthor> for SubscriptionResponse {
    fn from(author: SubscribedAuthor) -> Self {
        Self {
            id: author.user.id,
            email: author.user.email,
            username: author.user.username,
            first_name: author.user.first_name,
            last_name: author.user.last_name,
            // This view only exists for authors the caller subscribes to.
            is_subscribed: true,
            recipes: author.recipes.into_iter().map(Into::into).collect(),
            recipes_count: author.recipes_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links() {
        let page = Page::new(13, 2, 5, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.next.as_deref(), Some("?page=3&limit=5"));
        assert_eq!(page.previous.as_deref(), Some("?page=1&limit=5"));
    }

    #[test]
    fn test_page_boundaries() {
        let first: Page<i32> = Page::new(6, 1, 6, vec![]);
        assert!(first.next.is_none());
        assert!(first.previous.is_none());

        let last: Page<i32> = Page::new(7, 2, 6, vec![]);
        assert!(last.next.is_none());
        assert_eq!(last.previous.as_deref(), Some("?page=1&limit=6"));
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let page: Page<i32> = Page::new(10, u64::MAX, 100, vec![]);
        assert!(page.next.is_none());
        assert_eq!(
            page.previous.as_deref(),
            Some(&*format!("?page={}&limit=100", u64::MAX - 1))
        );
    }
}
