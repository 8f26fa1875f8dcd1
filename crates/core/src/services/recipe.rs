//! Recipe service: write validation, transactional persistence, and the
//! caller-scoped annotated listing.

use std::collections::{HashMap, HashSet};

use base64::Engine as _;
use forkful_common::{AppError, AppResult, IdGenerator};
use forkful_db::{
    entities::{recipe, recipe_ingredient, recipe_tag, tag, user},
    repositories::{
        FavoriteRepository, IngredientRepository, RecipeFilter, RecipeRepository,
        ShoppingCartRepository, SubscriptionRepository, TagRepository, UserRepository,
    },
};
use sea_orm::Set;

use crate::services::user::UserProfile;

/// Minimum per-ingredient amount.
pub const MIN_AMOUNT: i32 = 1;
/// Maximum per-ingredient amount.
pub const MAX_AMOUNT: i32 = 10_000;
/// Minimum cooking time in minutes.
pub const MIN_COOKING_TIME: i32 = 1;
/// Maximum recipe name length.
pub const MAX_NAME_LENGTH: usize = 200;

/// One ingredient reference in a write payload.
#[derive(Debug, Clone)]
pub struct RecipeWriteIngredient {
    /// Ingredient catalog id.
    pub id: String,
    /// Required amount, `MIN_AMOUNT..=MAX_AMOUNT`.
    pub amount: i32,
}

/// Recipe write payload (create and full update share it).
#[derive(Debug, Clone)]
pub struct RecipeWrite {
    /// Recipe name.
    pub name: String,
    /// Base64 data URL (`data:image/<ext>;base64,...`).
    pub image: String,
    /// Recipe description.
    pub text: String,
    /// Cooking time in minutes.
    pub cooking_time: i32,
    /// Ingredient list, non-empty, no duplicate ids.
    pub ingredients: Vec<RecipeWriteIngredient>,
    /// Tag ids, no duplicates.
    pub tags: Vec<String>,
}

impl RecipeWrite {
    /// Validate the payload shape. Referenced-id existence is checked
    /// separately against the catalog.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }
        if self.cooking_time < MIN_COOKING_TIME {
            return Err(AppError::Validation(format!(
                "cooking_time must be at least {MIN_COOKING_TIME}"
            )));
        }
        if self.ingredients.is_empty() {
            return Err(AppError::Validation(
                "ingredient list must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for item in &self.ingredients {
            if !seen.insert(item.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate ingredient id {}",
                    item.id
                )));
            }
            if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
                return Err(AppError::Validation(format!(
                    "amount must be in [{MIN_AMOUNT}, {MAX_AMOUNT}], got {}",
                    item.amount
                )));
            }
        }
        let mut seen_tags = HashSet::new();
        for tag_id in &self.tags {
            if !seen_tags.insert(tag_id.as_str()) {
                return Err(AppError::Validation(format!("duplicate tag id {tag_id}")));
            }
        }
        validate_image(&self.image)
    }
}

/// Check that the image field is a decodable base64 data URL. The decoded
/// bytes are stored opaquely and never parsed further.
fn validate_image(image: &str) -> AppResult<()> {
    let payload = image
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            AppError::Validation("image must be a base64 data URL".to_string())
        })?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("image is not valid base64: {e}")))?;
    Ok(())
}

/// An ingredient row of a recipe detail view.
#[derive(Debug, Clone)]
pub struct IngredientAmount {
    /// Ingredient catalog id.
    pub id: String,
    /// Ingredient name.
    pub name: String,
    /// Measurement unit.
    pub measurement_unit: String,
    /// Amount this recipe requires.
    pub amount: i32,
}

/// A recipe as seen by a specific (possibly anonymous) caller.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    /// The recipe row.
    pub recipe: recipe::Model,
    /// The author with the caller's subscription flag.
    pub author: UserProfile,
    /// Ingredients with amounts.
    pub ingredients: Vec<IngredientAmount>,
    /// Tags.
    pub tags: Vec<tag::Model>,
    /// Whether the caller has favorited this recipe. Always `false`
    /// for anonymous callers.
    pub is_favorited: bool,
    /// Whether this recipe is in the caller's shopping cart. Always
    /// `false` for anonymous callers.
    pub is_in_shopping_cart: bool,
}

/// Listing query for `list`.
#[derive(Debug, Clone, Default)]
pub struct RecipeListQuery {
    /// Only recipes by this author.
    pub author: Option<String>,
    /// Only recipes carrying at least one of these tag slugs.
    pub tags: Vec<String>,
    /// Only recipes the caller has favorited. No-op for anonymous callers.
    pub is_favorited: bool,
    /// Only recipes in the caller's cart. No-op for anonymous callers.
    pub is_in_shopping_cart: bool,
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
}

/// Recipe service.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    favorite_repo: FavoriteRepository,
    cart_repo: ShoppingCartRepository,
    subscription_repo: SubscriptionRepository,
    ingredient_repo: IngredientRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(
        recipe_repo: RecipeRepository,
        favorite_repo: FavoriteRepository,
        cart_repo: ShoppingCartRepository,
        subscription_repo: SubscriptionRepository,
        ingredient_repo: IngredientRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            recipe_repo,
            favorite_repo,
            cart_repo,
            subscription_repo,
            ingredient_repo,
            tag_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List recipes for a caller, with flags and filters.
    ///
    /// Filters restricting the listing to relation rows are computed as
    /// deduplicated id sets up front, so a recipe can never appear twice
    /// regardless of how many relation or tag rows match it.
    pub async fn list(
        &self,
        viewer: Option<&str>,
        query: &RecipeListQuery,
    ) -> AppResult<(Vec<RecipeDetails>, u64)> {
        let mut allow: Option<HashSet<String>> = None;

        if !query.tags.is_empty() {
            let tags = self.tag_repo.find_by_slugs(&query.tags).await?;
            let tag_ids: Vec<String> = tags.into_iter().map(|t| t.id).collect();
            let ids = self.recipe_repo.recipe_ids_with_tags(&tag_ids).await?;
            intersect(&mut allow, ids);
        }
        if query.is_favorited {
            // Anonymous callers own no relation rows; the filter is a no-op
            // rather than an error.
            if let Some(viewer) = viewer {
                let ids = self.favorite_repo.recipe_ids_for_user(viewer).await?;
                intersect(&mut allow, ids);
            }
        }
        if query.is_in_shopping_cart {
            if let Some(viewer) = viewer {
                let ids = self.cart_repo.recipe_ids_for_user(viewer).await?;
                intersect(&mut allow, ids);
            }
        }

        let filter = RecipeFilter {
            author_id: query.author.clone(),
            id_in: allow.map(|set| set.into_iter().collect()),
        };
        if filter.id_in.as_ref().is_some_and(Vec::is_empty) {
            return Ok((Vec::new(), 0));
        }

        let recipes = self.recipe_repo.list(&filter, query.page, query.limit).await?;
        let total = self.recipe_repo.count(&filter).await?;
        let details = self.assemble(viewer, recipes).await?;
        Ok((details, total))
    }

    /// Get a single recipe as seen by the caller.
    pub async fn get(&self, viewer: Option<&str>, recipe_id: &str) -> AppResult<RecipeDetails> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        let mut details = self.assemble(viewer, vec![recipe]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::RecipeNotFound(recipe_id.to_string()))
    }

    /// Create a recipe with its ingredients and tags in one transaction.
    pub async fn create(&self, author: &user::Model, write: RecipeWrite) -> AppResult<RecipeDetails> {
        write.validate()?;
        self.check_references(&write).await?;

        let recipe_id = self.id_gen.generate();
        let model = recipe::ActiveModel {
            id: Set(recipe_id.clone()),
            author_id: Set(author.id.clone()),
            name: Set(write.name.clone()),
            image: Set(write.image.clone()),
            text: Set(write.text.clone()),
            cooking_time: Set(write.cooking_time),
            created_at: Set(chrono::Utc::now().into()),
        };
        let (ingredients, tags) = self.join_rows(&recipe_id, &write);

        let created = self
            .recipe_repo
            .create_with_components(model, ingredients, tags)
            .await?;
        self.get(Some(&author.id), &created.id).await
    }

    /// Update a recipe, replacing its full ingredient and tag sets.
    /// Author-only.
    pub async fn update(
        &self,
        actor: &user::Model,
        recipe_id: &str,
        write: RecipeWrite,
    ) -> AppResult<RecipeDetails> {
        let existing = self.recipe_repo.get_by_id(recipe_id).await?;
        if existing.author_id != actor.id {
            return Err(AppError::Forbidden(
                "only the author can modify a recipe".to_string(),
            ));
        }
        write.validate()?;
        self.check_references(&write).await?;

        let model = recipe::ActiveModel {
            id: Set(recipe_id.to_string()),
            name: Set(write.name.clone()),
            image: Set(write.image.clone()),
            text: Set(write.text.clone()),
            cooking_time: Set(write.cooking_time),
            ..Default::default()
        };
        let (ingredients, tags) = self.join_rows(recipe_id, &write);

        self.recipe_repo
            .update_with_components(model, recipe_id, ingredients, tags)
            .await?;
        self.get(Some(&actor.id), recipe_id).await
    }

    /// Delete a recipe. Author-only; relation rows cascade away.
    pub async fn delete(&self, actor: &user::Model, recipe_id: &str) -> AppResult<()> {
        let existing = self.recipe_repo.get_by_id(recipe_id).await?;
        if existing.author_id != actor.id {
            return Err(AppError::Forbidden(
                "only the author can delete a recipe".to_string(),
            ));
        }
        self.recipe_repo.delete(recipe_id).await?;
        Ok(())
    }

    /// Every referenced ingredient and tag id must exist in the catalog.
    async fn check_references(&self, write: &RecipeWrite) -> AppResult<()> {
        let ingredient_ids: Vec<String> =
            write.ingredients.iter().map(|i| i.id.clone()).collect();
        let found = self.ingredient_repo.find_by_ids(&ingredient_ids).await?;
        if found.len() != ingredient_ids.len() {
            let known: HashSet<&str> = found.iter().map(|i| i.id.as_str()).collect();
            let missing = ingredient_ids
                .iter()
                .find(|id| !known.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(AppError::IngredientNotFound(missing));
        }

        let found_tags = self.tag_repo.find_by_ids(&write.tags).await?;
        if found_tags.len() != write.tags.len() {
            let known: HashSet<&str> = found_tags.iter().map(|t| t.id.as_str()).collect();
            let missing = write
                .tags
                .iter()
                .find(|id| !known.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(AppError::TagNotFound(missing));
        }
        Ok(())
    }

    fn join_rows(
        &self,
        recipe_id: &str,
        write: &RecipeWrite,
    ) -> (
        Vec<recipe_ingredient::ActiveModel>,
        Vec<recipe_tag::ActiveModel>,
    ) {
        let ingredients = write
            .ingredients
            .iter()
            .map(|item| recipe_ingredient::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                ingredient_id: Set(item.id.clone()),
                amount: Set(item.amount),
            })
            .collect();
        let tags = write
            .tags
            .iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                tag_id: Set(tag_id.clone()),
            })
            .collect();
        (ingredients, tags)
    }

    /// Decorate recipe rows with authors, components, and caller flags.
    ///
    /// Flags come from batch membership probes collected into sets, never
    /// from a row-multiplying join, so every recipe appears exactly once.
    /// Anonymous callers get `false` flags without any relation lookup.
    async fn assemble(
        &self,
        viewer: Option<&str>,
        recipes: Vec<recipe::Model>,
    ) -> AppResult<Vec<RecipeDetails>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let recipe_ids: Vec<String> = recipes.iter().map(|r| r.id.clone()).collect();
        let author_ids: Vec<String> = {
            let mut seen = HashSet::new();
            recipes
                .iter()
                .filter(|r| seen.insert(r.author_id.clone()))
                .map(|r| r.author_id.clone())
                .collect()
        };

        let (favorited, in_cart, subscribed) = match viewer {
            Some(viewer) => {
                let favorited: HashSet<String> = self
                    .favorite_repo
                    .recipe_ids_for_user_among(viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect();
                let in_cart: HashSet<String> = self
                    .cart_repo
                    .recipe_ids_for_user_among(viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect();
                let subscribed: HashSet<String> = self
                    .subscription_repo
                    .author_ids_for_subscriber_among(viewer, &author_ids)
                    .await?
                    .into_iter()
                    .collect();
                (favorited, in_cart, subscribed)
            }
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut ingredients_by_recipe: HashMap<String, Vec<IngredientAmount>> = HashMap::new();
        for (row, ingredient) in self.recipe_repo.ingredients_for_recipes(&recipe_ids).await? {
            let ingredient = ingredient.ok_or_else(|| {
                AppError::Internal(format!(
                    "recipe_ingredient {} references missing ingredient {}",
                    row.id, row.ingredient_id
                ))
            })?;
            ingredients_by_recipe
                .entry(row.recipe_id.clone())
                .or_default()
                .push(IngredientAmount {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: row.amount,
                });
        }

        let mut tags_by_recipe: HashMap<String, Vec<tag::Model>> = HashMap::new();
        for (row, tag) in self.recipe_repo.tags_for_recipes(&recipe_ids).await? {
            let tag = tag.ok_or_else(|| {
                AppError::Internal(format!(
                    "recipe_tag {} references missing tag {}",
                    row.id, row.tag_id
                ))
            })?;
            tags_by_recipe.entry(row.recipe_id.clone()).or_default().push(tag);
        }

        recipes
            .into_iter()
            .map(|recipe| {
                let author_row = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!(
                        "recipe {} references missing author {}",
                        recipe.id, recipe.author_id
                    ))
                })?;
                let author = UserProfile {
                    is_subscribed: subscribed.contains(&author_row.id),
                    user: author_row,
                };
                let is_favorited = favorited.contains(&recipe.id);
                let is_in_shopping_cart = in_cart.contains(&recipe.id);
                Ok(RecipeDetails {
                    ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    author,
                    is_favorited,
                    is_in_shopping_cart,
                    recipe,
                })
            })
            .collect()
    }
}

/// Narrow `allow` to its intersection with `ids`.
fn intersect(allow: &mut Option<HashSet<String>>, ids: Vec<String>) {
    let incoming: HashSet<String> = ids.into_iter().collect();
    *allow = Some(match allow.take() {
        Some(existing) => existing.intersection(&incoming).cloned().collect(),
        None => incoming,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 1x1 transparent PNG.
    const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn write_payload() -> RecipeWrite {
        RecipeWrite {
            name: "Pancakes".to_string(),
            image: TEST_IMAGE.to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time: 20,
            ingredients: vec![
                RecipeWriteIngredient {
                    id: "ing1".to_string(),
                    amount: 200,
                },
                RecipeWriteIngredient {
                    id: "ing2".to_string(),
                    amount: 2,
                },
            ],
            tags: vec!["tag1".to_string()],
        }
    }

    #[test]
    fn test_valid_payload_accepted() {
        assert!(write_payload().validate().is_ok());
    }

    #[test]
    fn test_empty_ingredient_list_rejected() {
        let mut payload = write_payload();
        payload.ingredients.clear();
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_duplicate_ingredient_id_rejected() {
        let mut payload = write_payload();
        payload.ingredients = vec![
            RecipeWriteIngredient {
                id: "ing5".to_string(),
                amount: 2,
            },
            RecipeWriteIngredient {
                id: "ing5".to_string(),
                amount: 3,
            },
        ];
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_amount_out_of_range_rejected() {
        let mut payload = write_payload();
        payload.ingredients[0].amount = 0;
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));

        let mut payload = write_payload();
        payload.ingredients[0].amount = 10_001;
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));

        let mut payload = write_payload();
        payload.ingredients[0].amount = 10_000;
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_duplicate_tag_id_rejected() {
        let mut payload = write_payload();
        payload.tags = vec!["tag1".to_string(), "tag1".to_string()];
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_cooking_time_below_minimum_rejected() {
        let mut payload = write_payload();
        payload.cooking_time = 0;
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_image_must_be_data_url() {
        let mut payload = write_payload();
        payload.image = "https://example.com/image.png".to_string();
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));

        let mut payload = write_payload();
        payload.image = "data:image/png;base64,!!not-base64!!".to_string();
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_intersect_narrows() {
        let mut allow = None;
        intersect(&mut allow, vec!["a".to_string(), "b".to_string()]);
        intersect(&mut allow, vec!["b".to_string(), "c".to_string()]);
        let set = allow.unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("b"));
    }

    #[test]
    fn test_intersect_can_empty_out() {
        let mut allow = None;
        intersect(&mut allow, vec!["a".to_string()]);
        intersect(&mut allow, vec!["b".to_string()]);
        assert!(allow.unwrap().is_empty());
    }
}
