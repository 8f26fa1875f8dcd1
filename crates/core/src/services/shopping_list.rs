//! Shopping list aggregation service.
//!
//! Produces the downloadable shopping list: every ingredient across the
//! recipes in a user's cart, one line per distinct ingredient with the
//! amounts summed. Grouping is by (name, measurement unit) — the pair
//! that is unique catalog-wide — so "flour, g" from two recipes becomes
//! one combined line, never two lines and never an overwritten amount.

use std::collections::BTreeMap;

use forkful_common::{AppError, AppResult};
use forkful_db::{
    entities::{ingredient, recipe_ingredient},
    repositories::{RecipeRepository, ShoppingCartRepository},
};

/// One aggregated line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedIngredient {
    /// Ingredient name.
    pub name: String,
    /// Measurement unit.
    pub measurement_unit: String,
    /// Total amount across all contributing cart recipes.
    pub amount: i64,
}

/// Shopping list aggregation service.
#[derive(Clone)]
pub struct ShoppingListService {
    cart_repo: ShoppingCartRepository,
    recipe_repo: RecipeRepository,
}

impl ShoppingListService {
    /// Create a new shopping list service.
    #[must_use]
    pub const fn new(cart_repo: ShoppingCartRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            cart_repo,
            recipe_repo,
        }
    }

    /// Aggregate the user's cart into per-ingredient totals, sorted by
    /// ingredient name then unit. An empty cart yields an empty list.
    pub async fn aggregate(&self, user_id: &str) -> AppResult<Vec<AggregatedIngredient>> {
        let recipe_ids = self.cart_repo.recipe_ids_for_user(user_id).await?;
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.recipe_repo.ingredients_for_recipes(&recipe_ids).await?;
        sum_by_ingredient(rows)
    }

    /// Render the user's cart as the plain-text report.
    pub async fn report(&self, user_id: &str) -> AppResult<String> {
        let totals = self.aggregate(user_id).await?;
        Ok(render_report(&totals))
    }
}

/// Group (join row, ingredient) pairs by ingredient identity and sum
/// amounts.
fn sum_by_ingredient(
    rows: Vec<(recipe_ingredient::Model, Option<ingredient::Model>)>,
) -> AppResult<Vec<AggregatedIngredient>> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (row, ingredient) in rows {
        let ingredient = ingredient.ok_or_else(|| {
            AppError::Internal(format!(
                "recipe_ingredient {} references missing ingredient {}",
                row.id, row.ingredient_id
            ))
        })?;
        *totals
            .entry((ingredient.name, ingredient.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }
    Ok(totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| AggregatedIngredient {
            name,
            measurement_unit,
            amount,
        })
        .collect())
}

/// One line per distinct ingredient: `<name>, <unit>: <amount>`.
fn render_report(totals: &[AggregatedIngredient]) -> String {
    let mut out = String::new();
    for item in totals {
        out.push_str(&format!(
            "{}, {}: {}\n",
            item.name, item.measurement_unit, item.amount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forkful_db::entities::shopping_cart_recipe;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn join_row(id: &str, recipe_id: &str, ingredient_id: &str, amount: i32) -> recipe_ingredient::Model {
        recipe_ingredient::Model {
            id: id.to_string(),
            recipe_id: recipe_id.to_string(),
            ingredient_id: ingredient_id.to_string(),
            amount,
        }
    }

    fn catalog(id: &str, name: &str, unit: &str) -> ingredient::Model {
        ingredient::Model {
            id: id.to_string(),
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn test_shared_ingredient_is_summed_not_duplicated() {
        // Recipe A: flour 200g, sugar 50g. Recipe B: flour 300g, egg 2pc.
        let rows = vec![
            (join_row("ri1", "a", "flour", 200), Some(catalog("flour", "flour", "g"))),
            (join_row("ri2", "a", "sugar", 50), Some(catalog("sugar", "sugar", "g"))),
            (join_row("ri3", "b", "flour", 300), Some(catalog("flour", "flour", "g"))),
            (join_row("ri4", "b", "egg", 2), Some(catalog("egg", "egg", "pc"))),
        ];

        let totals = sum_by_ingredient(rows).unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(
            totals[1],
            AggregatedIngredient {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
                amount: 500,
            }
        );
        assert_eq!(totals[0].name, "egg");
        assert_eq!(totals[0].amount, 2);
        assert_eq!(totals[2].name, "sugar");
        assert_eq!(totals[2].amount, 50);
    }

    #[test]
    fn test_same_name_different_unit_stays_separate() {
        let rows = vec![
            (join_row("ri1", "a", "milk-ml", 200), Some(catalog("milk-ml", "milk", "ml"))),
            (join_row("ri2", "b", "milk-g", 100), Some(catalog("milk-g", "milk", "g"))),
        ];

        let totals = sum_by_ingredient(rows).unwrap();
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_render_report_format() {
        let totals = vec![
            AggregatedIngredient {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
                amount: 500,
            },
            AggregatedIngredient {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
                amount: 50,
            },
        ];
        assert_eq!(render_report(&totals), "flour, g: 500\nsugar, g: 50\n");
    }

    #[test]
    fn test_empty_totals_render_empty_report() {
        assert_eq!(render_report(&[]), "");
    }

    #[tokio::test]
    async fn test_empty_cart_produces_empty_report() {
        let cart_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<shopping_cart_recipe::Model>::new()])
                .into_connection(),
        );
        let recipe_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = ShoppingListService::new(
            ShoppingCartRepository::new(cart_db),
            RecipeRepository::new(recipe_db),
        );

        let report = service.report("user1").await.unwrap();
        assert_eq!(report, "");
    }
}
