//! Create recipe_ingredient table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecipeIngredient::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecipeIngredient::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecipeIngredient::RecipeId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeIngredient::IngredientId)
                            .string_len(32)
                            .not_null(),
                    )
                    // Amount range is enforced here as well as in request
                    // validation so every write path is protected.
                    .col(
                        ColumnDef::new(RecipeIngredient::Amount)
                            .integer()
                            .not_null()
                            .check(Expr::col(RecipeIngredient::Amount).between(1, 10000)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_ingredient_recipe")
                            .from(RecipeIngredient::Table, RecipeIngredient::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_ingredient_ingredient")
                            .from(RecipeIngredient::Table, RecipeIngredient::IngredientId)
                            .to(Ingredient::Table, Ingredient::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (recipe_id, ingredient_id) - a recipe cannot list
        // the same ingredient twice
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_ingredient_recipe_ingredient")
                    .table(RecipeIngredient::Table)
                    .col(RecipeIngredient::RecipeId)
                    .col(RecipeIngredient::IngredientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: recipe_id (for expansion during aggregation)
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_ingredient_recipe_id")
                    .table(RecipeIngredient::Table)
                    .col(RecipeIngredient::RecipeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeIngredient::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RecipeIngredient {
    Table,
    Id,
    RecipeId,
    IngredientId,
    Amount,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}

#[derive(Iden)]
enum Ingredient {
    Table,
    Id,
}
