//! Create shopping_cart_recipe table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShoppingCartRecipe::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShoppingCartRecipe::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShoppingCartRecipe::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShoppingCartRecipe::RecipeId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShoppingCartRecipe::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_cart_recipe_user")
                            .from(ShoppingCartRecipe::Table, ShoppingCartRecipe::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_cart_recipe_recipe")
                            .from(ShoppingCartRecipe::Table, ShoppingCartRecipe::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, recipe_id) - at most one cart link per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_shopping_cart_recipe_user_recipe")
                    .table(ShoppingCartRecipe::Table)
                    .col(ShoppingCartRecipe::UserId)
                    .col(ShoppingCartRecipe::RecipeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (cart expansion during aggregation)
        manager
            .create_index(
                Index::create()
                    .name("idx_shopping_cart_recipe_user_id")
                    .table(ShoppingCartRecipe::Table)
                    .col(ShoppingCartRecipe::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShoppingCartRecipe::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ShoppingCartRecipe {
    Table,
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}
