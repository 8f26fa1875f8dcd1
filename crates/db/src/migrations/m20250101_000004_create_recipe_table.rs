//! Create recipe table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recipe::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Recipe::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Recipe::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Recipe::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Recipe::Image).text().not_null())
                    .col(ColumnDef::new(Recipe::Text).text().not_null())
                    .col(
                        ColumnDef::new(Recipe::CookingTime)
                            .integer()
                            .not_null()
                            .check(Expr::col(Recipe::CookingTime).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Recipe::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_author")
                            .from(Recipe::Table, Recipe::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for author-filtered listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_author_id")
                    .table(Recipe::Table)
                    .col(Recipe::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_created_at")
                    .table(Recipe::Table)
                    .col(Recipe::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recipe::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
    AuthorId,
    Name,
    Image,
    Text,
    CookingTime,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
