//! Create ingredient table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ingredient::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ingredient::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ingredient::Name).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Ingredient::MeasurementUnit)
                            .string_len(150)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (name, measurement_unit) - catalog-wide uniqueness
        manager
            .create_index(
                Index::create()
                    .name("idx_ingredient_name_unit")
                    .table(Ingredient::Table)
                    .col(Ingredient::Name)
                    .col(Ingredient::MeasurementUnit)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: name (for prefix search)
        manager
            .create_index(
                Index::create()
                    .name("idx_ingredient_name")
                    .table(Ingredient::Table)
                    .col(Ingredient::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ingredient::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ingredient {
    Table,
    Id,
    Name,
    MeasurementUnit,
}
