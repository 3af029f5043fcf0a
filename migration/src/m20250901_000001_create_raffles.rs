use sea_orm_migration::prelude::*;

/// Raffles (numbered-ticket drawings)
#[derive(DeriveIden)]
pub(crate) enum Raffles {
    Table,
    Id,
    Title,
    Description,
    Images,
    PricePerNumber,
    TotalNumbers,
    DrawDate,
    Status,
    WinnerNumber,
    WinnerName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `images` holds a JSON-encoded array of path references (NULL = no images).
/// `status` is one of `active`, `closed`, `cancelled`.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Raffles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Raffles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Raffles::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Raffles::Description).text().not_null())
                    .col(ColumnDef::new(Raffles::Images).text().null())
                    .col(ColumnDef::new(Raffles::PricePerNumber).double().not_null())
                    .col(ColumnDef::new(Raffles::TotalNumbers).integer().not_null())
                    .col(
                        ColumnDef::new(Raffles::DrawDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Raffles::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Raffles::WinnerNumber).integer().null())
                    .col(ColumnDef::new(Raffles::WinnerName).string_len(255).null())
                    .col(
                        ColumnDef::new(Raffles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Raffles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // status filter on the public listing
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_raffles_status")
                    .table(Raffles::Table)
                    .col(Raffles::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Raffles::Table).to_owned())
            .await
    }
}
