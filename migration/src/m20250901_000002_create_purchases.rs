use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_raffles::Raffles;

/// Purchases (one claimed number per row)
#[derive(DeriveIden)]
enum Purchases {
    Table,
    Id,
    RaffleId,
    BuyerName,
    BuyerPhone,
    BuyerEmail,
    Number,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// The unique index over (raffle_id, number) is what makes a number sellable
/// at most once; the purchase service relies on its violation as the conflict
/// signal.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::RaffleId).integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::BuyerName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::BuyerPhone)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Purchases::BuyerEmail).string_len(255).null())
                    .col(ColumnDef::new(Purchases::Number).integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // SQLite cannot add foreign keys after the fact, so it lives in CREATE TABLE
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_raffle")
                            .from(Purchases::Table, Purchases::RaffleId)
                            .to(Raffles::Table, Raffles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_purchases_raffle_number")
                    .table(Purchases::Table)
                    .col(Purchases::RaffleId)
                    .col(Purchases::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Purchases::Table).to_owned())
            .await
    }
}
