//! Create follows table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follows::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Follows::TargetId).big_integer().not_null())
                    .col(ColumnDef::new(Follows::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Follows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_user")
                            .from(Follows::Table, Follows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_target")
                            .from(Follows::Table, Follows::TargetId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, target_id) - the ON CONFLICT target for new edges
        manager
            .create_index(
                Index::create()
                    .name("idx_follows_user_target")
                    .table(Follows::Table)
                    .col(Follows::UserId)
                    .col(Follows::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (target_id, status) (for listing followers and incoming requests)
        manager
            .create_index(
                Index::create()
                    .name("idx_follows_target_status")
                    .table(Follows::Table)
                    .col(Follows::TargetId)
                    .col(Follows::Status)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, status) (for listing following)
        manager
            .create_index(
                Index::create()
                    .name("idx_follows_user_status")
                    .table(Follows::Table)
                    .col(Follows::UserId)
                    .col(Follows::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Follows {
    Table,
    Id,
    UserId,
    TargetId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
