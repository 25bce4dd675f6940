use sea_orm_migration::prelude::*;

use super::m20260901_000000_init::MobileMoneyRequests;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Open-request listings and the expiry sweep both filter on
/// `(status, created_at)`.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-mobile_money_requests-status-created_at")
                    .table(MobileMoneyRequests::Table)
                    .col(MobileMoneyRequests::Status)
                    .col(MobileMoneyRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mobile_money_requests-fulfiller_id")
                    .table(MobileMoneyRequests::Table)
                    .col(MobileMoneyRequests::FulfillerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-mobile_money_requests-fulfiller_id")
                    .table(MobileMoneyRequests::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx-mobile_money_requests-status-created_at")
                    .table(MobileMoneyRequests::Table)
                    .to_owned(),
            )
            .await
    }
}
