//! Initial schema.
//!
//! - `users`: accounts and the wallet balance
//! - `fee_configs`: fee schedules, one active at a time
//! - `mobile_money_requests`: the request lifecycle
//! - `wallet_transactions`: append-only ledger entries
//! - `transactions`: settled business events

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    WalletBalance,
    Role,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum FeeConfigs {
    Table,
    Id,
    TransferFeeBp,
    MobileMoneyFeeBp,
    MinimumFee,
    MaximumFee,
    IsActive,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum MobileMoneyRequests {
    Table,
    Id,
    RequesterId,
    Amount,
    Fees,
    TotalAmount,
    Provider,
    RecipientNumber,
    Description,
    Reference,
    Status,
    FulfillerId,
    AdminVerified,
    VerifiedById,
    TransactionId,
    SenderNumber,
    Screenshot,
    Notes,
    CreatedAt,
    AcceptedAt,
    FulfilledAt,
    VerifiedAt,
    CancelledAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    UserId,
    Kind,
    Amount,
    Description,
    Reference,
    BalanceBefore,
    BalanceAfter,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Kind,
    Amount,
    Fees,
    Reference,
    MobileMoneyRequestId,
    CounterpartyId,
    Description,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(
                        ColumnDef::new(Users::WalletBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::col(Users::WalletBalance).gte(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-username-unique")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Fee configs
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FeeConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeeConfigs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FeeConfigs::TransferFeeBp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeeConfigs::MobileMoneyFeeBp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FeeConfigs::MinimumFee).big_integer().not_null())
                    .col(ColumnDef::new(FeeConfigs::MaximumFee).big_integer().not_null())
                    .col(ColumnDef::new(FeeConfigs::IsActive).boolean().not_null())
                    .col(ColumnDef::new(FeeConfigs::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(FeeConfigs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Mobile money requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MobileMoneyRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::RequesterId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Fees)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::RecipientNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MobileMoneyRequests::Description).string())
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Reference)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MobileMoneyRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(MobileMoneyRequests::FulfillerId).string())
                    .col(
                        ColumnDef::new(MobileMoneyRequests::AdminVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(MobileMoneyRequests::VerifiedById).string())
                    .col(ColumnDef::new(MobileMoneyRequests::TransactionId).string())
                    .col(ColumnDef::new(MobileMoneyRequests::SenderNumber).string())
                    .col(ColumnDef::new(MobileMoneyRequests::Screenshot).string())
                    .col(ColumnDef::new(MobileMoneyRequests::Notes).string())
                    .col(
                        ColumnDef::new(MobileMoneyRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MobileMoneyRequests::AcceptedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MobileMoneyRequests::FulfilledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MobileMoneyRequests::VerifiedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MobileMoneyRequests::CancelledAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mobile_money_requests-requester_id")
                            .from(MobileMoneyRequests::Table, MobileMoneyRequests::RequesterId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mobile_money_requests-fulfiller_id")
                            .from(MobileMoneyRequests::Table, MobileMoneyRequests::FulfillerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mobile_money_requests-reference-unique")
                    .table(MobileMoneyRequests::Table)
                    .col(MobileMoneyRequests::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mobile_money_requests-requester_id")
                    .table(MobileMoneyRequests::Table)
                    .col(MobileMoneyRequests::RequesterId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Wallet transactions (ledger)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletTransactions::UserId).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Reference)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::col(WalletTransactions::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-user_id")
                            .from(WalletTransactions::Table, WalletTransactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-reference-unique")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-user_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::UserId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Fees).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Reference).string().not_null())
                    .col(ColumnDef::new(Transactions::MobileMoneyRequestId).string())
                    .col(ColumnDef::new(Transactions::CounterpartyId).string())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-mobile_money_request_id")
                            .from(Transactions::Table, Transactions::MobileMoneyRequestId)
                            .to(MobileMoneyRequests::Table, MobileMoneyRequests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reference-unique")
                    .table(Transactions::Table)
                    .col(Transactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MobileMoneyRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeeConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
