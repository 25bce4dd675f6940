//! Wallet API endpoints.

use api_types::wallet::{
    AdminCredit, WalletTransactionKind as ApiKind, WalletTransactionList,
    WalletTransactionListResponse, WalletTransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: engine::WalletTransactionKind) -> ApiKind {
    match kind {
        engine::WalletTransactionKind::Credit => ApiKind::Credit,
        engine::WalletTransactionKind::Debit => ApiKind::Debit,
        engine::WalletTransactionKind::AdminCredit => ApiKind::AdminCredit,
        engine::WalletTransactionKind::MobileMoneyIn => ApiKind::MobileMoneyIn,
        engine::WalletTransactionKind::MobileMoneyOut => ApiKind::MobileMoneyOut,
        engine::WalletTransactionKind::Fee => ApiKind::Fee,
        engine::WalletTransactionKind::TransferIn => ApiKind::TransferIn,
        engine::WalletTransactionKind::TransferOut => ApiKind::TransferOut,
    }
}

fn map_entry(entry: engine::WalletTransaction) -> WalletTransactionView {
    WalletTransactionView {
        id: entry.id,
        kind: map_kind(entry.kind),
        amount_minor: entry.amount.minor(),
        description: entry.description,
        reference: entry.reference,
        balance_before_minor: entry.balance_before.minor(),
        balance_after_minor: entry.balance_after.minor(),
        created_at: entry.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<WalletTransactionList>,
) -> Result<Json<WalletTransactionListResponse>, ServerError> {
    let user_id = user.user_id()?;
    let (entries, next_cursor) = state
        .engine
        .wallet_transactions_page(user_id, user_id, query.limit, query.cursor.as_deref())
        .await?;

    Ok(Json(WalletTransactionListResponse {
        transactions: entries.into_iter().map(map_entry).collect(),
        next_cursor,
    }))
}

pub async fn admin_credit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<AdminCredit>,
) -> Result<(StatusCode, Json<WalletTransactionView>), ServerError> {
    let entry = state
        .engine
        .admin_credit(
            user.user_id()?,
            target_id,
            engine::Money::new(payload.amount_minor),
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_entry(entry))))
}
