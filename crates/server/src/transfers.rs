//! Wallet transfer endpoint.

use api_types::transfer::{TransferCreated, TransferNew};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState, user};

pub async fn transfer_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let mut cmd = engine::TransferCmd::new(
        user.user_id()?,
        payload.recipient_username,
        engine::Money::new(payload.amount_minor),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let receipt = state.engine.transfer(cmd).await?;
    let balance_after = receipt
        .fee
        .as_ref()
        .map_or(receipt.debit.balance_after, |fee| fee.balance_after);

    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            id: receipt.transaction.id,
            reference: receipt.transaction.reference,
            amount_minor: receipt.transaction.amount.minor(),
            fees_minor: receipt.transaction.fees.minor(),
            balance_after_minor: balance_after.minor(),
        }),
    ))
}
