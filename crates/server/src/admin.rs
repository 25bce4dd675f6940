//! Admin API endpoints: verification gate, fee schedule and accounts.
//!
//! Role checks happen in the engine; these handlers only translate.

use api_types::{
    fees::{FeeConfig, FeeConfigView},
    request::RequestView,
    user::{UserActive, UserView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, requests::map_request, server::ServerState, user};

fn map_fees(schedule: engine::FeeSchedule) -> FeeConfigView {
    FeeConfigView {
        id: schedule.id,
        transfer_fee_bp: schedule.transfer_fee.basis_points(),
        mobile_money_fee_bp: schedule.mobile_money_fee.basis_points(),
        minimum_fee_minor: schedule.minimum_fee.minor(),
        maximum_fee_minor: schedule.maximum_fee.minor(),
        created_by: schedule.created_by,
        created_at: schedule.created_at,
    }
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .approve_request(request_id, user.user_id()?)
        .await?;
    Ok(Json(map_request(request)))
}

pub async fn verify(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .verify_request(request_id, user.user_id()?)
        .await?;
    Ok(Json(map_request(request)))
}

pub async fn expire(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .expire_request(request_id, user.user_id()?)
        .await?;
    Ok(Json(map_request(request)))
}

pub async fn fees_get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<FeeConfigView>, ServerError> {
    Ok(Json(map_fees(state.engine.fee_schedule().await?)))
}

pub async fn fees_set(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FeeConfig>,
) -> Result<Json<FeeConfigView>, ServerError> {
    let schedule = engine::FeeSchedule::new(
        engine::Percent::from_basis_points(payload.transfer_fee_bp)?,
        engine::Percent::from_basis_points(payload.mobile_money_fee_bp)?,
        engine::Money::new(payload.minimum_fee_minor),
        engine::Money::new(payload.maximum_fee_minor),
    )?;
    let saved = state
        .engine
        .set_fee_schedule(user.user_id()?, schedule)
        .await?;
    Ok(Json(map_fees(saved)))
}

pub async fn user_active(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<UserActive>,
) -> Result<Json<UserView>, ServerError> {
    let target = state
        .engine
        .set_user_active(user.user_id()?, target_id, payload.active)
        .await?;
    Ok(Json(user::map_user(target)))
}
