//! Mobile-money request API endpoints.

use api_types::request::{
    FulfillmentView, Provider, RequestFulfill, RequestList, RequestListResponse, RequestNew,
    RequestScope, RequestStatus, RequestView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_provider(provider: engine::Provider) -> Provider {
    match provider {
        engine::Provider::Bkash => Provider::Bkash,
        engine::Provider::Nagad => Provider::Nagad,
        engine::Provider::Rocket => Provider::Rocket,
    }
}

fn map_status(status: engine::RequestStatus) -> RequestStatus {
    match status {
        engine::RequestStatus::Pending => RequestStatus::Pending,
        engine::RequestStatus::Accepted => RequestStatus::Accepted,
        engine::RequestStatus::Fulfilled => RequestStatus::Fulfilled,
        engine::RequestStatus::Verified => RequestStatus::Verified,
        engine::RequestStatus::Cancelled => RequestStatus::Cancelled,
        engine::RequestStatus::Expired => RequestStatus::Expired,
    }
}

pub(crate) fn map_request(request: engine::MobileMoneyRequest) -> RequestView {
    RequestView {
        id: request.id,
        reference: request.reference,
        requester_id: request.requester_id,
        provider: map_provider(request.provider),
        recipient_number: request.recipient_number,
        amount_minor: request.amount.minor(),
        fees_minor: request.fees.minor(),
        total_amount_minor: request.total_amount.minor(),
        description: request.description,
        status: map_status(request.status),
        fulfiller_id: request.fulfiller_id,
        admin_verified: request.admin_verified,
        verified_by_id: request.verified_by_id,
        fulfillment: request.fulfillment.map(|f| FulfillmentView {
            transaction_id: f.transaction_id,
            sender_number: f.sender_number,
            screenshot: f.screenshot,
            notes: f.notes,
        }),
        created_at: request.created_at,
        accepted_at: request.accepted_at,
        fulfilled_at: request.fulfilled_at,
        verified_at: request.verified_at,
        cancelled_at: request.cancelled_at,
    }
}

pub async fn request_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestNew>,
) -> Result<(StatusCode, Json<RequestView>), ServerError> {
    let provider = match payload.provider {
        Provider::Bkash => engine::Provider::Bkash,
        Provider::Nagad => engine::Provider::Nagad,
        Provider::Rocket => engine::Provider::Rocket,
    };
    let mut cmd = engine::CreateRequestCmd::new(
        user.user_id()?,
        provider,
        payload.recipient_number,
        engine::Money::new(payload.amount_minor),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let request = state.engine.create_request(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_request(request))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<RequestList>,
) -> Result<Json<RequestListResponse>, ServerError> {
    let scope = match query.scope.unwrap_or_default() {
        RequestScope::Mine => engine::RequestScope::Mine,
        RequestScope::Assigned => engine::RequestScope::Assigned,
        RequestScope::Open => engine::RequestScope::Open,
        RequestScope::All => engine::RequestScope::All,
    };
    let status = query.status.map(|status| match status {
        RequestStatus::Pending => engine::RequestStatus::Pending,
        RequestStatus::Accepted => engine::RequestStatus::Accepted,
        RequestStatus::Fulfilled => engine::RequestStatus::Fulfilled,
        RequestStatus::Verified => engine::RequestStatus::Verified,
        RequestStatus::Cancelled => engine::RequestStatus::Cancelled,
        RequestStatus::Expired => engine::RequestStatus::Expired,
    });
    let filter = engine::RequestListFilter {
        scope,
        status,
        limit: query.limit,
    };

    let requests = state
        .engine
        .list_requests(user.user_id()?, &filter)
        .await?;
    Ok(Json(RequestListResponse {
        requests: requests.into_iter().map(map_request).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state.engine.request(request_id, user.user_id()?).await?;
    Ok(Json(map_request(request)))
}

pub async fn accept(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .accept_request(request_id, user.user_id()?)
        .await?;
    Ok(Json(map_request(request)))
}

pub async fn fulfill(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RequestFulfill>,
) -> Result<Json<RequestView>, ServerError> {
    let mut cmd = engine::FulfillCmd::new(
        request_id,
        user.user_id()?,
        payload.transaction_id,
        payload.sender_number,
    );
    if let Some(screenshot) = payload.screenshot {
        cmd = cmd.screenshot(screenshot);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let request = state.engine.fulfill_request(cmd).await?;
    Ok(Json(map_request(request)))
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .cancel_request(request_id, user.user_id()?)
        .await?;
    Ok(Json(map_request(request)))
}
