use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod admin;
mod requests;
mod server;
mod transfers;
mod user;
mod wallets;

pub mod types {
    pub mod user {
        pub use api_types::user::{Role, UserActive, UserNew, UserView};
    }

    pub mod wallet {
        pub use api_types::wallet::{
            AdminCredit, WalletTransactionKind, WalletTransactionList,
            WalletTransactionListResponse, WalletTransactionView,
        };
    }

    pub mod fees {
        pub use api_types::fees::{FeeConfig, FeeConfigView};
    }

    pub mod request {
        pub use api_types::request::{
            FulfillmentView, Provider, RequestFulfill, RequestList, RequestListResponse,
            RequestNew, RequestScope, RequestStatus, RequestView,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferCreated, TransferNew};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) | EngineError::RequesterMissing(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState(_)
        | EngineError::AlreadyClaimed(_)
        | EngineError::SelfAcceptForbidden
        | EngineError::DuplicateReference(_)
        | EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Validation(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidCursor(_)
        | EngineError::InsufficientBalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
