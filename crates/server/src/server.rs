use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::{net::SocketAddr, sync::Arc};

use crate::{ServerError, admin, requests, transfers, user, wallets};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves Basic credentials to a `users` row and stores it in the request
/// extensions for the handlers.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let unauthorized = || EngineError::Unauthorized("invalid credentials".to_string());
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(EngineError::Unauthorized("missing credentials".to_string()).into());
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(unauthorized().into());
    }

    let username = auth_header.username().trim().to_lowercase();
    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(EngineError::from)?;

    let Some(user) = user else {
        return Err(unauthorized().into());
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/me", get(user::me))
        .route("/wallet/transactions", get(wallets::list))
        .route("/transfers", post(transfers::transfer_new))
        .route("/requests", post(requests::request_new).get(requests::list))
        .route("/requests/{id}", get(requests::get))
        .route("/requests/{id}/accept", post(requests::accept))
        .route("/requests/{id}/fulfill", post(requests::fulfill))
        .route("/requests/{id}/cancel", post(requests::cancel))
        .route("/admin/requests/{id}/approve", post(admin::approve))
        .route("/admin/requests/{id}/verify", post(admin::verify))
        .route("/admin/requests/{id}/expire", post(admin::expire))
        .route("/admin/fees", get(admin::fees_get).put(admin::fees_set))
        .route("/admin/users/{id}/credit", post(wallets::admin_credit))
        .route("/admin/users/{id}/active", post(admin::user_active))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/register", post(user::register))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
