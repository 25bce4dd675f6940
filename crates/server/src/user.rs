//! The module contains the authenticated user and the account endpoints.

use api_types::user::{Role, UserNew, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::entity::prelude::*;

use crate::{ServerError, server::ServerState};

/// Read-only view of the `users` table used by the auth middleware.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn user_id(&self) -> Result<Uuid, ServerError> {
        Uuid::parse_str(&self.id).map_err(|_| ServerError::Generic("invalid user id".to_string()))
    }
}

pub(crate) fn map_user(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        role: match user.role {
            engine::Role::User => Role::User,
            engine::Role::Admin => Role::Admin,
        },
        is_active: user.is_active,
        currency: api_types::Currency::Bdt,
        wallet_balance_minor: user.wallet_balance.minor(),
        created_at: user.created_at,
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .register_user(&payload.username, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn me(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(user.user_id()?).await?;
    Ok(Json(map_user(user)))
}
