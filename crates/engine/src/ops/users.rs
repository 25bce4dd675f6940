use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Role, User, users,
    util::{normalize_required_text, normalize_username},
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a regular user with an empty wallet.
    pub async fn register_user(&self, username: &str, password: &str) -> ResultEngine<User> {
        self.create_user(username, password, Role::User).await
    }

    /// Creates an admin account. Used to bootstrap a deployment.
    pub async fn create_admin(&self, username: &str, password: &str) -> ResultEngine<User> {
        self.create_user(username, password, Role::Admin).await
    }

    async fn create_user(&self, username: &str, password: &str, role: Role) -> ResultEngine<User> {
        let username = normalize_username(username)?;
        let password = normalize_required_text(password, "password")?;

        with_tx!(self, |db_tx| {
            if self.find_user_by_username(&db_tx, &username).await?.is_some() {
                return Err(EngineError::ExistingKey(username));
            }
            let model = users::ActiveModel::new_user(
                Uuid::new_v4(),
                username,
                password,
                role,
                Utc::now(),
            )
            .insert(&db_tx)
            .await?;
            let user = User::try_from(model)?;
            tracing::info!(user_id = %user.id, role = role.as_str(), "user created");
            Ok(user)
        })
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| self.require_user(&db_tx, user_id).await)
    }

    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        let username = normalize_username(username)?;
        with_tx!(self, |db_tx| {
            self.find_user_by_username(&db_tx, &username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
        })
    }

    /// Enables or disables a user account. Admin only.
    ///
    /// Inactive users keep their balance; pending holds are untouched.
    pub async fn set_user_active(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        active: bool,
    ) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            if admin_id == user_id && !active {
                return Err(EngineError::Validation(
                    "admins cannot deactivate themselves".to_string(),
                ));
            }
            let updated = users::Entity::update_many()
                .col_expr(users::Column::IsActive, Expr::value(active))
                .filter(users::Column::Id.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            if updated == 0 {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }
            tracing::info!(admin_id = %admin_id, user_id = %user_id, active, "user activity changed");
            self.require_user(&db_tx, user_id).await
        })
    }
}
