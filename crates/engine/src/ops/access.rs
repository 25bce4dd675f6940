use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MobileMoneyRequest, ResultEngine, Role, User, mobile_money, users};

use super::Engine;

impl Engine {
    pub(super) async fn find_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<Option<User>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn find_user_by_username(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<Option<User>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username.to_string()))
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        self.find_user(db, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Inactive users keep their balance but cannot start new money movements.
    pub(super) async fn require_active_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, user_id).await?;
        if !user.is_active {
            return Err(EngineError::Forbidden("user is inactive".to_string()));
        }
        Ok(user)
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, user_id).await?;
        if user.role != Role::Admin || !user.is_active {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }

    pub(super) async fn find_request(
        &self,
        db: &DatabaseTransaction,
        request_id: Uuid,
    ) -> ResultEngine<Option<MobileMoneyRequest>> {
        mobile_money::Entity::find_by_id(request_id.to_string())
            .one(db)
            .await?
            .map(MobileMoneyRequest::try_from)
            .transpose()
    }

    pub(super) async fn require_request(
        &self,
        db: &DatabaseTransaction,
        request_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        self.find_request(db, request_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("request not exists".to_string()))
    }
}
