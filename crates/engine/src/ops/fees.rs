use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{FeeSchedule, ResultEngine, fees};

use super::{Engine, with_tx};

impl Engine {
    /// The fee schedule currently in force, or the zero schedule when no
    /// admin has configured one.
    pub async fn fee_schedule(&self) -> ResultEngine<FeeSchedule> {
        with_tx!(self, |db_tx| self.active_fee_schedule(&db_tx).await)
    }

    /// Replaces the active fee schedule. Admin only.
    ///
    /// Old schedules are kept (inactive) so past fees can be audited.
    pub async fn set_fee_schedule(
        &self,
        admin_id: Uuid,
        schedule: FeeSchedule,
    ) -> ResultEngine<FeeSchedule> {
        schedule.validate()?;
        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, admin_id).await?;

            fees::Entity::update_many()
                .col_expr(fees::Column::IsActive, Expr::value(false))
                .filter(fees::Column::IsActive.eq(true))
                .exec(&db_tx)
                .await?;

            let model = fees::ActiveModel::active_from(
                &schedule,
                Uuid::new_v4(),
                &admin.username,
                Utc::now(),
            )
            .insert(&db_tx)
            .await?;
            let saved = FeeSchedule::try_from(model)?;

            tracing::info!(
                admin_id = %admin_id,
                transfer_fee = %saved.transfer_fee,
                mobile_money_fee = %saved.mobile_money_fee,
                minimum_fee = saved.minimum_fee.minor(),
                maximum_fee = saved.maximum_fee.minor(),
                "fee schedule updated"
            );
            Ok(saved)
        })
    }

    pub(super) async fn active_fee_schedule(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<FeeSchedule> {
        let active = fees::Entity::find()
            .filter(fees::Column::IsActive.eq(true))
            .order_by_desc(fees::Column::CreatedAt)
            .one(db_tx)
            .await?;
        match active {
            Some(model) => FeeSchedule::try_from(model),
            None => Ok(FeeSchedule::default()),
        }
    }
}
