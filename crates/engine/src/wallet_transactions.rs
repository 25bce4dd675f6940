//! Ledger entries.
//!
//! A `WalletTransaction` records one change of a user's `wallet_balance`.
//! Rows are insert-only: `balance_after - balance_before` always equals the
//! signed amount implied by `kind`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    Credit,
    Debit,
    AdminCredit,
    MobileMoneyIn,
    MobileMoneyOut,
    Fee,
    TransferIn,
    TransferOut,
}

impl WalletTransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::AdminCredit => "admin_credit",
            Self::MobileMoneyIn => "mobile_money_in",
            Self::MobileMoneyOut => "mobile_money_out",
            Self::Fee => "fee",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
        }
    }

    /// Debit-class kinds take money out of the wallet.
    pub fn is_debit(self) -> bool {
        matches!(
            self,
            Self::Debit | Self::MobileMoneyOut | Self::Fee | Self::TransferOut
        )
    }

    /// Signed balance change for a positive `amount` of this kind.
    pub fn signed(self, amount: Money) -> Money {
        if self.is_debit() { -amount } else { amount }
    }
}

impl TryFrom<&str> for WalletTransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "admin_credit" => Ok(Self::AdminCredit),
            "mobile_money_in" => Ok(Self::MobileMoneyIn),
            "mobile_money_out" => Ok(Self::MobileMoneyOut),
            "fee" => Ok(Self::Fee),
            "transfer_in" => Ok(Self::TransferIn),
            "transfer_out" => Ok(Self::TransferOut),
            other => Err(EngineError::Validation(format!(
                "invalid wallet transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: WalletTransactionKind,
    /// Always positive; `kind` gives the direction.
    pub amount: Money,
    pub description: String,
    pub reference: String,
    pub balance_before: Money,
    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Signed change this entry applied to the wallet.
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub description: String,
    #[sea_orm(unique)]
    pub reference: String,
    pub balance_before: i64,
    pub balance_after: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletTransaction> for ActiveModel {
    fn from(entry: &WalletTransaction) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            user_id: ActiveValue::Set(entry.user_id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount.minor()),
            description: ActiveValue::Set(entry.description.clone()),
            reference: ActiveValue::Set(entry.reference.clone()),
            balance_before: ActiveValue::Set(entry.balance_before.minor()),
            balance_after: ActiveValue::Set(entry.balance_after.minor()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet transaction")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            kind: WalletTransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            description: model.description,
            reference: model.reference,
            balance_before: Money::new(model.balance_before),
            balance_after: Money::new(model.balance_after),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_kind() {
        let amount = Money::new(500);
        assert_eq!(WalletTransactionKind::MobileMoneyOut.signed(amount), Money::new(-500));
        assert_eq!(WalletTransactionKind::Fee.signed(amount), Money::new(-500));
        assert_eq!(WalletTransactionKind::MobileMoneyIn.signed(amount), amount);
        assert_eq!(WalletTransactionKind::AdminCredit.signed(amount), amount);
    }

    #[test]
    fn kind_roundtrips_through_storage_string() {
        for kind in [
            WalletTransactionKind::Credit,
            WalletTransactionKind::Debit,
            WalletTransactionKind::AdminCredit,
            WalletTransactionKind::MobileMoneyIn,
            WalletTransactionKind::MobileMoneyOut,
            WalletTransactionKind::Fee,
            WalletTransactionKind::TransferIn,
            WalletTransactionKind::TransferOut,
        ] {
            assert_eq!(WalletTransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }
}
