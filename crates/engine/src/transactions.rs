//! Business-level transaction records.
//!
//! Unlike ledger entries, a `Transaction` describes a whole settled event
//! (a verified mobile-money request, a wallet transfer) and points back at
//! the request or counterparty it came from.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    MobileMoney,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MobileMoney => "mobile_money",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mobile_money" => Ok(Self::MobileMoney),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub fees: Money,
    pub reference: String,
    pub mobile_money_request_id: Option<Uuid>,
    pub counterparty_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(
        user_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        fees: Money,
        reference: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            fees,
            reference,
            mobile_money_request_id: None,
            counterparty_id: None,
            description: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub fees: i64,
    #[sea_orm(unique)]
    pub reference: String,
    pub mobile_money_request_id: Option<String>,
    pub counterparty_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mobile_money::Entity",
        from = "Column::MobileMoneyRequestId",
        to = "super::mobile_money::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MobileMoneyRequest,
}

impl Related<super::mobile_money::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MobileMoneyRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount.minor()),
            fees: ActiveValue::Set(tx.fees.minor()),
            reference: ActiveValue::Set(tx.reference.clone()),
            mobile_money_request_id: ActiveValue::Set(
                tx.mobile_money_request_id.map(|id| id.to_string()),
            ),
            counterparty_id: ActiveValue::Set(tx.counterparty_id.map(|id| id.to_string())),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            fees: Money::new(model.fees),
            reference: model.reference,
            mobile_money_request_id: model
                .mobile_money_request_id
                .as_deref()
                .map(|id| parse_uuid(id, "request"))
                .transpose()?,
            counterparty_id: model
                .counterparty_id
                .as_deref()
                .map(|id| parse_uuid(id, "counterparty"))
                .transpose()?,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
