//! Mobile-money requests.
//!
//! A requester asks for money to be sent to an external bKash/Nagad/Rocket
//! number. A peer (the fulfiller) sends it and proves it; an admin verifies
//! and the requester's wallet is settled.
//!
//! ```text
//! pending ──accept/approve──▶ accepted ──fulfill──▶ fulfilled ──verify──▶ verified
//!    │
//!    ├──cancel──▶ cancelled
//!    └──expire──▶ expired
//! ```

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Bkash,
    Nagad,
    Rocket,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
            Self::Rocket => "rocket",
        }
    }
}

impl TryFrom<&str> for Provider {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bkash" => Ok(Self::Bkash),
            "nagad" => Ok(Self::Nagad),
            "rocket" => Ok(Self::Rocket),
            other => Err(EngineError::Validation(format!(
                "unsupported provider: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Fulfilled,
    Verified,
    Cancelled,
    Expired,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Fulfilled => "fulfilled",
            Self::Verified => "verified",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "fulfilled" => Ok(Self::Fulfilled),
            "verified" => Ok(Self::Verified),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(EngineError::Validation(format!(
                "invalid request status: {other}"
            ))),
        }
    }
}

/// Proof submitted by the fulfiller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub transaction_id: String,
    pub sender_number: String,
    pub screenshot: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileMoneyRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub amount: Money,
    pub fees: Money,
    /// `amount + fees`, held from the requester's wallet at creation.
    pub total_amount: Money,
    pub provider: Provider,
    pub recipient_number: String,
    pub description: Option<String>,
    pub reference: String,
    pub status: RequestStatus,
    pub fulfiller_id: Option<Uuid>,
    pub admin_verified: bool,
    pub verified_by_id: Option<Uuid>,
    pub fulfillment: Option<Fulfillment>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl MobileMoneyRequest {
    pub(crate) fn new(
        requester_id: Uuid,
        amount: Money,
        fees: Money,
        provider: Provider,
        recipient_number: String,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let total_amount = amount
            .checked_add(fees)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        let id = Uuid::new_v4();
        Ok(Self {
            id,
            requester_id,
            amount,
            fees,
            total_amount,
            provider,
            recipient_number,
            description,
            reference: new_reference(id),
            status: RequestStatus::Pending,
            fulfiller_id: None,
            admin_verified: false,
            verified_by_id: None,
            fulfillment: None,
            created_at,
            accepted_at: None,
            fulfilled_at: None,
            verified_at: None,
            cancelled_at: None,
        })
    }

    /// Reference of the refund entry written on cancel/expire.
    pub fn refund_reference(&self) -> String {
        format!("REFUND-{}", self.reference)
    }

    /// Reference of the settlement credit written on verify.
    pub fn settlement_reference(&self) -> String {
        format!("SETTLE-{}", self.reference)
    }

    /// Whether `user_id` takes part in this request.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.fulfiller_id == Some(user_id)
    }
}

/// `MM` followed by 20 upper-case hex digits of the request id.
fn new_reference(id: Uuid) -> String {
    let hex = id.simple().to_string().to_ascii_uppercase();
    format!("MM{}", &hex[..20])
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mobile_money_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub requester_id: String,
    pub amount: i64,
    pub fees: i64,
    pub total_amount: i64,
    pub provider: String,
    pub recipient_number: String,
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub reference: String,
    pub status: String,
    pub fulfiller_id: Option<String>,
    pub admin_verified: bool,
    pub verified_by_id: Option<String>,
    pub transaction_id: Option<String>,
    pub sender_number: Option<String>,
    pub screenshot: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub accepted_at: Option<DateTimeUtc>,
    pub fulfilled_at: Option<DateTimeUtc>,
    pub verified_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequesterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Requester,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MobileMoneyRequest> for ActiveModel {
    fn from(request: &MobileMoneyRequest) -> Self {
        let fulfillment = request.fulfillment.as_ref();
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            requester_id: ActiveValue::Set(request.requester_id.to_string()),
            amount: ActiveValue::Set(request.amount.minor()),
            fees: ActiveValue::Set(request.fees.minor()),
            total_amount: ActiveValue::Set(request.total_amount.minor()),
            provider: ActiveValue::Set(request.provider.as_str().to_string()),
            recipient_number: ActiveValue::Set(request.recipient_number.clone()),
            description: ActiveValue::Set(request.description.clone()),
            reference: ActiveValue::Set(request.reference.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            fulfiller_id: ActiveValue::Set(request.fulfiller_id.map(|id| id.to_string())),
            admin_verified: ActiveValue::Set(request.admin_verified),
            verified_by_id: ActiveValue::Set(request.verified_by_id.map(|id| id.to_string())),
            transaction_id: ActiveValue::Set(fulfillment.map(|f| f.transaction_id.clone())),
            sender_number: ActiveValue::Set(fulfillment.map(|f| f.sender_number.clone())),
            screenshot: ActiveValue::Set(fulfillment.and_then(|f| f.screenshot.clone())),
            notes: ActiveValue::Set(fulfillment.and_then(|f| f.notes.clone())),
            created_at: ActiveValue::Set(request.created_at),
            accepted_at: ActiveValue::Set(request.accepted_at),
            fulfilled_at: ActiveValue::Set(request.fulfilled_at),
            verified_at: ActiveValue::Set(request.verified_at),
            cancelled_at: ActiveValue::Set(request.cancelled_at),
        }
    }
}

impl TryFrom<Model> for MobileMoneyRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let fulfillment = match (model.transaction_id, model.sender_number) {
            (Some(transaction_id), Some(sender_number)) => Some(Fulfillment {
                transaction_id,
                sender_number,
                screenshot: model.screenshot,
                notes: model.notes,
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "request")?,
            requester_id: parse_uuid(&model.requester_id, "requester")?,
            amount: Money::new(model.amount),
            fees: Money::new(model.fees),
            total_amount: Money::new(model.total_amount),
            provider: Provider::try_from(model.provider.as_str())?,
            recipient_number: model.recipient_number,
            description: model.description,
            reference: model.reference,
            status: RequestStatus::try_from(model.status.as_str())?,
            fulfiller_id: model
                .fulfiller_id
                .as_deref()
                .map(|id| parse_uuid(id, "fulfiller"))
                .transpose()?,
            admin_verified: model.admin_verified,
            verified_by_id: model
                .verified_by_id
                .as_deref()
                .map(|id| parse_uuid(id, "verifier"))
                .transpose()?,
            fulfillment,
            created_at: model.created_at,
            accepted_at: model.accepted_at,
            fulfilled_at: model.fulfilled_at,
            verified_at: model.verified_at,
            cancelled_at: model.cancelled_at,
        })
    }
}
