use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CreateRequestCmd, EngineError, FulfillCmd, MobileMoneyRequest, RequestStatus, ResultEngine,
    WalletTransactionKind, mobile_money,
    util::{
        ensure_positive, normalize_optional_text, normalize_phone_number,
        normalize_required_text,
    },
};

use super::{Engine, LedgerDelta, with_tx};

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 200;

/// Which requests a caller wants to see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestScope {
    /// Requests the caller created.
    #[default]
    Mine,
    /// Requests the caller accepted as fulfiller.
    Assigned,
    /// Pending requests from other users, available to accept.
    Open,
    /// Every request. Admin only.
    All,
}

impl RequestScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mine => "mine",
            Self::Assigned => "assigned",
            Self::Open => "open",
            Self::All => "all",
        }
    }
}

impl TryFrom<&str> for RequestScope {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mine" => Ok(Self::Mine),
            "assigned" => Ok(Self::Assigned),
            "open" => Ok(Self::Open),
            "all" => Ok(Self::All),
            other => Err(EngineError::Validation(format!(
                "invalid request scope: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestListFilter {
    pub scope: RequestScope,
    pub status: Option<RequestStatus>,
    pub limit: Option<u64>,
}

impl Engine {
    /// Creates a pending request and holds `amount + fees` from the requester.
    ///
    /// The hold is a `mobile_money_out` ledger entry whose reference is the
    /// request reference. Fees come from the active fee schedule.
    pub async fn create_request(&self, cmd: CreateRequestCmd) -> ResultEngine<MobileMoneyRequest> {
        ensure_positive(cmd.amount)?;
        let recipient_number = normalize_phone_number(&cmd.recipient_number, "recipient number")?;
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            let requester = self.require_active_user(&db_tx, cmd.requester_id).await?;
            let schedule = self.active_fee_schedule(&db_tx).await?;
            let fees = schedule.mobile_money_fee(cmd.amount)?;

            let request = MobileMoneyRequest::new(
                requester.id,
                cmd.amount,
                fees,
                cmd.provider,
                recipient_number,
                description,
                Utc::now(),
            )?;
            mobile_money::ActiveModel::from(&request)
                .insert(&db_tx)
                .await?;

            self.apply_delta_in(
                &db_tx,
                LedgerDelta::new(
                    requester.id,
                    WalletTransactionKind::MobileMoneyOut,
                    request.total_amount,
                    format!(
                        "Mobile money request {} to {} via {}",
                        request.reference,
                        request.recipient_number,
                        request.provider.as_str()
                    ),
                    request.reference.clone(),
                ),
            )
            .await?;

            tracing::info!(
                request_id = %request.id,
                requester_id = %request.requester_id,
                amount = request.amount.minor(),
                fees = request.fees.minor(),
                "mobile money request created"
            );
            Ok(request)
        })
    }

    /// Claims a pending request for `fulfiller_id`.
    ///
    /// The claim is one conditional `UPDATE`; when several users race for the
    /// same request exactly one of them sees a changed row.
    pub async fn accept_request(
        &self,
        request_id: Uuid,
        fulfiller_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let claimed = mobile_money::Entity::update_many()
                .col_expr(
                    mobile_money::Column::Status,
                    Expr::value(RequestStatus::Accepted.as_str()),
                )
                .col_expr(
                    mobile_money::Column::FulfillerId,
                    Expr::value(fulfiller_id.to_string()),
                )
                .col_expr(mobile_money::Column::AcceptedAt, Expr::value(Utc::now()))
                .filter(mobile_money::Column::Id.eq(request_id.to_string()))
                .filter(mobile_money::Column::Status.eq(RequestStatus::Pending.as_str()))
                .filter(mobile_money::Column::FulfillerId.is_null())
                .filter(mobile_money::Column::RequesterId.ne(fulfiller_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected
                == 1;

            if !claimed {
                let request = self.require_request(&db_tx, request_id).await?;
                self.require_active_user(&db_tx, fulfiller_id).await?;
                let err = claim_rejection(&request, fulfiller_id);
                tracing::warn!(request_id = %request_id, fulfiller_id = %fulfiller_id, "accept rejected: {err}");
                return Err(err);
            }

            self.require_active_user(&db_tx, fulfiller_id).await?;
            let request = self.require_request(&db_tx, request_id).await?;
            tracing::info!(
                request_id = %request_id,
                fulfiller_id = %fulfiller_id,
                "mobile money request accepted"
            );
            Ok(request)
        })
    }

    /// Records the fulfiller's proof of payment and moves the request to
    /// `fulfilled`.
    pub async fn fulfill_request(&self, cmd: FulfillCmd) -> ResultEngine<MobileMoneyRequest> {
        let transaction_id = normalize_required_text(&cmd.transaction_id, "transaction id")?;
        let sender_number = normalize_required_text(&cmd.sender_number, "sender number")?;
        let screenshot = normalize_optional_text(cmd.screenshot.as_deref());
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            let fulfilled = mobile_money::Entity::update_many()
                .col_expr(
                    mobile_money::Column::Status,
                    Expr::value(RequestStatus::Fulfilled.as_str()),
                )
                .col_expr(mobile_money::Column::FulfilledAt, Expr::value(Utc::now()))
                .col_expr(mobile_money::Column::TransactionId, Expr::value(transaction_id))
                .col_expr(mobile_money::Column::SenderNumber, Expr::value(sender_number))
                .col_expr(mobile_money::Column::Screenshot, Expr::value(screenshot))
                .col_expr(mobile_money::Column::Notes, Expr::value(notes))
                .filter(mobile_money::Column::Id.eq(cmd.request_id.to_string()))
                .filter(mobile_money::Column::Status.eq(RequestStatus::Accepted.as_str()))
                .filter(mobile_money::Column::FulfillerId.eq(cmd.fulfiller_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected
                == 1;

            self.require_active_user(&db_tx, cmd.fulfiller_id).await?;
            let request = self.require_request(&db_tx, cmd.request_id).await?;
            if !fulfilled {
                if request.status != RequestStatus::Accepted {
                    return Err(EngineError::InvalidState(format!(
                        "request is {}, expected accepted",
                        request.status.as_str()
                    )));
                }
                return Err(EngineError::Forbidden(
                    "only the assigned fulfiller can fulfill this request".to_string(),
                ));
            }

            tracing::info!(
                request_id = %cmd.request_id,
                fulfiller_id = %cmd.fulfiller_id,
                "mobile money request fulfilled"
            );
            Ok(request)
        })
    }

    /// Cancels a pending request and refunds the hold to the requester.
    ///
    /// Allowed for the requester and for admins.
    pub async fn cancel_request(
        &self,
        request_id: Uuid,
        caller_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let closed = self
                .close_pending(&db_tx, request_id, RequestStatus::Cancelled)
                .await?;
            let request = self.require_request(&db_tx, request_id).await?;
            let caller = self.require_user(&db_tx, caller_id).await?;
            if request.requester_id != caller.id && !caller.is_admin() {
                return Err(EngineError::Forbidden(
                    "only the requester or an admin can cancel this request".to_string(),
                ));
            }
            if !closed {
                return Err(EngineError::InvalidState(format!(
                    "request is {}, only pending requests can be cancelled",
                    request.status.as_str()
                )));
            }

            self.refund_hold(&db_tx, &request, "cancelled").await?;
            tracing::info!(
                request_id = %request_id,
                caller_id = %caller_id,
                refunded = request.total_amount.minor(),
                "mobile money request cancelled"
            );
            Ok(request)
        })
    }

    /// Expires a pending request and refunds the hold. Admin only.
    pub async fn expire_request(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let closed = self
                .close_pending(&db_tx, request_id, RequestStatus::Expired)
                .await?;
            self.require_admin(&db_tx, admin_id).await?;
            let request = self.require_request(&db_tx, request_id).await?;
            if !closed {
                return Err(EngineError::InvalidState(format!(
                    "request is {}, only pending requests can expire",
                    request.status.as_str()
                )));
            }

            self.refund_hold(&db_tx, &request, "expired").await?;
            tracing::info!(
                request_id = %request_id,
                admin_id = %admin_id,
                refunded = request.total_amount.minor(),
                "mobile money request expired"
            );
            Ok(request)
        })
    }

    /// Expires every request still pending that was created before `cutoff`.
    ///
    /// Each request is closed in its own transaction; requests that change
    /// state concurrently are skipped. Returns how many were expired.
    pub async fn expire_stale_requests(&self, cutoff: DateTime<Utc>) -> ResultEngine<u64> {
        let stale: Vec<String> = mobile_money::Entity::find()
            .select_only()
            .column(mobile_money::Column::Id)
            .filter(mobile_money::Column::Status.eq(RequestStatus::Pending.as_str()))
            .filter(mobile_money::Column::CreatedAt.lt(cutoff))
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut expired = 0;
        for id in stale {
            let Ok(request_id) = Uuid::parse_str(&id) else {
                tracing::warn!(id = %id, "stale request with invalid id, skipped");
                continue;
            };
            match self.expire_stale_request(request_id).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(request_id = %request_id, "failed to expire stale request: {err}");
                }
            }
        }

        if expired > 0 {
            tracing::info!(expired, cutoff = %cutoff, "stale mobile money requests expired");
        }
        Ok(expired)
    }

    async fn expire_stale_request(&self, request_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            if !self
                .close_pending(&db_tx, request_id, RequestStatus::Expired)
                .await?
            {
                tracing::warn!(request_id = %request_id, "stale request no longer pending, skipped");
                return Ok(false);
            }
            let request = self.require_request(&db_tx, request_id).await?;
            self.refund_hold(&db_tx, &request, "expired").await?;
            Ok(true)
        })
    }

    /// Reads one request.
    ///
    /// Pending requests are visible to everyone so they can be accepted;
    /// after that only participants and admins see them.
    pub async fn request(
        &self,
        request_id: Uuid,
        caller_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let caller = self.require_user(&db_tx, caller_id).await?;
            let request = self.require_request(&db_tx, request_id).await?;
            if request.status != RequestStatus::Pending
                && !request.involves(caller.id)
                && !caller.is_admin()
            {
                return Err(EngineError::KeyNotFound("request not exists".to_string()));
            }
            Ok(request)
        })
    }

    /// Lists requests for `caller_id`, newest first.
    pub async fn list_requests(
        &self,
        caller_id: Uuid,
        filter: &RequestListFilter,
    ) -> ResultEngine<Vec<MobileMoneyRequest>> {
        with_tx!(self, |db_tx| {
            let caller = self.require_user(&db_tx, caller_id).await?;
            let caller_key = caller.id.to_string();

            let mut query = mobile_money::Entity::find();
            query = match filter.scope {
                RequestScope::Mine => {
                    query.filter(mobile_money::Column::RequesterId.eq(caller_key))
                }
                RequestScope::Assigned => {
                    query.filter(mobile_money::Column::FulfillerId.eq(caller_key))
                }
                RequestScope::Open => query
                    .filter(mobile_money::Column::Status.eq(RequestStatus::Pending.as_str()))
                    .filter(mobile_money::Column::RequesterId.ne(caller_key)),
                RequestScope::All => {
                    if !caller.is_admin() {
                        return Err(EngineError::Forbidden(
                            "admin role required".to_string(),
                        ));
                    }
                    query
                }
            };
            if let Some(status) = filter.status {
                query = query.filter(mobile_money::Column::Status.eq(status.as_str()));
            }

            let limit = filter
                .limit
                .unwrap_or(DEFAULT_LIST_LIMIT)
                .clamp(1, MAX_LIST_LIMIT);
            let rows = query
                .order_by_desc(mobile_money::Column::CreatedAt)
                .order_by_desc(mobile_money::Column::Id)
                .limit(limit)
                .all(&db_tx)
                .await?;

            rows.into_iter()
                .map(MobileMoneyRequest::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Moves a pending request to `to`. Returns `false` when the request was
    /// not pending (or does not exist).
    async fn close_pending(
        &self,
        db_tx: &DatabaseTransaction,
        request_id: Uuid,
        to: RequestStatus,
    ) -> ResultEngine<bool> {
        let result = mobile_money::Entity::update_many()
            .col_expr(mobile_money::Column::Status, Expr::value(to.as_str()))
            .col_expr(mobile_money::Column::CancelledAt, Expr::value(Utc::now()))
            .filter(mobile_money::Column::Id.eq(request_id.to_string()))
            .filter(mobile_money::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Returns the full hold (`amount + fees`) to the requester.
    async fn refund_hold(
        &self,
        db_tx: &DatabaseTransaction,
        request: &MobileMoneyRequest,
        reason: &str,
    ) -> ResultEngine<()> {
        self.apply_delta_in(
            db_tx,
            LedgerDelta::new(
                request.requester_id,
                WalletTransactionKind::MobileMoneyIn,
                request.total_amount,
                format!("Refund for {reason} request {}", request.reference),
                request.refund_reference(),
            ),
        )
        .await?;
        Ok(())
    }
}

/// Why a claim on `request` by `claimant` did not go through.
pub(super) fn claim_rejection(request: &MobileMoneyRequest, claimant: Uuid) -> EngineError {
    if request.requester_id == claimant {
        return EngineError::SelfAcceptForbidden;
    }
    if request.fulfiller_id.is_some() {
        return EngineError::AlreadyClaimed("request already has a fulfiller".to_string());
    }
    EngineError::InvalidState(format!(
        "request is {}, expected pending",
        request.status.as_str()
    ))
}
