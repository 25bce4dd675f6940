//! Admin verification gate.
//!
//! `verify_request` is the only path that credits a requester for a
//! mobile-money request. The status flip `fulfilled -> verified` is a
//! conditional update, so a request settles at most once even when several
//! admins verify it at the same time.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, MobileMoneyRequest, RequestStatus, ResultEngine, Transaction, TransactionKind,
    WalletTransactionKind, mobile_money, transactions,
};

use super::{Engine, LedgerDelta, requests::claim_rejection, with_tx};

impl Engine {
    /// Confirms a fulfilled request and credits `amount` to the requester.
    ///
    /// Fees stay with the platform. Writes a settlement ledger entry and a
    /// `mobile_money` transaction record in the same database transaction.
    pub async fn verify_request(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let verified = mobile_money::Entity::update_many()
                .col_expr(
                    mobile_money::Column::Status,
                    Expr::value(RequestStatus::Verified.as_str()),
                )
                .col_expr(mobile_money::Column::AdminVerified, Expr::value(true))
                .col_expr(
                    mobile_money::Column::VerifiedById,
                    Expr::value(admin_id.to_string()),
                )
                .col_expr(mobile_money::Column::VerifiedAt, Expr::value(now))
                .filter(mobile_money::Column::Id.eq(request_id.to_string()))
                .filter(mobile_money::Column::Status.eq(RequestStatus::Fulfilled.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected
                == 1;

            self.require_admin(&db_tx, admin_id).await?;
            let request = self.require_request(&db_tx, request_id).await?;
            if !verified {
                tracing::warn!(
                    request_id = %request_id,
                    status = request.status.as_str(),
                    "verify rejected, request not fulfilled"
                );
                return Err(EngineError::InvalidState(format!(
                    "request is {}, expected fulfilled",
                    request.status.as_str()
                )));
            }
            if self.find_user(&db_tx, request.requester_id).await?.is_none() {
                return Err(EngineError::RequesterMissing(request.reference.clone()));
            }

            self.apply_delta_in(
                &db_tx,
                LedgerDelta::new(
                    request.requester_id,
                    WalletTransactionKind::Credit,
                    request.amount,
                    format!("Settlement for mobile money request {}", request.reference),
                    request.settlement_reference(),
                ),
            )
            .await?;

            let mut transaction = Transaction::new(
                request.requester_id,
                TransactionKind::MobileMoney,
                request.amount,
                request.fees,
                request.reference.clone(),
                now,
            );
            transaction.mobile_money_request_id = Some(request.id);
            transaction.counterparty_id = request.fulfiller_id;
            transaction.description = request.description.clone();
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                request_id = %request_id,
                admin_id = %admin_id,
                credited = request.amount.minor(),
                "mobile money request verified"
            );
            Ok(request)
        })
    }

    /// Lets an admin take a pending request as its fulfiller.
    ///
    /// Behaves like an accept with `admin_verified` set; no money moves.
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> ResultEngine<MobileMoneyRequest> {
        with_tx!(self, |db_tx| {
            let approved = mobile_money::Entity::update_many()
                .col_expr(
                    mobile_money::Column::Status,
                    Expr::value(RequestStatus::Accepted.as_str()),
                )
                .col_expr(
                    mobile_money::Column::FulfillerId,
                    Expr::value(admin_id.to_string()),
                )
                .col_expr(mobile_money::Column::AdminVerified, Expr::value(true))
                .col_expr(mobile_money::Column::AcceptedAt, Expr::value(Utc::now()))
                .filter(mobile_money::Column::Id.eq(request_id.to_string()))
                .filter(mobile_money::Column::Status.eq(RequestStatus::Pending.as_str()))
                .filter(mobile_money::Column::FulfillerId.is_null())
                .filter(mobile_money::Column::RequesterId.ne(admin_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected
                == 1;

            self.require_admin(&db_tx, admin_id).await?;
            let request = self.require_request(&db_tx, request_id).await?;
            if !approved {
                return Err(claim_rejection(&request, admin_id));
            }

            tracing::info!(
                request_id = %request_id,
                admin_id = %admin_id,
                "mobile money request approved"
            );
            Ok(request)
        })
    }
}
