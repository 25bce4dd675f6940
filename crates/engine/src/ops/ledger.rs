use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, WalletTransaction, WalletTransactionKind, users,
    util::{ensure_positive, normalize_optional_text, normalize_required_text},
    wallet_transactions,
};

use super::{Engine, with_tx};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

/// One balance change to apply to a single wallet.
///
/// `amount` is always positive; `kind` decides whether it is added or
/// subtracted. `reference` must be unique across the whole ledger.
#[derive(Clone, Debug)]
pub struct LedgerDelta {
    pub user_id: Uuid,
    pub kind: WalletTransactionKind,
    pub amount: Money,
    pub description: String,
    pub reference: String,
}

impl LedgerDelta {
    pub fn new(
        user_id: Uuid,
        kind: WalletTransactionKind,
        amount: Money,
        description: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            amount,
            description: description.into(),
            reference: reference.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WalletCursor {
    created_at: DateTime<Utc>,
    id: String,
}

impl WalletCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid wallet cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid wallet cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid wallet cursor".to_string()))
    }
}

impl Engine {
    /// Applies one balance change in its own transaction.
    pub async fn apply_delta(&self, delta: LedgerDelta) -> ResultEngine<WalletTransaction> {
        with_tx!(self, |db_tx| self.apply_delta_in(&db_tx, delta).await)
    }

    /// Applies one balance change inside `db_tx`.
    ///
    /// The balance is moved with a single guarded `UPDATE`, so two debits
    /// racing on the same wallet can never both pass the balance check. The
    /// ledger row records the balance read back after the update.
    pub(super) async fn apply_delta_in(
        &self,
        db_tx: &DatabaseTransaction,
        delta: LedgerDelta,
    ) -> ResultEngine<WalletTransaction> {
        ensure_positive(delta.amount)?;
        let reference = normalize_required_text(&delta.reference, "reference")?;
        let description = normalize_required_text(&delta.description, "description")?;

        if self.reference_exists(db_tx, &reference).await? {
            return Err(EngineError::DuplicateReference(reference));
        }

        let signed = delta.kind.signed(delta.amount);
        let mut update = users::Entity::update_many()
            .col_expr(
                users::Column::WalletBalance,
                Expr::col(users::Column::WalletBalance).add(signed.minor()),
            )
            .filter(users::Column::Id.eq(delta.user_id.to_string()));
        if delta.kind.is_debit() {
            update = update.filter(users::Column::WalletBalance.gte(delta.amount.minor()));
        } else {
            update =
                update.filter(users::Column::WalletBalance.lte(i64::MAX - delta.amount.minor()));
        }
        let updated = update.exec(db_tx).await?.rows_affected;

        if updated == 0 {
            let Some(user) = self.find_user(db_tx, delta.user_id).await? else {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            };
            if !delta.kind.is_debit() {
                return Err(EngineError::InvalidAmount(
                    "balance would overflow".to_string(),
                ));
            }
            tracing::debug!(
                user_id = %delta.user_id,
                kind = delta.kind.as_str(),
                amount = delta.amount.minor(),
                balance = user.wallet_balance.minor(),
                "ledger debit rejected"
            );
            return Err(EngineError::InsufficientBalance(format!(
                "balance {} is below {}",
                user.wallet_balance, delta.amount
            )));
        }

        let balance_after = self.require_user(db_tx, delta.user_id).await?.wallet_balance;
        let entry = WalletTransaction {
            id: Uuid::new_v4(),
            user_id: delta.user_id,
            kind: delta.kind,
            amount: delta.amount,
            description,
            reference,
            balance_before: balance_after - signed,
            balance_after,
            created_at: Utc::now(),
        };

        if let Err(err) = wallet_transactions::ActiveModel::from(&entry)
            .insert(db_tx)
            .await
        {
            if self.reference_exists(db_tx, &entry.reference).await? {
                return Err(EngineError::DuplicateReference(entry.reference));
            }
            return Err(err.into());
        }

        tracing::debug!(
            user_id = %entry.user_id,
            kind = entry.kind.as_str(),
            amount = entry.amount.minor(),
            reference = %entry.reference,
            balance_after = entry.balance_after.minor(),
            "ledger entry applied"
        );
        Ok(entry)
    }

    async fn reference_exists(
        &self,
        db_tx: &DatabaseTransaction,
        reference: &str,
    ) -> ResultEngine<bool> {
        let count = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::Reference.eq(reference.to_string()))
            .count(db_tx)
            .await?;
        Ok(count > 0)
    }

    /// Current wallet balance of `user_id`.
    pub async fn wallet_balance(&self, user_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            Ok(user.wallet_balance)
        })
    }

    /// Ledger history of `user_id`, newest first.
    ///
    /// Readable by the wallet owner and by admins. Pagination is by
    /// `(created_at DESC, id DESC)`; pass the returned cursor back to get the
    /// next page.
    pub async fn wallet_transactions_page(
        &self,
        caller_id: Uuid,
        user_id: Uuid,
        limit: Option<u64>,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<WalletTransaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            let caller = self.require_user(&db_tx, caller_id).await?;
            if caller.id != user_id && !caller.is_admin() {
                return Err(EngineError::Forbidden(
                    "cannot read another user's wallet".to_string(),
                ));
            }
            self.require_user(&db_tx, user_id).await?;

            let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
            let mut query = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(wallet_transactions::Column::CreatedAt)
                .order_by_desc(wallet_transactions::Column::Id)
                .limit(limit.saturating_add(1));

            if let Some(cursor) = cursor {
                let cursor = WalletCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(wallet_transactions::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(wallet_transactions::Column::CreatedAt.eq(cursor.created_at))
                                .add(wallet_transactions::Column::Id.lt(cursor.id)),
                        ),
                );
            }

            let mut rows = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;
            if has_more {
                rows.truncate(limit as usize);
            }

            let next = match (has_more, rows.last()) {
                (true, Some(last)) => Some(
                    WalletCursor {
                        created_at: last.created_at,
                        id: last.id.clone(),
                    }
                    .encode()?,
                ),
                _ => None,
            };

            let items = rows
                .into_iter()
                .map(WalletTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok((items, next))
        })
    }

    /// Admin top-up of a user's wallet.
    pub async fn admin_credit(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        amount: Money,
        description: Option<&str>,
    ) -> ResultEngine<WalletTransaction> {
        ensure_positive(amount)?;
        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, admin_id).await?;
            let description = normalize_optional_text(description)
                .unwrap_or_else(|| format!("Admin credit by {}", admin.username));
            let reference = format!(
                "ADMIN-{}",
                Uuid::new_v4().simple().to_string().to_ascii_uppercase()
            );
            let entry = self
                .apply_delta_in(
                    &db_tx,
                    LedgerDelta::new(
                        user_id,
                        WalletTransactionKind::AdminCredit,
                        amount,
                        description,
                        reference,
                    ),
                )
                .await?;
            tracing::info!(
                admin_id = %admin_id,
                user_id = %user_id,
                amount = amount.minor(),
                "wallet credited by admin"
            );
            Ok(entry)
        })
    }
}
