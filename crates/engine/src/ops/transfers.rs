use chrono::Utc;
use sea_orm::{ActiveModelTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, TransferCmd, WalletTransaction,
    WalletTransactionKind, transactions,
    util::{ensure_positive, normalize_optional_text, normalize_username},
};

use super::{Engine, LedgerDelta, with_tx};

/// Everything a wallet transfer wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transaction: Transaction,
    pub debit: WalletTransaction,
    /// Absent when the active schedule charges nothing.
    pub fee: Option<WalletTransaction>,
    pub credit: WalletTransaction,
}

impl Engine {
    /// Moves `amount` from the sender's wallet to another user's wallet.
    ///
    /// The sender pays `amount` plus the transfer fee; the recipient receives
    /// `amount`. All ledger entries commit together.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        ensure_positive(cmd.amount)?;
        let recipient_username = normalize_username(&cmd.recipient_username)?;
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            let sender = self.require_active_user(&db_tx, cmd.sender_id).await?;
            let recipient = self
                .find_user_by_username(&db_tx, &recipient_username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("recipient not exists".to_string()))?;
            if recipient.id == sender.id {
                return Err(EngineError::Validation(
                    "cannot transfer to yourself".to_string(),
                ));
            }
            if !recipient.is_active {
                return Err(EngineError::Validation("recipient is inactive".to_string()));
            }

            let fee_amount = self
                .active_fee_schedule(&db_tx)
                .await?
                .transfer_fee(cmd.amount)?;
            let reference = format!(
                "TRF{}",
                &Uuid::new_v4().simple().to_string().to_ascii_uppercase()[..20]
            );

            let debit = self
                .apply_delta_in(
                    &db_tx,
                    LedgerDelta::new(
                        sender.id,
                        WalletTransactionKind::TransferOut,
                        cmd.amount,
                        format!("Transfer to {}", recipient.username),
                        format!("{reference}-OUT"),
                    ),
                )
                .await?;
            let fee = if fee_amount.is_positive() {
                Some(
                    self.apply_delta_in(
                        &db_tx,
                        LedgerDelta::new(
                            sender.id,
                            WalletTransactionKind::Fee,
                            fee_amount,
                            format!("Transfer fee for {reference}"),
                            format!("{reference}-FEE"),
                        ),
                    )
                    .await?,
                )
            } else {
                None
            };
            let credit = self
                .apply_delta_in(
                    &db_tx,
                    LedgerDelta::new(
                        recipient.id,
                        WalletTransactionKind::TransferIn,
                        cmd.amount,
                        format!("Transfer from {}", sender.username),
                        format!("{reference}-IN"),
                    ),
                )
                .await?;

            let mut transaction = Transaction::new(
                sender.id,
                TransactionKind::Transfer,
                cmd.amount,
                fee_amount,
                reference,
                Utc::now(),
            );
            transaction.counterparty_id = Some(recipient.id);
            transaction.description = description;
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                sender_id = %sender.id,
                recipient_id = %recipient.id,
                amount = cmd.amount.minor(),
                fee = fee_amount.minor(),
                "wallet transfer completed"
            );
            Ok(TransferReceipt {
                transaction,
                debit,
                fee,
                credit,
            })
        })
    }
}
