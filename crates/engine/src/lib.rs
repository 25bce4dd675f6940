//! Mobipay engine: wallet ledger, mobile-money request lifecycle and
//! admin verification.
//!
//! Every write goes through one database transaction, so each operation
//! either commits fully or leaves no trace.

pub use commands::{CreateRequestCmd, FulfillCmd, TransferCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use fees::{FeeSchedule, Percent};
pub use mobile_money::{Fulfillment, MobileMoneyRequest, Provider, RequestStatus};
pub use money::Money;
pub use ops::{
    Engine, EngineBuilder, LedgerDelta, RequestListFilter, RequestScope, TransferReceipt,
};
pub use transactions::{Transaction, TransactionKind};
pub use users::{Role, User};
pub use wallet_transactions::{WalletTransaction, WalletTransactionKind};

mod commands;
mod currency;
mod error;
mod fees;
mod mobile_money;
mod money;
mod ops;
mod transactions;
mod users;
mod util;
mod wallet_transactions;

type ResultEngine<T> = Result<T, EngineError>;
