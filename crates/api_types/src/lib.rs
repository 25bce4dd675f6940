use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Bdt,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        User,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub role: Role,
        pub is_active: bool,
        pub currency: Currency,
        pub wallet_balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserActive {
        pub active: bool,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletTransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletTransactionView {
        pub id: Uuid,
        pub kind: WalletTransactionKind,
        /// Always positive; `kind` gives the direction.
        pub amount_minor: i64,
        pub description: String,
        pub reference: String,
        pub balance_before_minor: i64,
        pub balance_after_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletTransactionListResponse {
        pub transactions: Vec<WalletTransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    /// Admin top-up of a user's wallet.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminCredit {
        pub amount_minor: i64,
        pub description: Option<String>,
    }
}

pub mod fees {
    use super::*;

    /// Percentages are in basis points (`150` is `1.5%`); bounds in minor
    /// units, where `0` means unbounded.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeConfig {
        pub transfer_fee_bp: i64,
        pub mobile_money_fee_bp: i64,
        pub minimum_fee_minor: i64,
        pub maximum_fee_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeConfigView {
        pub id: Option<Uuid>,
        pub transfer_fee_bp: i64,
        pub mobile_money_fee_bp: i64,
        pub minimum_fee_minor: i64,
        pub maximum_fee_minor: i64,
        pub created_by: Option<String>,
        pub created_at: Option<DateTime<Utc>>,
    }
}

pub mod request {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Provider {
        Bkash,
        Nagad,
        Rocket,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestStatus {
        Pending,
        Accepted,
        Fulfilled,
        Verified,
        Cancelled,
        Expired,
    }

    /// Which requests to list.
    ///
    /// - `mine`: created by the caller (default)
    /// - `assigned`: accepted by the caller
    /// - `open`: pending requests of other users
    /// - `all`: everything, admin only
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestScope {
        #[default]
        Mine,
        Assigned,
        Open,
        All,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestNew {
        pub provider: Provider,
        pub recipient_number: String,
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestFulfill {
        /// Provider transaction id of the payment that was sent.
        pub transaction_id: String,
        pub sender_number: String,
        pub screenshot: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RequestList {
        pub scope: Option<RequestScope>,
        pub status: Option<RequestStatus>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FulfillmentView {
        pub transaction_id: String,
        pub sender_number: String,
        pub screenshot: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestView {
        pub id: Uuid,
        pub reference: String,
        pub requester_id: Uuid,
        pub provider: Provider,
        pub recipient_number: String,
        pub amount_minor: i64,
        pub fees_minor: i64,
        pub total_amount_minor: i64,
        pub description: Option<String>,
        pub status: RequestStatus,
        pub fulfiller_id: Option<Uuid>,
        pub admin_verified: bool,
        pub verified_by_id: Option<Uuid>,
        pub fulfillment: Option<FulfillmentView>,
        pub created_at: DateTime<Utc>,
        pub accepted_at: Option<DateTime<Utc>>,
        pub fulfilled_at: Option<DateTime<Utc>>,
        pub verified_at: Option<DateTime<Utc>>,
        pub cancelled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestListResponse {
        pub requests: Vec<RequestView>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub recipient_username: String,
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub id: Uuid,
        pub reference: String,
        pub amount_minor: i64,
        pub fees_minor: i64,
        /// Sender balance once the transfer and its fee are applied.
        pub balance_after_minor: i64,
    }
}
