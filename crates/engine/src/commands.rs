//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create, fulfil,
//! transfer), keeping call sites readable and avoiding long argument lists.

use uuid::Uuid;

use crate::{Money, Provider};

/// Create a mobile-money request and hold `amount + fees` from the requester.
#[derive(Clone, Debug)]
pub struct CreateRequestCmd {
    pub requester_id: Uuid,
    pub provider: Provider,
    pub recipient_number: String,
    pub amount: Money,
    pub description: Option<String>,
}

impl CreateRequestCmd {
    #[must_use]
    pub fn new(
        requester_id: Uuid,
        provider: Provider,
        recipient_number: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            requester_id,
            provider,
            recipient_number: recipient_number.into(),
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Submit proof that the external payment was sent.
#[derive(Clone, Debug)]
pub struct FulfillCmd {
    pub request_id: Uuid,
    pub fulfiller_id: Uuid,
    pub transaction_id: String,
    pub sender_number: String,
    pub screenshot: Option<String>,
    pub notes: Option<String>,
}

impl FulfillCmd {
    #[must_use]
    pub fn new(
        request_id: Uuid,
        fulfiller_id: Uuid,
        transaction_id: impl Into<String>,
        sender_number: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            fulfiller_id,
            transaction_id: transaction_id.into(),
            sender_number: sender_number.into(),
            screenshot: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = Some(screenshot.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Move money from one wallet to another user's wallet.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: Uuid,
    pub recipient_username: String,
    pub amount: Money,
    pub description: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(sender_id: Uuid, recipient_username: impl Into<String>, amount: Money) -> Self {
        Self {
            sender_id,
            recipient_username: recipient_username.into(),
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
