//! The module contains the error the engine can throw.
//!
//! The errors are grouped by who can fix them:
//!
//! - caller identity/role: [`Unauthorized`], [`Forbidden`]
//! - request lifecycle: [`InvalidState`], [`AlreadyClaimed`],
//!   [`SelfAcceptForbidden`]
//! - input: [`Validation`], [`InvalidAmount`], [`InvalidCursor`]
//! - ledger: [`InsufficientBalance`], [`DuplicateReference`]
//!
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`AlreadyClaimed`]: EngineError::AlreadyClaimed
//!  [`SelfAcceptForbidden`]: EngineError::SelfAcceptForbidden
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCursor`]: EngineError::InvalidCursor
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`DuplicateReference`]: EngineError::DuplicateReference
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Request already claimed: {0}")]
    AlreadyClaimed(String),
    #[error("Requester cannot accept their own request")]
    SelfAcceptForbidden,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Requester missing for request {0}")]
    RequesterMissing(String),
    #[error("Duplicate ledger reference: {0}")]
    DuplicateReference(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::AlreadyClaimed(a), Self::AlreadyClaimed(b)) => a == b,
            (Self::SelfAcceptForbidden, Self::SelfAcceptForbidden) => true,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::RequesterMissing(a), Self::RequesterMissing(b)) => a == b,
            (Self::DuplicateReference(a), Self::DuplicateReference(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
