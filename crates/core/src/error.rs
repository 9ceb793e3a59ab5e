//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::{AccountId, MovementId};
use crate::money::CurrencyCode;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every validation failure is detected before any write; no operation
/// partially commits. `DuplicateIdempotencyKey` signals a safe no-op
/// replay rather than a hard failure; the payment processor maps it back
/// to the original result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Zero where non-zero is required, negative where positive is
    /// required, or more fraction digits than the currency carries.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("movement not found: {0}")]
    MovementNotFound(MovementId),

    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    /// The posting date falls inside a locked accounting period.
    #[error("accounting period {year}-{month:02} is locked")]
    PeriodLocked { year: i32, month: u32 },

    #[error("invalid period transition: {0}")]
    InvalidPeriodTransition(String),

    /// Reopening locked periods is disabled in this ledger's configuration.
    #[error("period reopening is disabled")]
    PeriodReopenDenied,

    #[error("movement {0} is already reversed")]
    AlreadyReversed(MovementId),

    #[error("invalid reversal: {0}")]
    InvalidReversal(String),

    /// Safe-replay signal: a movement with this key is already on file.
    #[error("idempotency key already used: {0}")]
    DuplicateIdempotencyKey(String),

    #[error("account number already in use within entity: {0}")]
    DuplicateAccountNumber(String),

    /// Overdraft policy for the source account kind is `Deny` and the
    /// balance does not cover the requested amount.
    #[error("insufficient funds on {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value failed validation (malformed currency code, empty reason).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying store error, surfaced verbatim, never swallowed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidPeriodTransition(msg.into())
    }

    pub fn invalid_reversal(msg: impl Into<String>) -> Self {
        Self::InvalidReversal(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
