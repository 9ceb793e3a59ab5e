//! Persistence boundary: durable, transactional record storage.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

use treasury_core::{AccountId, DocumentId, EntityId, LedgerError, MovementId};

use crate::account::{AccountMetadata, PaymentAccount};
use crate::movement::{Movement, NewMovement};
use crate::period::Period;

/// Storage-side failure.
///
/// Infrastructure errors only; domain validation lives in the engine.
/// The engine maps these losslessly onto [`LedgerError`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("unknown movement: {0}")]
    UnknownMovement(MovementId),

    #[error("movement {0} is already reversed")]
    AlreadyReversed(MovementId),

    #[error("accounting period {year}-{month:02} is locked")]
    PeriodLocked { year: i32, month: u32 },

    #[error("idempotency key already used: {0}")]
    DuplicateIdempotencyKey(String),

    #[error("account number already in use within entity: {0}")]
    DuplicateAccountNumber(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownAccount(id) => LedgerError::AccountNotFound(id),
            StoreError::UnknownMovement(id) => LedgerError::MovementNotFound(id),
            StoreError::AlreadyReversed(id) => LedgerError::AlreadyReversed(id),
            StoreError::PeriodLocked { year, month } => LedgerError::PeriodLocked { year, month },
            StoreError::DuplicateIdempotencyKey(key) => LedgerError::DuplicateIdempotencyKey(key),
            StoreError::DuplicateAccountNumber(number) => {
                LedgerError::DuplicateAccountNumber(number)
            }
            StoreError::Backend(msg) => LedgerError::Persistence(msg),
        }
    }
}

/// Durable treasury storage.
///
/// `append_movements` is the only write path for movements and must be
/// atomic: every movement in the batch is persisted, or none is. Inside
/// the same critical section implementations must
///
/// - re-check period locks for every posting date in the batch (a lock
///   committed first always beats a later-arriving append),
/// - enforce idempotency-key uniqueness,
/// - for reversal movements, set the reversed movement's `reversed_by`
///   annotation, failing the whole batch if it is already set.
///
/// Reads are restartable: each call re-derives from durable state and
/// imposes no ordering of its own; callers sort canonically.
pub trait TreasuryStore: Send + Sync {
    fn insert_account(&self, account: PaymentAccount) -> Result<(), StoreError>;

    fn account(&self, id: AccountId) -> Result<Option<PaymentAccount>, StoreError>;

    fn accounts_for_entity(&self, entity_id: EntityId) -> Result<Vec<PaymentAccount>, StoreError>;

    fn update_account_metadata(
        &self,
        id: AccountId,
        metadata: AccountMetadata,
    ) -> Result<(), StoreError>;

    /// Atomically append a batch of movements, stamping `created_at`.
    fn append_movements(&self, batch: Vec<NewMovement>) -> Result<Vec<Movement>, StoreError>;

    fn movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError>;

    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>, StoreError>;

    fn movements_for_document(&self, document_id: DocumentId)
        -> Result<Vec<Movement>, StoreError>;

    fn movement_by_idempotency_key(&self, key: &str) -> Result<Option<Movement>, StoreError>;

    fn period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
    ) -> Result<Option<Period>, StoreError>;

    fn periods_for_entity(&self, entity_id: EntityId) -> Result<Vec<Period>, StoreError>;

    fn upsert_period(&self, period: Period) -> Result<(), StoreError>;
}

impl<S> TreasuryStore for Arc<S>
where
    S: TreasuryStore + ?Sized,
{
    fn insert_account(&self, account: PaymentAccount) -> Result<(), StoreError> {
        (**self).insert_account(account)
    }

    fn account(&self, id: AccountId) -> Result<Option<PaymentAccount>, StoreError> {
        (**self).account(id)
    }

    fn accounts_for_entity(&self, entity_id: EntityId) -> Result<Vec<PaymentAccount>, StoreError> {
        (**self).accounts_for_entity(entity_id)
    }

    fn update_account_metadata(
        &self,
        id: AccountId,
        metadata: AccountMetadata,
    ) -> Result<(), StoreError> {
        (**self).update_account_metadata(id, metadata)
    }

    fn append_movements(&self, batch: Vec<NewMovement>) -> Result<Vec<Movement>, StoreError> {
        (**self).append_movements(batch)
    }

    fn movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        (**self).movement(id)
    }

    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_account(account_id)
    }

    fn movements_for_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_document(document_id)
    }

    fn movement_by_idempotency_key(&self, key: &str) -> Result<Option<Movement>, StoreError> {
        (**self).movement_by_idempotency_key(key)
    }

    fn period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
    ) -> Result<Option<Period>, StoreError> {
        (**self).period(entity_id, year, month)
    }

    fn periods_for_entity(&self, entity_id: EntityId) -> Result<Vec<Period>, StoreError> {
        (**self).periods_for_entity(entity_id)
    }

    fn upsert_period(&self, period: Period) -> Result<(), StoreError> {
        (**self).upsert_period(period)
    }
}
