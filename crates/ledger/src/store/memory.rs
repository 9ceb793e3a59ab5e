use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Datelike, Utc};

use treasury_core::{AccountId, DocumentId, EntityId, MovementId};

use crate::account::{AccountMetadata, PaymentAccount};
use crate::movement::{Movement, MovementSource, NewMovement};
use crate::period::Period;

use super::{StoreError, TreasuryStore};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, PaymentAccount>,
    movements: HashMap<MovementId, Movement>,
    by_account: HashMap<AccountId, Vec<MovementId>>,
    by_document: HashMap<DocumentId, Vec<MovementId>>,
    by_idempotency_key: HashMap<String, MovementId>,
    periods: HashMap<(EntityId, i32, u32), Period>,
}

impl State {
    fn duplicate_account_number(
        &self,
        entity_id: EntityId,
        exclude: Option<AccountId>,
        number: &str,
    ) -> bool {
        self.accounts.values().any(|a| {
            Some(a.id) != exclude
                && a.entity_id == entity_id
                && a.metadata.account_number.as_deref() == Some(number)
        })
    }
}

/// In-memory treasury store.
///
/// Intended for tests and in-process embedding. One `RwLock` over the
/// whole state serializes appends, which is exactly what the batch
/// atomicity and lock-transition ordering contracts require; reads of
/// unrelated accounts still proceed concurrently under the read guard.
#[derive(Debug, Default)]
pub struct InMemoryTreasuryStore {
    state: RwLock<State>,
}

impl InMemoryTreasuryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl TreasuryStore for InMemoryTreasuryStore {
    fn insert_account(&self, account: PaymentAccount) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if let Some(number) = account.metadata.account_number.as_deref() {
            if state.duplicate_account_number(account.entity_id, None, number) {
                return Err(StoreError::DuplicateAccountNumber(number.to_string()));
            }
        }
        state.accounts.insert(account.id, account);
        Ok(())
    }

    fn account(&self, id: AccountId) -> Result<Option<PaymentAccount>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.accounts.get(&id).cloned())
    }

    fn accounts_for_entity(&self, entity_id: EntityId) -> Result<Vec<PaymentAccount>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .accounts
            .values()
            .filter(|a| a.entity_id == entity_id)
            .cloned()
            .collect())
    }

    fn update_account_metadata(
        &self,
        id: AccountId,
        metadata: AccountMetadata,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let entity_id = state
            .accounts
            .get(&id)
            .ok_or(StoreError::UnknownAccount(id))?
            .entity_id;
        if let Some(number) = metadata.account_number.as_deref() {
            if state.duplicate_account_number(entity_id, Some(id), number) {
                return Err(StoreError::DuplicateAccountNumber(number.to_string()));
            }
        }
        if let Some(account) = state.accounts.get_mut(&id) {
            account.metadata = metadata;
        }
        Ok(())
    }

    fn append_movements(&self, batch: Vec<NewMovement>) -> Result<Vec<Movement>, StoreError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let mut state = self.state.write().map_err(poisoned)?;

        // Validate the whole batch before touching anything: all-or-nothing.
        let mut batch_keys: Vec<String> = Vec::new();
        for m in &batch {
            let account = state
                .accounts
                .get(&m.account_id)
                .ok_or(StoreError::UnknownAccount(m.account_id))?;

            let key = (
                account.entity_id,
                m.posting_date.year(),
                m.posting_date.month(),
            );
            if let Some(period) = state.periods.get(&key) {
                if !period.status.is_postable() {
                    return Err(StoreError::PeriodLocked {
                        year: period.year,
                        month: period.month,
                    });
                }
            }

            if let Some(key) = m.idempotency_key.as_deref() {
                if state.by_idempotency_key.contains_key(key)
                    || batch_keys.iter().any(|k| k == key)
                {
                    return Err(StoreError::DuplicateIdempotencyKey(key.to_string()));
                }
                batch_keys.push(key.to_string());
            }

            if let MovementSource::Reversal { reverses } = m.source {
                let original = state
                    .movements
                    .get(&reverses)
                    .ok_or(StoreError::UnknownMovement(reverses))?;
                if original.reversed_by.is_some() {
                    return Err(StoreError::AlreadyReversed(reverses));
                }
            }
        }

        // One stamp per batch: both legs of a transfer share their commit
        // instant, and the id tie-breaks the canonical order.
        let created_at = Utc::now();
        let mut committed = Vec::with_capacity(batch.len());
        for m in batch {
            let movement = Movement {
                id: m.id,
                account_id: m.account_id,
                amount: m.amount,
                posting_date: m.posting_date,
                created_at,
                source: m.source,
                reversed_by: None,
                note: m.note,
                idempotency_key: m.idempotency_key,
            };

            if let Some(key) = movement.idempotency_key.clone() {
                state.by_idempotency_key.insert(key, movement.id);
            }
            if let Some(document_id) = movement.document_id() {
                state
                    .by_document
                    .entry(document_id)
                    .or_default()
                    .push(movement.id);
            }
            if let MovementSource::Reversal { reverses } = movement.source {
                if let Some(original) = state.movements.get_mut(&reverses) {
                    original.reversed_by = Some(movement.id);
                }
            }
            state
                .by_account
                .entry(movement.account_id)
                .or_default()
                .push(movement.id);
            state.movements.insert(movement.id, movement.clone());
            committed.push(movement);
        }

        Ok(committed)
    }

    fn movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.movements.get(&id).cloned())
    }

    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(collect_movements(
            &state,
            state.by_account.get(&account_id),
        ))
    }

    fn movements_for_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<Movement>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(collect_movements(
            &state,
            state.by_document.get(&document_id),
        ))
    }

    fn movement_by_idempotency_key(&self, key: &str) -> Result<Option<Movement>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .by_idempotency_key
            .get(key)
            .and_then(|id| state.movements.get(id))
            .cloned())
    }

    fn period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
    ) -> Result<Option<Period>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.periods.get(&(entity_id, year, month)).cloned())
    }

    fn periods_for_entity(&self, entity_id: EntityId) -> Result<Vec<Period>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .periods
            .values()
            .filter(|p| p.entity_id == entity_id)
            .cloned()
            .collect())
    }

    fn upsert_period(&self, period: Period) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        state
            .periods
            .insert((period.entity_id, period.year, period.month), period);
        Ok(())
    }
}

fn collect_movements(state: &State, ids: Option<&Vec<MovementId>>) -> Vec<Movement> {
    ids.map(|ids| {
        ids.iter()
            .filter_map(|id| state.movements.get(id))
            .cloned()
            .collect()
    })
    .unwrap_or_default()
}
