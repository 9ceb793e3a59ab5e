//! The treasury engine.
//!
//! Every mutating operation flows through the period lock guard and lands
//! in the store as a single atomic batch; every derived value is a fold
//! over the movement log in canonical order.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use treasury_core::money;
use treasury_core::{
    AccountId, CurrencyCode, DocumentId, EntityId, LedgerError, LedgerResult, MovementId,
    TransferId,
};

use crate::account::{AccountKind, AccountMetadata, PaymentAccount};
use crate::config::{LedgerConfig, OverdraftPolicy};
use crate::movement::{sort_canonical, Movement, MovementSource, NewMovement};
use crate::payment::{derive_status, PayDocument, PaymentOutcome};
use crate::period::{LockStamp, Period, PeriodStatus};
use crate::store::{StoreError, TreasuryStore};
use crate::transfer::Transfer;

/// The ledger engine, generic over the persistence backend.
#[derive(Debug)]
pub struct TreasuryLedger<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: TreasuryStore> TreasuryLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LedgerConfig::default(),
        }
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Direct access to the backend, for read-only consumers.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- account registry ----

    pub fn create_account(
        &self,
        entity_id: EntityId,
        kind: AccountKind,
        currency: CurrencyCode,
        metadata: AccountMetadata,
    ) -> LedgerResult<PaymentAccount> {
        let account = PaymentAccount {
            id: AccountId::new(),
            entity_id,
            kind,
            currency,
            metadata,
            created_at: Utc::now(),
        };
        self.store.insert_account(account.clone())?;
        tracing::info!(
            account_id = %account.id,
            entity_id = %entity_id,
            kind = kind.as_str(),
            currency = %account.currency,
            "account created"
        );
        Ok(account)
    }

    pub fn account(&self, id: AccountId) -> LedgerResult<PaymentAccount> {
        self.store
            .account(id)?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    pub fn update_account_metadata(
        &self,
        id: AccountId,
        metadata: AccountMetadata,
    ) -> LedgerResult<()> {
        self.store.update_account_metadata(id, metadata)?;
        Ok(())
    }

    // ---- movement ledger reads ----

    /// Fold the account's movements with posting date ≤ `as_of` (default:
    /// all) in canonical order. Pure read; asking about an unknown account
    /// is an error, not a zero.
    pub fn compute_balance(
        &self,
        account_id: AccountId,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<Decimal> {
        self.account(account_id)?;
        let mut movements = self.store.movements_for_account(account_id)?;
        sort_canonical(&mut movements);
        Ok(movements
            .iter()
            .filter(|m| as_of.is_none_or(|d| m.posting_date <= d))
            .map(|m| m.amount)
            .sum())
    }

    /// The account's movements in canonical order, optionally restricted
    /// to an inclusive date range. Restartable: re-derived on every call.
    pub fn list_movements(
        &self,
        account_id: AccountId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> LedgerResult<Vec<Movement>> {
        self.account(account_id)?;
        let mut movements = self.store.movements_for_account(account_id)?;
        if let Some((from, to)) = range {
            movements.retain(|m| m.posting_date >= from && m.posting_date <= to);
        }
        sort_canonical(&mut movements);
        Ok(movements)
    }

    // ---- period lock guard ----

    /// Gate for every posting. Absent period records count as open; the
    /// store re-checks inside its append critical section, so this is the
    /// early exit, not the last line of defense.
    fn assert_postable(&self, entity_id: EntityId, date: NaiveDate) -> LedgerResult<()> {
        match self.store.period(entity_id, date.year(), date.month())? {
            Some(period) if !period.status.is_postable() => Err(LedgerError::PeriodLocked {
                year: period.year,
                month: period.month,
            }),
            _ => Ok(()),
        }
    }

    fn period_or_open(&self, entity_id: EntityId, year: i32, month: u32) -> LedgerResult<Period> {
        Period::bounds(year, month)?;
        Ok(self
            .store
            .period(entity_id, year, month)?
            .unwrap_or_else(|| Period::open(entity_id, year, month)))
    }

    pub fn begin_closing(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
    ) -> LedgerResult<Period> {
        self.transition_period(entity_id, year, month, PeriodStatus::Closing, None)
    }

    pub fn lock_period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
        locked_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> LedgerResult<Period> {
        let stamp = LockStamp {
            locked_at: Utc::now(),
            locked_by: locked_by.into(),
            reason: reason.into(),
        };
        self.transition_period(entity_id, year, month, PeriodStatus::Locked, Some(stamp))
    }

    fn transition_period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
        next: PeriodStatus,
        stamp: Option<LockStamp>,
    ) -> LedgerResult<Period> {
        let mut period = self.period_or_open(entity_id, year, month)?;
        if !period.status.can_transition(next) {
            return Err(LedgerError::invalid_transition(format!(
                "{:?} -> {:?} for {year}-{month:02}",
                period.status, next
            )));
        }
        period.status = next;
        if let Some(stamp) = stamp {
            period.lock = Some(stamp);
        }
        self.store.upsert_period(period.clone())?;
        tracing::info!(%entity_id, year, month, status = ?next, "period transition");
        Ok(period)
    }

    /// `locked → open`, only when the configuration allows it.
    pub fn reopen_period(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
    ) -> LedgerResult<Period> {
        if !self.config.allow_reopen {
            return Err(LedgerError::PeriodReopenDenied);
        }
        let mut period = self.period_or_open(entity_id, year, month)?;
        if period.status != PeriodStatus::Locked {
            return Err(LedgerError::invalid_transition(format!(
                "cannot reopen {:?} period {year}-{month:02}",
                period.status
            )));
        }
        period.status = PeriodStatus::Open;
        period.lock = None;
        self.store.upsert_period(period.clone())?;
        tracing::warn!(%entity_id, year, month, "period reopened");
        Ok(period)
    }

    /// Configure (or clear) a period's auto-lock day, creating the record
    /// if absent.
    pub fn set_auto_lock_day(
        &self,
        entity_id: EntityId,
        year: i32,
        month: u32,
        day: Option<u32>,
    ) -> LedgerResult<Period> {
        if let Some(day) = day {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::validation(format!(
                    "auto-lock day {day} outside 1..=31"
                )));
            }
        }
        let mut period = self.period_or_open(entity_id, year, month)?;
        period.auto_lock_day = day;
        self.store.upsert_period(period.clone())?;
        Ok(period)
    }

    /// Lock every period of the entity whose auto-lock day has passed.
    /// Intended to be driven by a scheduler sweep.
    pub fn lock_due_periods(
        &self,
        entity_id: EntityId,
        today: NaiveDate,
        locked_by: impl Into<String>,
    ) -> LedgerResult<Vec<Period>> {
        let locked_by = locked_by.into();
        let mut locked = Vec::new();
        for period in self.store.periods_for_entity(entity_id)? {
            if period.auto_lock_due(today) {
                locked.push(self.lock_period(
                    entity_id,
                    period.year,
                    period.month,
                    locked_by.clone(),
                    "auto-lock",
                )?);
            }
        }
        Ok(locked)
    }

    // ---- document payments ----

    pub fn pay_document(&self, cmd: PayDocument) -> LedgerResult<PaymentOutcome> {
        money::validate_positive_amount(cmd.amount)?;
        if cmd.total_due <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("total due must be positive"));
        }
        money::validate_amount(cmd.total_due)?;
        if cmd.idempotency_key.trim().is_empty() {
            return Err(LedgerError::validation("idempotency key must not be empty"));
        }

        let account = self.account(cmd.account_id)?;
        if account.currency != cmd.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: account.currency,
                found: cmd.currency,
            });
        }

        // Retry replay: the key is already on file, so no new movement.
        if let Some(existing) = self
            .store
            .movement_by_idempotency_key(&cmd.idempotency_key)?
        {
            tracing::debug!(
                document_id = %cmd.document_id,
                movement_id = %existing.id,
                "idempotent replay, no movement posted"
            );
            return self.document_outcome(cmd.document_id, cmd.total_due, Some(existing.id));
        }

        self.assert_postable(account.entity_id, cmd.posting_date)?;

        let movement = NewMovement {
            id: MovementId::new(),
            account_id: cmd.account_id,
            amount: cmd.amount,
            posting_date: cmd.posting_date,
            source: MovementSource::DocumentPayment {
                document_id: cmd.document_id,
                document_kind: cmd.document_kind,
            },
            note: None,
            idempotency_key: Some(cmd.idempotency_key.clone()),
        };

        let movement_id = match self.store.append_movements(vec![movement]) {
            Ok(mut committed) => committed
                .pop()
                .map(|m| m.id)
                .ok_or_else(|| LedgerError::persistence("append returned no movement"))?,
            // Lost the race against a concurrent retry with the same key;
            // fall back to the replay semantics above.
            Err(StoreError::DuplicateIdempotencyKey(_)) => self
                .store
                .movement_by_idempotency_key(&cmd.idempotency_key)?
                .map(|m| m.id)
                .ok_or_else(|| {
                    LedgerError::persistence("idempotency key taken but movement not found")
                })?,
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            document_id = %cmd.document_id,
            movement_id = %movement_id,
            amount = %cmd.amount,
            "document payment posted"
        );
        self.document_outcome(cmd.document_id, cmd.total_due, Some(movement_id))
    }

    /// Pure read: the document's derived payment state.
    pub fn payment_status(
        &self,
        document_id: DocumentId,
        total_due: Decimal,
    ) -> LedgerResult<PaymentOutcome> {
        if total_due <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("total due must be positive"));
        }
        money::validate_amount(total_due)?;
        self.document_outcome(document_id, total_due, None)
    }

    fn document_outcome(
        &self,
        document_id: DocumentId,
        total_due: Decimal,
        movement_id: Option<MovementId>,
    ) -> LedgerResult<PaymentOutcome> {
        let mut movements = self.store.movements_for_document(document_id)?;
        sort_canonical(&mut movements);
        let amount_paid: Decimal = movements.iter().map(|m| m.amount).sum();
        let remaining = (total_due - amount_paid).max(Decimal::ZERO);
        Ok(PaymentOutcome {
            status: derive_status(amount_paid, total_due),
            amount_paid,
            remaining,
            movement_id,
        })
    }

    // ---- transfers ----

    /// Move `amount` between two same-currency accounts. Both legs commit
    /// in one store batch or not at all; no transfer ever exists with a
    /// single leg persisted.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        posting_date: NaiveDate,
    ) -> LedgerResult<Transfer> {
        money::validate_positive_amount(amount)?;
        if from == to {
            return Err(LedgerError::validation(
                "transfer source and destination must differ",
            ));
        }

        let source = self.account(from)?;
        let destination = self.account(to)?;
        if source.currency != destination.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: source.currency,
                found: destination.currency,
            });
        }

        self.assert_postable(source.entity_id, posting_date)?;
        self.assert_postable(destination.entity_id, posting_date)?;

        if self.config.overdraft_for(source.kind) == OverdraftPolicy::Deny {
            let balance = self.compute_balance(from, None)?;
            if balance < amount {
                return Err(LedgerError::InsufficientFunds {
                    account_id: from,
                    balance,
                    requested: amount,
                });
            }
        }

        let transfer_id = TransferId::new();
        let debit = NewMovement {
            id: MovementId::new(),
            account_id: from,
            amount: -amount,
            posting_date,
            source: MovementSource::Transfer { transfer_id },
            note: None,
            idempotency_key: None,
        };
        let credit = NewMovement {
            id: MovementId::new(),
            account_id: to,
            amount,
            posting_date,
            source: MovementSource::Transfer { transfer_id },
            note: None,
            idempotency_key: None,
        };

        let committed = self.store.append_movements(vec![debit, credit])?;
        let created_at = committed
            .first()
            .map(|m| m.created_at)
            .unwrap_or_else(Utc::now);

        tracing::info!(
            %transfer_id,
            from = %from,
            to = %to,
            amount = %amount,
            "transfer executed"
        );
        Ok(Transfer {
            id: transfer_id,
            from_account_id: from,
            to_account_id: to,
            amount,
            currency: source.currency,
            posting_date,
            created_at,
        })
    }

    // ---- adjustments & reversals ----

    /// Corrective posting with a mandatory audit reason.
    pub fn adjust_balance(
        &self,
        account_id: AccountId,
        amount: Decimal,
        posting_date: NaiveDate,
        reason: impl Into<String>,
    ) -> LedgerResult<Movement> {
        money::validate_amount(amount)?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(LedgerError::validation(
                "adjustment reason must not be empty",
            ));
        }

        let account = self.account(account_id)?;
        self.assert_postable(account.entity_id, posting_date)?;

        let movement = NewMovement {
            id: MovementId::new(),
            account_id,
            amount,
            posting_date,
            source: MovementSource::Adjustment,
            note: Some(reason),
            idempotency_key: None,
        };
        let mut committed = self.store.append_movements(vec![movement])?;
        tracing::info!(account_id = %account_id, amount = %amount, "balance adjusted");
        committed
            .pop()
            .ok_or_else(|| LedgerError::persistence("append returned no movement"))
    }

    /// Undo a movement by appending its exact negation, dated
    /// `posting_date` (which must itself be postable; reversals are never
    /// backdated into a locked period). The original keeps its financial
    /// content and gains the `reversed_by` annotation.
    pub fn reverse_movement(
        &self,
        movement_id: MovementId,
        posting_date: NaiveDate,
    ) -> LedgerResult<Movement> {
        let original = self
            .store
            .movement(movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))?;

        if original.is_reversal() {
            return Err(LedgerError::invalid_reversal(
                "a reversal cannot be reversed; post a new forward movement instead",
            ));
        }
        if original.reversed_by.is_some() {
            return Err(LedgerError::AlreadyReversed(movement_id));
        }

        let account = self.account(original.account_id)?;
        self.assert_postable(account.entity_id, posting_date)?;

        let reversal = NewMovement {
            id: MovementId::new(),
            account_id: original.account_id,
            amount: -original.amount,
            posting_date,
            source: MovementSource::Reversal {
                reverses: movement_id,
            },
            note: None,
            idempotency_key: None,
        };
        // The store sets the original's annotation in the same critical
        // section; a concurrent second reversal loses there.
        let mut committed = self.store.append_movements(vec![reversal])?;
        tracing::info!(reversed = %movement_id, "movement reversed");
        committed
            .pop()
            .ok_or_else(|| LedgerError::persistence("append returned no movement"))
    }
}
