//! End-to-end scenarios exercising the engine against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use treasury_core::{CurrencyCode, DocumentId, EntityId, LedgerError};

use crate::account::{AccountKind, AccountMetadata, PaymentAccount};
use crate::engine::TreasuryLedger;
use crate::movement::{DocumentKind, MovementSource};
use crate::payment::{PayDocument, PaymentStatus};
use crate::store::memory::InMemoryTreasuryStore;
use crate::store::TreasuryStore;

fn pln() -> CurrencyCode {
    CurrencyCode::new("PLN").unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (TreasuryLedger<InMemoryTreasuryStore>, EntityId) {
    (
        TreasuryLedger::new(InMemoryTreasuryStore::new()),
        EntityId::new(),
    )
}

fn open_account(
    ledger: &TreasuryLedger<InMemoryTreasuryStore>,
    entity_id: EntityId,
    kind: AccountKind,
    name: &str,
) -> PaymentAccount {
    ledger
        .create_account(entity_id, kind, pln(), AccountMetadata::named(name))
        .unwrap()
}

fn pay(
    document_id: DocumentId,
    account_id: treasury_core::AccountId,
    amount: Decimal,
    posting_date: NaiveDate,
    key: &str,
) -> PayDocument {
    PayDocument {
        document_id,
        document_kind: DocumentKind::Invoice,
        total_due: dec!(1000.00),
        currency: pln(),
        account_id,
        amount,
        posting_date,
        idempotency_key: key.to_string(),
    }
}

#[test]
fn invoice_paid_in_two_installments() {
    let (ledger, entity_id) = setup();
    let account = open_account(&ledger, entity_id, AccountKind::Main, "Operating");
    let invoice = DocumentId::new();

    let outcome = ledger
        .pay_document(pay(invoice, account.id, dec!(400.00), date(2026, 3, 5), "inst-1"))
        .unwrap();
    assert_eq!(outcome.status, PaymentStatus::Partial);
    assert_eq!(outcome.amount_paid, dec!(400.00));
    assert_eq!(outcome.remaining, dec!(600.00));

    let outcome = ledger
        .pay_document(pay(invoice, account.id, dec!(600.00), date(2026, 3, 20), "inst-2"))
        .unwrap();
    assert_eq!(outcome.status, PaymentStatus::Paid);
    assert_eq!(outcome.amount_paid, dec!(1000.00));
    assert_eq!(outcome.remaining, Decimal::ZERO);

    assert_eq!(
        ledger.compute_balance(account.id, None).unwrap(),
        dec!(1000.00)
    );
}

#[test]
fn transfer_and_reversal_round_trip() {
    let (ledger, entity_id) = setup();
    let a = open_account(&ledger, entity_id, AccountKind::Main, "A");
    let b = open_account(&ledger, entity_id, AccountKind::Vat, "B");
    ledger
        .adjust_balance(a.id, dec!(1000.00), date(2026, 3, 1), "opening balance")
        .unwrap();

    let transfer = ledger
        .transfer(a.id, b.id, dec!(500.00), date(2026, 3, 10))
        .unwrap();
    assert_eq!(ledger.compute_balance(a.id, None).unwrap(), dec!(500.00));
    assert_eq!(ledger.compute_balance(b.id, None).unwrap(), dec!(500.00));

    // Reverse A's debit leg: A is whole again, the original is annotated.
    let debit = ledger.list_movements(a.id, None).unwrap()[1].clone();
    assert_eq!(
        debit.source,
        MovementSource::Transfer {
            transfer_id: transfer.id
        }
    );
    let reversal = ledger.reverse_movement(debit.id, date(2026, 3, 11)).unwrap();
    assert_eq!(ledger.compute_balance(a.id, None).unwrap(), dec!(1000.00));

    let annotated = ledger.store().movement(debit.id).unwrap().unwrap();
    assert_eq!(annotated.reversed_by, Some(reversal.id));
    assert_eq!(annotated.amount, dec!(-500.00), "original content untouched");

    let err = ledger
        .reverse_movement(debit.id, date(2026, 3, 12))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyReversed(id) if id == debit.id));
}

#[test]
fn locked_march_rejects_march_dated_payment_but_not_april() {
    let (ledger, entity_id) = setup();
    let account = open_account(&ledger, entity_id, AccountKind::Main, "Operating");
    let invoice = DocumentId::new();

    ledger
        .lock_period(entity_id, 2026, 3, "cfo", "Q1 close")
        .unwrap();

    let err = ledger
        .pay_document(pay(invoice, account.id, dec!(250.00), date(2026, 3, 15), "p-1"))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::PeriodLocked {
            year: 2026,
            month: 3
        }
    ));

    let outcome = ledger
        .pay_document(pay(invoice, account.id, dec!(250.00), date(2026, 4, 2), "p-1"))
        .unwrap();
    assert_eq!(outcome.status, PaymentStatus::Partial);
    assert_eq!(outcome.amount_paid, dec!(250.00));
}

#[test]
fn concurrent_transfers_never_tear() {
    let ledger = Arc::new(TreasuryLedger::new(InMemoryTreasuryStore::new()));
    let entity_id = EntityId::new();

    let a = ledger
        .create_account(entity_id, AccountKind::Main, pln(), AccountMetadata::named("A"))
        .unwrap();
    let b = ledger
        .create_account(entity_id, AccountKind::Main, pln(), AccountMetadata::named("B"))
        .unwrap();
    ledger
        .adjust_balance(a.id, dec!(10000.00), date(2026, 3, 1), "opening balance")
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            std::thread::spawn(move || {
                for _ in 0..25 {
                    ledger
                        .transfer(from, to, dec!(7.00), date(2026, 3, 10))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Conservation: every debit leg has its credit leg.
    let total = ledger.compute_balance(a.id, None).unwrap()
        + ledger.compute_balance(b.id, None).unwrap();
    assert_eq!(total, dec!(10000.00));

    let legs_a = ledger.list_movements(a.id, None).unwrap();
    let legs_b = ledger.list_movements(b.id, None).unwrap();
    // 200 transfers → 400 legs plus the opening adjustment.
    assert_eq!(legs_a.len() + legs_b.len(), 401);
}

#[test]
fn concurrent_payment_retries_post_once() {
    let ledger = Arc::new(TreasuryLedger::new(InMemoryTreasuryStore::new()));
    let entity_id = EntityId::new();
    let account = ledger
        .create_account(
            entity_id,
            AccountKind::Main,
            pln(),
            AccountMetadata::named("Operating"),
        )
        .unwrap();
    let invoice = DocumentId::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let account_id = account.id;
            std::thread::spawn(move || {
                ledger
                    .pay_document(pay(
                        invoice,
                        account_id,
                        dec!(400.00),
                        date(2026, 3, 5),
                        "retry-storm",
                    ))
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for outcome in &outcomes {
        assert_eq!(outcome.amount_paid, dec!(400.00));
        assert_eq!(outcome.status, PaymentStatus::Partial);
    }
    assert_eq!(ledger.list_movements(account.id, None).unwrap().len(), 1);
}
