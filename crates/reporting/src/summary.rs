use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treasury_core::{AccountId, CurrencyCode, EntityId, LedgerResult};
use treasury_ledger::movement::sort_canonical;
use treasury_ledger::period::Period;
use treasury_ledger::store::TreasuryStore;

/// Closing balance of one account at the end of the summarized period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub currency: CurrencyCode,
    pub balance: Decimal,
}

/// Entity-level rollup for one accounting period.
///
/// `total_income` and `total_expense` fold the in-period movements only;
/// `per_account_balances` carry each account's cumulative closing balance
/// as of the period's last day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySummary {
    pub entity_id: EntityId,
    pub year: i32,
    pub month: u32,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_result: Decimal,
    pub per_account_balances: Vec<AccountBalance>,
}

/// Fold the entity's movement log into a period summary.
///
/// A pure function of the log at the moment of computation: it takes no
/// lock and, because multi-movement operations commit atomically, sees
/// them either fully applied or not at all. A transfer's debit leg is
/// never visible without its credit leg.
pub fn summarize<S: TreasuryStore>(
    store: &S,
    entity_id: EntityId,
    year: i32,
    month: u32,
) -> LedgerResult<TreasurySummary> {
    let (first, last) = Period::bounds(year, month)?;

    let mut accounts = store.accounts_for_entity(entity_id)?;
    accounts.sort_by_key(|a| *a.id.as_uuid());

    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut per_account_balances = Vec::with_capacity(accounts.len());

    for account in &accounts {
        let mut movements = store.movements_for_account(account.id)?;
        sort_canonical(&mut movements);

        let mut closing = Decimal::ZERO;
        for movement in &movements {
            if movement.posting_date <= last {
                closing += movement.amount;
            }
            if movement.posting_date >= first && movement.posting_date <= last {
                if movement.amount > Decimal::ZERO {
                    total_income += movement.amount;
                } else {
                    total_expense -= movement.amount;
                }
            }
        }

        per_account_balances.push(AccountBalance {
            account_id: account.id,
            currency: account.currency.clone(),
            balance: closing,
        });
    }

    Ok(TreasurySummary {
        entity_id,
        year,
        month,
        total_income,
        total_expense,
        net_result: total_income - total_expense,
        per_account_balances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use treasury_core::DocumentId;
    use treasury_ledger::account::{AccountKind, AccountMetadata};
    use treasury_ledger::engine::TreasuryLedger;
    use treasury_ledger::movement::DocumentKind;
    use treasury_ledger::payment::PayDocument;
    use treasury_ledger::store::memory::InMemoryTreasuryStore;

    fn pln() -> CurrencyCode {
        CurrencyCode::new("PLN").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn summary_folds_one_period_of_one_entity() {
        let ledger = TreasuryLedger::new(InMemoryTreasuryStore::new());
        let entity_id = EntityId::new();
        let other_entity = EntityId::new();

        let main = ledger
            .create_account(
                entity_id,
                AccountKind::Main,
                pln(),
                AccountMetadata::named("Operating"),
            )
            .unwrap();
        let vat = ledger
            .create_account(
                entity_id,
                AccountKind::Vat,
                pln(),
                AccountMetadata::named("VAT"),
            )
            .unwrap();
        let foreign = ledger
            .create_account(
                other_entity,
                AccountKind::Main,
                pln(),
                AccountMetadata::named("Elsewhere"),
            )
            .unwrap();

        // February: opening balance, outside the summarized period.
        ledger
            .adjust_balance(main.id, dec!(1000.00), date(2026, 2, 20), "opening balance")
            .unwrap();

        // March: one customer payment in, one expense out, one transfer.
        ledger
            .pay_document(PayDocument {
                document_id: DocumentId::new(),
                document_kind: DocumentKind::Invoice,
                total_due: dec!(600.00),
                currency: pln(),
                account_id: main.id,
                amount: dec!(600.00),
                posting_date: date(2026, 3, 5),
                idempotency_key: "cust-1".to_string(),
            })
            .unwrap();
        ledger
            .adjust_balance(main.id, dec!(-150.00), date(2026, 3, 12), "bank fees")
            .unwrap();
        ledger
            .transfer(main.id, vat.id, dec!(200.00), date(2026, 3, 20))
            .unwrap();

        // April: must not leak into the March totals or closings.
        ledger
            .adjust_balance(main.id, dec!(999.00), date(2026, 4, 1), "next month")
            .unwrap();

        // Other entity's traffic is invisible here.
        ledger
            .adjust_balance(foreign.id, dec!(5000.00), date(2026, 3, 5), "noise")
            .unwrap();

        let summary = summarize(ledger.store(), entity_id, 2026, 3).unwrap();

        // Income: 600 payment + 200 transfer credit; expenses: 150 + 200 debit.
        assert_eq!(summary.total_income, dec!(800.00));
        assert_eq!(summary.total_expense, dec!(350.00));
        assert_eq!(summary.net_result, dec!(450.00));

        assert_eq!(summary.per_account_balances.len(), 2);
        let balance_of = |id| {
            summary
                .per_account_balances
                .iter()
                .find(|b| b.account_id == id)
                .map(|b| b.balance)
                .unwrap()
        };
        assert_eq!(balance_of(main.id), dec!(1250.00));
        assert_eq!(balance_of(vat.id), dec!(200.00));
    }

    #[test]
    fn empty_entity_summarizes_to_zeroes() {
        let store = InMemoryTreasuryStore::new();
        let summary = summarize(&store, EntityId::new(), 2026, 3).unwrap();
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.net_result, Decimal::ZERO);
        assert!(summary.per_account_balances.is_empty());
    }

    #[test]
    fn invalid_period_is_rejected() {
        let store = InMemoryTreasuryStore::new();
        assert!(summarize(&store, EntityId::new(), 2026, 13).is_err());
    }
}
