//! `treasury-ledger` — append-only movement log with derived projections.
//!
//! Movements are the only ground truth: balances, document payment states
//! and summaries are pure folds over the movement log in canonical order
//! (`posting_date, created_at, id`). Mutating operations pass the period
//! lock guard and commit as single atomic store batches, so readers see
//! multi-movement operations either fully applied or not at all.

pub mod account;
pub mod config;
pub mod engine;
pub mod movement;
pub mod payment;
pub mod period;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod integration_tests;

pub use account::{AccountKind, AccountMetadata, PaymentAccount};
pub use config::{LedgerConfig, OverdraftPolicy};
pub use engine::TreasuryLedger;
pub use movement::{sort_canonical, DocumentKind, Movement, MovementSource, NewMovement};
pub use payment::{PayDocument, PaymentOutcome, PaymentStatus};
pub use period::{LockStamp, Period, PeriodStatus};
pub use store::memory::InMemoryTreasuryStore;
pub use store::{StoreError, TreasuryStore};
pub use transfer::Transfer;
