//! `treasury-core` — domain foundation for the treasury ledger.
//!
//! Pure domain primitives only: identifiers, the error taxonomy and the
//! money value objects. No IO, no persistence concerns.

pub mod error;
pub mod id;
pub mod money;

pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, DocumentId, EntityId, MovementId, PeriodId, TransferId};
pub use money::{CurrencyCode, CURRENCY_SCALE};
