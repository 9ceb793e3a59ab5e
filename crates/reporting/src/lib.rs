//! `treasury-reporting` — read-only rollups over the movement log.
//!
//! Reporting never mutates the ledger; every value here is re-derived
//! from the store on each call.

pub mod summary;

pub use summary::{summarize, AccountBalance, TreasurySummary};
