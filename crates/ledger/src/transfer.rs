use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treasury_core::{AccountId, CurrencyCode, TransferId};

/// Receipt for an executed transfer.
///
/// Not separately persisted: the two movements tagged with `id` (the
/// negative leg on the source, the positive leg on the destination) are
/// the ground truth, and they commit as one unit or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub posting_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
