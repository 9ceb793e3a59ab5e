use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treasury_core::{AccountId, DocumentId, MovementId, TransferId};

/// Kind of business document a payment reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Expense,
}

/// What produced a movement. The payload doubles as the source reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MovementSource {
    DocumentPayment {
        document_id: DocumentId,
        document_kind: DocumentKind,
    },
    Transfer {
        transfer_id: TransferId,
    },
    Adjustment,
    Reversal {
        reverses: MovementId,
    },
}

/// An immutable, signed, dated entry in an account's ledger.
///
/// Positive amounts are inflows, negative amounts outflows. A movement's
/// financial content never changes after it is appended; undoing one means
/// appending an opposite-signed reversal and setting the `reversed_by`
/// annotation, the single permitted, set-once mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub posting_date: NaiveDate,
    /// Stamped by the store inside its append critical section. Second key
    /// of the canonical order, so same-day movements fold deterministically.
    pub created_at: DateTime<Utc>,
    pub source: MovementSource,
    /// Set exactly once, atomically with the reversal's append.
    pub reversed_by: Option<MovementId>,
    /// Audit note; mandatory for adjustments.
    pub note: Option<String>,
    /// Caller-supplied retry guard; document payments only.
    pub idempotency_key: Option<String>,
}

impl Movement {
    /// The document this movement pays, if it is a document payment.
    pub fn document_id(&self) -> Option<DocumentId> {
        match self.source {
            MovementSource::DocumentPayment { document_id, .. } => Some(document_id),
            _ => None,
        }
    }

    /// The movement this one reverses, if it is a reversal.
    pub fn reverses(&self) -> Option<MovementId> {
        match self.source {
            MovementSource::Reversal { reverses } => Some(reverses),
            _ => None,
        }
    }

    pub fn is_reversal(&self) -> bool {
        matches!(self.source, MovementSource::Reversal { .. })
    }
}

/// A movement ready to be appended. `created_at` is deliberately absent:
/// the store stamps it when the batch commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub posting_date: NaiveDate,
    pub source: MovementSource,
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Sort movements into the canonical total order:
/// `(posting_date, created_at, id)` ascending.
///
/// Every derived value (balances, document payment states, summaries) is
/// computed in this order, which makes results independent of storage
/// iteration order.
pub fn sort_canonical(movements: &mut [Movement]) {
    movements.sort_by(|a, b| {
        (a.posting_date, a.created_at, a.id.as_uuid())
            .cmp(&(b.posting_date, b.created_at, b.id.as_uuid()))
    });
}
