use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treasury_core::{AccountId, CurrencyCode, DocumentId, MovementId};

use crate::movement::DocumentKind;

/// Command: register a payment against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayDocument {
    pub document_id: DocumentId,
    pub document_kind: DocumentKind,
    /// What the document asks for in total, in the account's currency.
    pub total_due: Decimal,
    pub currency: CurrencyCode,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub posting_date: NaiveDate,
    /// Caller-supplied retry guard. A replay with a key already on file
    /// returns the existing movement instead of posting a second one.
    pub idempotency_key: String,
}

/// Derived payment state of a document. Overpayment is a reported state,
/// not an error; callers decide whether to reconcile it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Overpaid,
}

/// Result of `pay_document` / `payment_status`. Always recomputed by
/// folding the document's movements; there is no stored counterpart that
/// could drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub amount_paid: Decimal,
    /// Still owed; clamped at zero once paid or overpaid.
    pub remaining: Decimal,
    /// The movement this call posted or replayed; `None` for the pure
    /// status read.
    pub movement_id: Option<MovementId>,
}

/// Fold a document's paid total into its status.
pub(crate) fn derive_status(amount_paid: Decimal, total_due: Decimal) -> PaymentStatus {
    if amount_paid <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if amount_paid < total_due {
        PaymentStatus::Partial
    } else if amount_paid == total_due {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Overpaid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_thresholds() {
        let due = dec!(1000.00);
        assert_eq!(derive_status(dec!(0), due), PaymentStatus::Unpaid);
        assert_eq!(derive_status(dec!(0.01), due), PaymentStatus::Partial);
        assert_eq!(derive_status(dec!(999.99), due), PaymentStatus::Partial);
        assert_eq!(derive_status(dec!(1000.00), due), PaymentStatus::Paid);
        assert_eq!(derive_status(dec!(1000.01), due), PaymentStatus::Overpaid);
    }

    #[test]
    fn negative_paid_total_reads_as_unpaid() {
        assert_eq!(derive_status(dec!(-10.00), dec!(100.00)), PaymentStatus::Unpaid);
    }
}
