use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use treasury_core::{AccountId, CurrencyCode, EntityId};

/// Payment account kind.
///
/// `main` carries the operating balance; `vat` and `tax` exist for
/// split-payment and tax-prepayment flows, `cash` for petty cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Main,
    Vat,
    Tax,
    Cash,
    Other,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Main => "main",
            AccountKind::Vat => "vat",
            AccountKind::Tax => "tax",
            AccountKind::Cash => "cash",
            AccountKind::Other => "other",
        }
    }
}

/// Display metadata, the only part of an account that may change after
/// creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub name: String,
    /// Bank account number, when the account maps to a real bank account.
    /// Unique within an entity when present.
    pub account_number: Option<String>,
}

impl AccountMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_number: None,
        }
    }
}

/// A payment account. Identity, owning entity, kind and currency are fixed
/// at creation; the currency in particular is validated once and never
/// revisited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub id: AccountId,
    pub entity_id: EntityId,
    pub kind: AccountKind,
    pub currency: CurrencyCode,
    pub metadata: AccountMetadata,
    pub created_at: DateTime<Utc>,
}
