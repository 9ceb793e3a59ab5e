use std::collections::HashMap;

use crate::account::AccountKind;

/// Whether a transfer may drive the source account below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverdraftPolicy {
    /// No balance check blocks a transfer (default).
    #[default]
    Allow,
    /// Reject transfers the source balance does not cover.
    Deny,
}

/// Engine configuration.
///
/// Overdraft handling and period reopening are deliberately knobs rather
/// than hard-coded rules; the defaults are "overdraft allowed, locks
/// one-directional".
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Per-kind overdraft policy; kinds without an entry fall back to
    /// [`OverdraftPolicy::Allow`].
    pub overdraft: HashMap<AccountKind, OverdraftPolicy>,
    /// Permit `locked → open` period reopening.
    pub allow_reopen: bool,
}

impl LedgerConfig {
    pub fn overdraft_for(&self, kind: AccountKind) -> OverdraftPolicy {
        self.overdraft.get(&kind).copied().unwrap_or_default()
    }

    pub fn deny_overdraft(mut self, kind: AccountKind) -> Self {
        self.overdraft.insert(kind, OverdraftPolicy::Deny);
        self
    }

    pub fn with_reopen_allowed(mut self) -> Self {
        self.allow_reopen = true;
        self
    }
}
