use uuid::Uuid;

use crate::domain::{Entry, EntryKind};

use super::BudgetSnapshot;

/// Notification produced by a ledger operation, to be forwarded to views.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    EntryAdded(Entry),
    EntryRemoved { kind: EntryKind, id: Uuid },
    /// Every entry is gone; views drop whatever they are showing.
    Cleared,
    Recompute(BudgetSnapshot),
}

impl LedgerEvent {
    pub fn is_recompute(&self) -> bool {
        matches!(self, LedgerEvent::Recompute(_))
    }
}
