//! The calorie ledger: limit, running total, and the meal and workout collections.

pub mod budget_ledger;
pub mod events;
pub mod snapshot;

pub use budget_ledger::{BudgetLedger, ConsistencyReport, LedgerOptions};
pub use events::LedgerEvent;
pub use snapshot::BudgetSnapshot;
