#![doc(test(attr(deny(warnings))))]

//! Calorie Core keeps a daily calorie budget: meals add to a running total,
//! workouts subtract from it, and every change is persisted before it is shown.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod utils;
pub mod view;

pub use domain::{Entry, EntryKind};
pub use errors::{LedgerError, Result};
pub use ledger::{BudgetLedger, BudgetSnapshot, LedgerEvent, LedgerOptions};
pub use session::Session;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use view::LedgerView;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Calorie Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
