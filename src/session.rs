//! Composition root tying one ledger to one view for the lifetime of a session.

use uuid::Uuid;

use crate::{
    domain::Entry,
    errors::Result,
    ledger::{BudgetLedger, LedgerEvent, LedgerOptions},
    storage::KeyValueStore,
    view::{dispatch, LedgerView},
};

/// Owns the ledger and the view; every user intent goes through here.
pub struct Session<S: KeyValueStore, V: LedgerView> {
    ledger: BudgetLedger<S>,
    view: V,
    options: LedgerOptions,
}

impl<S: KeyValueStore, V: LedgerView> Session<S, V> {
    /// Opens the ledger and renders its current state into `view`.
    pub fn start(store: S, options: LedgerOptions, mut view: V) -> Result<Self> {
        let ledger = BudgetLedger::open_with(store, options)?;
        dispatch(&mut view, &ledger.replay());
        Ok(Self {
            ledger,
            view,
            options,
        })
    }

    pub fn ledger(&self) -> &BudgetLedger<S> {
        &self.ledger
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn add_meal(&mut self, entry: Entry) -> Result<()> {
        let events = self.ledger.add_meal(entry)?;
        self.publish(&events);
        Ok(())
    }

    pub fn add_workout(&mut self, entry: Entry) -> Result<()> {
        let events = self.ledger.add_workout(entry)?;
        self.publish(&events);
        Ok(())
    }

    /// Returns `false` when no meal had that id.
    pub fn remove_meal(&mut self, id: Uuid) -> Result<bool> {
        let events = self.ledger.remove_meal(id)?;
        self.publish(&events);
        Ok(!events.is_empty())
    }

    /// Returns `false` when no workout had that id.
    pub fn remove_workout(&mut self, id: Uuid) -> Result<bool> {
        let events = self.ledger.remove_workout(id)?;
        self.publish(&events);
        Ok(!events.is_empty())
    }

    pub fn change_limit(&mut self, value: f64) -> Result<()> {
        let events = self.ledger.change_limit(value)?;
        self.publish(&events);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        let events = self.ledger.reset()?;
        self.publish(&events);
        Ok(())
    }

    /// Rewrites the store through `change` and re-renders the reloaded ledger.
    pub fn restore<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        let events = self.ledger.restore_from(self.options, change)?;
        self.publish(&events);
        Ok(())
    }

    /// Pushes a fresh snapshot to the view without changing anything.
    pub fn refresh(&mut self) {
        let snapshot = self.ledger.snapshot();
        self.view.on_recompute(&snapshot);
    }

    fn publish(&mut self, events: &[LedgerEvent]) {
        dispatch(&mut self.view, events);
    }
}
