//! The presentation contract: what a view receives from the ledger and how user input is
//! checked before it reaches the ledger.

pub mod filter;
pub mod input;

use uuid::Uuid;

use crate::{
    domain::{Entry, EntryKind},
    ledger::{BudgetSnapshot, LedgerEvent},
};

pub use filter::filter_entries;
pub use input::{parse_calories, parse_entry, parse_limit, InputError};

/// Receives ledger notifications. Implementations render; they never touch the store.
pub trait LedgerView {
    fn on_new_meal(&mut self, entry: &Entry);
    fn on_new_workout(&mut self, entry: &Entry);
    fn on_recompute(&mut self, snapshot: &BudgetSnapshot);

    fn on_entry_removed(&mut self, kind: EntryKind, id: Uuid) {
        let _ = (kind, id);
    }

    fn on_reset(&mut self) {}
}

/// Forwards ledger events to `view` in the order they were produced.
pub fn dispatch<V: LedgerView + ?Sized>(view: &mut V, events: &[LedgerEvent]) {
    for event in events {
        match event {
            LedgerEvent::EntryAdded(entry) => match entry.kind() {
                EntryKind::Meal => view.on_new_meal(entry),
                EntryKind::Workout => view.on_new_workout(entry),
            },
            LedgerEvent::EntryRemoved { kind, id } => view.on_entry_removed(*kind, *id),
            LedgerEvent::Cleared => view.on_reset(),
            LedgerEvent::Recompute(snapshot) => view.on_recompute(snapshot),
        }
    }
}

/// View that records every notification; handy for tests and headless sessions.
#[derive(Debug, Default, Clone)]
pub struct RecordingView {
    pub meals: Vec<Entry>,
    pub workouts: Vec<Entry>,
    pub removed: Vec<(EntryKind, Uuid)>,
    pub snapshots: Vec<BudgetSnapshot>,
}

impl RecordingView {
    pub fn last_snapshot(&self) -> Option<&BudgetSnapshot> {
        self.snapshots.last()
    }
}

impl LedgerView for RecordingView {
    fn on_new_meal(&mut self, entry: &Entry) {
        self.meals.push(entry.clone());
    }

    fn on_new_workout(&mut self, entry: &Entry) {
        self.workouts.push(entry.clone());
    }

    fn on_recompute(&mut self, snapshot: &BudgetSnapshot) {
        self.snapshots.push(*snapshot);
    }

    fn on_entry_removed(&mut self, kind: EntryKind, id: Uuid) {
        self.removed.push((kind, id));
    }

    fn on_reset(&mut self) {
        self.meals.clear();
        self.workouts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identifiable;

    #[test]
    fn dispatch_routes_by_kind() {
        let meal = Entry::meal("Eggs", 300.0);
        let workout = Entry::workout("Run", 200.0);
        let snapshot = BudgetSnapshot::compute(2000.0, 100.0, 300.0, 200.0);
        let events = vec![
            LedgerEvent::EntryAdded(meal.clone()),
            LedgerEvent::EntryAdded(workout.clone()),
            LedgerEvent::EntryRemoved {
                kind: EntryKind::Meal,
                id: meal.id(),
            },
            LedgerEvent::Recompute(snapshot),
        ];

        let mut view = RecordingView::default();
        dispatch(&mut view, &events);

        assert_eq!(view.meals, vec![meal.clone()]);
        assert_eq!(view.workouts, vec![workout]);
        assert_eq!(view.removed, vec![(EntryKind::Meal, meal.id())]);
        assert_eq!(view.last_snapshot(), Some(&snapshot));

        dispatch(&mut view, &[LedgerEvent::Cleared]);
        assert!(view.meals.is_empty());
        assert!(view.workouts.is_empty());
    }
}
