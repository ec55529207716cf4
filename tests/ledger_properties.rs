mod common;

use calorie_core::{
    domain::Identifiable, storage::KeyValueStore, BudgetLedger, Entry, EntryKind, MemoryStore,
};
use common::Lcg;

fn entry_sum(ledger: &BudgetLedger<MemoryStore>) -> f64 {
    ledger.meals().iter().map(Entry::calories).sum::<f64>()
        - ledger.workouts().iter().map(Entry::calories).sum::<f64>()
}

#[test]
fn total_tracks_entries_through_random_operations() {
    for seed in 1..=20u64 {
        let mut rng = Lcg::new(seed);
        let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();

        for step in 0..200 {
            match rng.below(10) {
                0..=3 => {
                    let calories = rng.below(9000) as f64 / 10.0;
                    ledger
                        .add_meal(Entry::meal(format!("meal {step}"), calories))
                        .unwrap();
                }
                4..=6 => {
                    let calories = rng.below(6000) as f64 / 10.0;
                    ledger
                        .add_workout(Entry::workout(format!("workout {step}"), calories))
                        .unwrap();
                }
                7 => {
                    if let Some(entry) = pick(ledger.meals(), &mut rng) {
                        ledger.remove_meal(entry).unwrap();
                    }
                }
                8 => {
                    if let Some(entry) = pick(ledger.workouts(), &mut rng) {
                        ledger.remove_workout(entry).unwrap();
                    }
                }
                _ => {
                    ledger.change_limit(rng.below(4000) as f64).unwrap();
                }
            }
            assert_eq!(ledger.total(), entry_sum(&ledger), "seed {seed} step {step}");
            assert_eq!(ledger.remaining(), ledger.limit() - ledger.total());
        }

        let reopened = BudgetLedger::open(ledger.store().clone()).unwrap();
        assert_eq!(reopened.total(), ledger.total(), "seed {seed}");
        assert_eq!(reopened.limit(), ledger.limit());
        assert_eq!(reopened.meals().len(), ledger.meals().len());
        assert_eq!(reopened.workouts().len(), ledger.workouts().len());
    }
}

fn pick(entries: &[Entry], rng: &mut Lcg) -> Option<uuid::Uuid> {
    if entries.is_empty() {
        return None;
    }
    let idx = rng.below(entries.len() as u64) as usize;
    Some(entries[idx].id())
}

#[test]
fn fractional_removals_leave_no_rounding_residue() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    let grape = Entry::meal("Grape", 0.1);
    let grape_id = grape.id();
    ledger.add_meal(grape).unwrap();
    ledger.add_meal(Entry::meal("Berry", 0.2)).unwrap();
    ledger.add_workout(Entry::workout("Stretch", 0.7)).unwrap();
    ledger.remove_meal(grape_id).unwrap();

    assert_eq!(ledger.total(), ledger.derived_total());
    assert_eq!(ledger.total(), entry_sum(&ledger));
    assert!(ledger.verify().is_consistent());
}

#[test]
fn add_then_remove_restores_previous_state() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    ledger.add_meal(Entry::meal("Oats", 350.0)).unwrap();
    ledger.add_workout(Entry::workout("Swim", 400.0)).unwrap();
    let before_total = ledger.total();
    let before_store = ledger.store().clone();

    let pizza = Entry::meal("Pizza", 800.0);
    let pizza_id = pizza.id();
    ledger.add_meal(pizza).unwrap();
    ledger.remove_meal(pizza_id).unwrap();
    assert_eq!(ledger.total(), before_total);

    let bike = Entry::workout("Bike", 250.0);
    let bike_id = bike.id();
    ledger.add_workout(bike).unwrap();
    ledger.remove_workout(bike_id).unwrap();
    assert_eq!(ledger.total(), before_total);
    assert_eq!(ledger.meals().len(), 1);
    assert_eq!(ledger.workouts().len(), 1);

    let reopened = BudgetLedger::open(ledger.store().clone()).unwrap();
    let original = BudgetLedger::open(before_store).unwrap();
    assert_eq!(reopened.total(), original.total());
    assert_eq!(reopened.meals(), original.meals());
    assert_eq!(reopened.workouts(), original.workouts());
}

#[test]
fn reset_is_idempotent_and_keeps_limit() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    ledger.change_limit(1800.0).unwrap();
    ledger.add_meal(Entry::meal("Eggs", 300.0)).unwrap();
    ledger.add_workout(Entry::workout("Run", 200.0)).unwrap();

    ledger.reset().unwrap();
    let once = ledger.store().clone();
    ledger.reset().unwrap();

    assert_eq!(ledger.store(), &once);
    assert_eq!(ledger.total(), 0.0);
    assert!(ledger.meals().is_empty());
    assert!(ledger.workouts().is_empty());
    assert_eq!(ledger.limit(), 1800.0);
    assert_eq!(ledger.store().keys().collect::<Vec<_>>(), vec!["limit"]);
}

#[test]
fn limit_changes_touch_only_the_limit_key() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    ledger.add_meal(Entry::meal("Eggs", 300.0)).unwrap();
    ledger.add_workout(Entry::workout("Run", 200.0)).unwrap();
    let before = ledger.store().clone();

    ledger.change_limit(1200.0).unwrap();

    for key in ["total", "meals", "workouts"] {
        assert_eq!(
            ledger.store().get(key).unwrap(),
            before.get(key).unwrap(),
            "`{key}` changed"
        );
    }
    assert_eq!(ledger.store().get("limit").unwrap().as_deref(), Some("1200"));
    assert_eq!(ledger.total(), 100.0);
    assert_eq!(ledger.remaining(), 1100.0);
}

#[test]
fn removing_unknown_ids_changes_nothing() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    let eggs = Entry::meal("Eggs", 300.0);
    let eggs_id = eggs.id();
    ledger.add_meal(eggs).unwrap();
    let before = ledger.store().clone();

    assert!(ledger.remove_meal(uuid::Uuid::new_v4()).unwrap().is_empty());
    // A meal id is unknown to the workout collection.
    assert!(ledger.remove_workout(eggs_id).unwrap().is_empty());

    assert_eq!(ledger.store(), &before);
    assert_eq!(ledger.total(), 300.0);
}

#[test]
fn over_budget_and_progress_follow_the_limit() {
    let mut ledger = BudgetLedger::open(MemoryStore::new()).unwrap();
    ledger.add_meal(Entry::meal("Feast", 2500.0)).unwrap();
    assert!(ledger.over_budget());
    assert_eq!(ledger.progress_percent(), 100.0);

    ledger.change_limit(5000.0).unwrap();
    assert!(!ledger.over_budget());
    assert_eq!(ledger.progress_percent(), 50.0);

    ledger.change_limit(0.0).unwrap();
    assert!(ledger.over_budget());
    assert_eq!(ledger.progress_percent(), 100.0);

    let kinds: Vec<EntryKind> = ledger.meals().iter().map(Entry::kind).collect();
    assert_eq!(kinds, vec![EntryKind::Meal]);
}
