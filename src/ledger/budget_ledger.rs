use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::{Config, DecodePolicy, DriftPolicy, DEFAULT_LIMIT},
    domain::{Entry, EntryKind, Identifiable},
    errors::{LedgerError, Result},
    storage::{
        codec::{self, encode_number, LedgerKey, PersistedState},
        KeyValueStore, WriteBatch,
    },
};

use super::{BudgetSnapshot, LedgerEvent};

/// Knobs applied when a ledger is loaded from its store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerOptions {
    pub default_limit: f64,
    pub decode_policy: DecodePolicy,
    pub drift_policy: DriftPolicy,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            decode_policy: DecodePolicy::default(),
            drift_policy: DriftPolicy::default(),
        }
    }
}

impl From<&Config> for LedgerOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_limit: config.default_limit,
            decode_policy: config.decode_policy,
            drift_policy: config.drift_policy,
        }
    }
}

/// Result of comparing the cached total with the recorded entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub cached_total: f64,
    pub derived_total: f64,
    pub duplicate_meal_ids: Vec<Uuid>,
    pub duplicate_workout_ids: Vec<Uuid>,
}

impl ConsistencyReport {
    pub fn drift(&self) -> f64 {
        self.cached_total - self.derived_total
    }

    /// Totals are always re-derived from the entries on write, so any difference is drift.
    pub fn has_drift(&self) -> bool {
        self.cached_total != self.derived_total
    }

    pub fn is_consistent(&self) -> bool {
        !self.has_drift()
            && self.duplicate_meal_ids.is_empty()
            && self.duplicate_workout_ids.is_empty()
    }
}

/// Calorie limit, running total and the recorded meals and workouts.
///
/// Every mutation is persisted as one [`WriteBatch`] before the in-memory state changes, so
/// a failed write leaves the ledger exactly as it was. Operations return the
/// [`LedgerEvent`]s a view needs to catch up.
#[derive(Debug)]
pub struct BudgetLedger<S: KeyValueStore> {
    store: S,
    limit: f64,
    total: f64,
    meals: Vec<Entry>,
    workouts: Vec<Entry>,
}

impl<S: KeyValueStore> BudgetLedger<S> {
    /// Loads the ledger with default options.
    pub fn open(store: S) -> Result<Self> {
        Self::open_with(store, LedgerOptions::default())
    }

    /// Loads every key from `store`, defaulting each one independently when absent.
    pub fn open_with(store: S, options: LedgerOptions) -> Result<Self> {
        let mut ledger = Self {
            store,
            limit: options.default_limit,
            total: 0.0,
            meals: Vec::new(),
            workouts: Vec::new(),
        };
        ledger.load(options)?;
        info!(
            limit = ledger.limit,
            total = ledger.total,
            meals = ledger.meals.len(),
            workouts = ledger.workouts.len(),
            "ledger loaded"
        );
        Ok(ledger)
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn meals(&self) -> &[Entry] {
        &self.meals
    }

    pub fn workouts(&self) -> &[Entry] {
        &self.workouts
    }

    pub fn entries(&self, kind: EntryKind) -> &[Entry] {
        match kind {
            EntryKind::Meal => &self.meals,
            EntryKind::Workout => &self.workouts,
        }
    }

    pub fn find(&self, kind: EntryKind, id: Uuid) -> Option<&Entry> {
        self.entries(kind).iter().find(|entry| entry.id() == id)
    }

    pub fn consumed(&self) -> f64 {
        sum_calories(&self.meals)
    }

    pub fn burned(&self) -> f64 {
        sum_calories(&self.workouts)
    }

    pub fn remaining(&self) -> f64 {
        self.limit - self.total
    }

    pub fn progress_percent(&self) -> f64 {
        super::snapshot::progress_percent(self.limit, self.total)
    }

    pub fn over_budget(&self) -> bool {
        super::snapshot::is_over_budget(self.limit, self.remaining())
    }

    /// Net calories recomputed from the entries, ignoring the cached total.
    pub fn derived_total(&self) -> f64 {
        net_total(&self.meals, &self.workouts)
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot::compute(self.limit, self.total, self.consumed(), self.burned())
    }

    pub fn verify(&self) -> ConsistencyReport {
        ConsistencyReport {
            cached_total: self.total,
            derived_total: self.derived_total(),
            duplicate_meal_ids: duplicate_ids(&self.meals),
            duplicate_workout_ids: duplicate_ids(&self.workouts),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn add_meal(&mut self, entry: Entry) -> Result<Vec<LedgerEvent>> {
        self.add(entry.into_kind(EntryKind::Meal))
    }

    pub fn add_workout(&mut self, entry: Entry) -> Result<Vec<LedgerEvent>> {
        self.add(entry.into_kind(EntryKind::Workout))
    }

    /// Adds an entry to the collection matching its own kind.
    pub fn add_entry(&mut self, entry: Entry) -> Result<Vec<LedgerEvent>> {
        self.add(entry)
    }

    pub fn remove_meal(&mut self, id: Uuid) -> Result<Vec<LedgerEvent>> {
        self.remove(EntryKind::Meal, id)
    }

    pub fn remove_workout(&mut self, id: Uuid) -> Result<Vec<LedgerEvent>> {
        self.remove(EntryKind::Workout, id)
    }

    pub fn change_limit(&mut self, value: f64) -> Result<Vec<LedgerEvent>> {
        ensure_finite(LedgerKey::Limit, value)?;
        self.store
            .apply(WriteBatch::new().set(LedgerKey::Limit.as_str(), encode_number(value)))?;
        self.limit = value;
        debug!(limit = value, "limit changed");
        Ok(vec![LedgerEvent::Recompute(self.snapshot())])
    }

    /// Clears the total and both collections. The limit is kept.
    pub fn reset(&mut self) -> Result<Vec<LedgerEvent>> {
        let batch = LedgerKey::RESETTABLE
            .iter()
            .fold(WriteBatch::new(), |batch, key| batch.remove(key.as_str()));
        self.store.apply(batch)?;
        self.total = 0.0;
        self.meals.clear();
        self.workouts.clear();
        info!(limit = self.limit, "ledger reset");
        Ok(vec![LedgerEvent::Cleared, LedgerEvent::Recompute(self.snapshot())])
    }

    /// Events that bring an empty view up to date with the current state.
    pub fn replay(&self) -> Vec<LedgerEvent> {
        self.meals
            .iter()
            .chain(self.workouts.iter())
            .cloned()
            .map(LedgerEvent::EntryAdded)
            .chain(std::iter::once(LedgerEvent::Recompute(self.snapshot())))
            .collect()
    }

    /// Lets `change` rewrite the underlying store (for example restoring a backup), then
    /// reloads every key from it.
    ///
    /// When `change` fails the in-memory state is left as it was. When the rewritten store
    /// cannot be decoded, the current state is written back over it and the decode error is
    /// returned.
    pub fn restore_from<F>(&mut self, options: LedgerOptions, change: F) -> Result<Vec<LedgerEvent>>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        change(&mut self.store)?;
        let state = match codec::load_state(&self.store, options.decode_policy) {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "restored data is unreadable, keeping the current ledger");
                let current = self.full_batch()?;
                self.store.apply(current)?;
                return Err(err);
            }
        };
        self.adopt(state, options)?;
        info!(total = self.total, "ledger reloaded from store");
        let mut events = vec![LedgerEvent::Cleared];
        events.extend(self.replay());
        Ok(events)
    }

    fn load(&mut self, options: LedgerOptions) -> Result<()> {
        let state = codec::load_state(&self.store, options.decode_policy)?;
        self.adopt(state, options)
    }

    fn adopt(&mut self, state: PersistedState, options: LedgerOptions) -> Result<()> {
        self.limit = state.limit.unwrap_or(options.default_limit);
        self.total = state.total.unwrap_or(0.0);
        self.meals = state.meals;
        self.workouts = state.workouts;
        self.reconcile(options.drift_policy)
    }

    fn add(&mut self, entry: Entry) -> Result<Vec<LedgerEvent>> {
        let kind = entry.kind();
        if self.find(kind, entry.id()).is_some() {
            warn!(id = %entry.id(), %kind, "entry already recorded, ignoring");
            return Ok(Vec::new());
        }

        let mut staged = self.entries(kind).to_vec();
        staged.push(entry.clone());
        self.commit(kind, staged)?;

        debug!(id = %entry.id(), %kind, net = entry.net_calories(), total = self.total, "entry added");
        Ok(vec![
            LedgerEvent::EntryAdded(entry),
            LedgerEvent::Recompute(self.snapshot()),
        ])
    }

    fn remove(&mut self, kind: EntryKind, id: Uuid) -> Result<Vec<LedgerEvent>> {
        let Some(position) = self.entries(kind).iter().position(|entry| entry.id() == id) else {
            debug!(%id, %kind, "no entry to remove");
            return Ok(Vec::new());
        };

        let mut staged = self.entries(kind).to_vec();
        staged.remove(position);
        self.commit(kind, staged)?;

        debug!(%id, %kind, total = self.total, "entry removed");
        Ok(vec![
            LedgerEvent::EntryRemoved { kind, id },
            LedgerEvent::Recompute(self.snapshot()),
        ])
    }

    /// Persists a collection together with the total derived from it, then adopts both.
    ///
    /// The total is summed from scratch rather than adjusted, so it never accumulates
    /// rounding error.
    fn commit(&mut self, kind: EntryKind, entries: Vec<Entry>) -> Result<()> {
        let total = match kind {
            EntryKind::Meal => net_total(&entries, &self.workouts),
            EntryKind::Workout => net_total(&self.meals, &entries),
        };
        ensure_finite(LedgerKey::Total, total)?;
        let batch = codec::stage_collection(WriteBatch::new(), kind, &entries, total)?;
        self.store.apply(batch)?;
        match kind {
            EntryKind::Meal => self.meals = entries,
            EntryKind::Workout => self.workouts = entries,
        }
        self.total = total;
        Ok(())
    }

    /// Every ledger key as currently held in memory.
    fn full_batch(&self) -> Result<WriteBatch> {
        let batch = WriteBatch::new().set(LedgerKey::Limit.as_str(), encode_number(self.limit));
        let batch = codec::stage_collection(batch, EntryKind::Meal, &self.meals, self.total)?;
        codec::stage_collection(batch, EntryKind::Workout, &self.workouts, self.total)
    }

    fn reconcile(&mut self, policy: DriftPolicy) -> Result<()> {
        let report = self.verify();
        for id in report
            .duplicate_meal_ids
            .iter()
            .chain(report.duplicate_workout_ids.iter())
        {
            warn!(%id, "duplicate entry id in stored collection");
        }
        if !report.has_drift() {
            return Ok(());
        }
        warn!(
            cached = report.cached_total,
            derived = report.derived_total,
            ?policy,
            "stored total does not match recorded entries"
        );
        if policy == DriftPolicy::Repair && report.derived_total.is_finite() {
            self.store.set(
                LedgerKey::Total.as_str(),
                &encode_number(report.derived_total),
            )?;
            self.total = report.derived_total;
        }
        Ok(())
    }
}

fn sum_calories(entries: &[Entry]) -> f64 {
    entries.iter().map(Entry::calories).sum()
}

fn net_total(meals: &[Entry], workouts: &[Entry]) -> f64 {
    sum_calories(meals) - sum_calories(workouts)
}

/// Infinite or NaN values could be written but never read back.
fn ensure_finite(key: LedgerKey, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LedgerError::OutOfRange {
            key: key.as_str().to_string(),
            value,
        })
    }
}

fn duplicate_ids(entries: &[Entry]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        if !seen.insert(entry.id()) && !duplicates.contains(&entry.id()) {
            duplicates.push(entry.id());
        }
    }
    duplicates
}
