//! Key layout and value encoding for persisted ledger state.

use std::fmt;

use tracing::warn;

use crate::{
    config::DecodePolicy,
    domain::{Entry, EntryKind, StoredEntry},
    errors::{LedgerError, Result},
};

use super::{KeyValueStore, WriteBatch};

/// Keys owned by the ledger inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    Limit,
    Total,
    Meals,
    Workouts,
}

impl LedgerKey {
    /// Keys removed by a reset. `limit` survives.
    pub const RESETTABLE: [LedgerKey; 3] = [LedgerKey::Total, LedgerKey::Meals, LedgerKey::Workouts];

    pub fn as_str(self) -> &'static str {
        match self {
            LedgerKey::Limit => "limit",
            LedgerKey::Total => "total",
            LedgerKey::Meals => "meals",
            LedgerKey::Workouts => "workouts",
        }
    }

    pub fn for_kind(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Meal => LedgerKey::Meals,
            EntryKind::Workout => LedgerKey::Workouts,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw ledger state as found in the store. Absent keys stay `None`/empty so the ledger can
/// apply its own defaults.
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    pub limit: Option<f64>,
    pub total: Option<f64>,
    pub meals: Vec<Entry>,
    pub workouts: Vec<Entry>,
}

/// Reads every ledger key, decoding according to `policy`.
pub fn load_state<S: KeyValueStore + ?Sized>(
    store: &S,
    policy: DecodePolicy,
) -> Result<PersistedState> {
    Ok(PersistedState {
        limit: read_key(store, LedgerKey::Limit, policy, decode_number)?,
        total: read_key(store, LedgerKey::Total, policy, decode_number)?,
        meals: read_key(store, LedgerKey::Meals, policy, |key, raw| {
            decode_entries(key, raw, EntryKind::Meal)
        })?
        .unwrap_or_default(),
        workouts: read_key(store, LedgerKey::Workouts, policy, |key, raw| {
            decode_entries(key, raw, EntryKind::Workout)
        })?
        .unwrap_or_default(),
    })
}

fn read_key<S, T, F>(store: &S, key: LedgerKey, policy: DecodePolicy, decode: F) -> Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    F: FnOnce(LedgerKey, &str) -> Result<T>,
{
    let Some(raw) = store.get(key.as_str())? else {
        return Ok(None);
    };
    match decode(key, &raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => match policy {
            DecodePolicy::Strict => Err(err),
            DecodePolicy::Fallback => {
                warn!(key = key.as_str(), error = %err, "discarding undecodable value, using default");
                Ok(None)
            }
        },
    }
}

pub fn encode_number(value: f64) -> String {
    value.to_string()
}

pub fn decode_number(key: LedgerKey, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| LedgerError::decode(key.as_str(), format!("`{raw}` is not a number")))?;
    if !value.is_finite() {
        return Err(LedgerError::decode(
            key.as_str(),
            format!("`{raw}` is not a finite number"),
        ));
    }
    Ok(value)
}

pub fn encode_entries(entries: &[Entry]) -> Result<String> {
    let stored: Vec<StoredEntry> = entries.iter().map(Entry::to_stored).collect();
    Ok(serde_json::to_string(&stored)?)
}

pub fn decode_entries(key: LedgerKey, raw: &str, kind: EntryKind) -> Result<Vec<Entry>> {
    let stored: Vec<StoredEntry> =
        serde_json::from_str(raw).map_err(|err| LedgerError::decode(key.as_str(), err.to_string()))?;
    Ok(stored
        .into_iter()
        .map(|entry| Entry::from_stored(entry, kind))
        .collect())
}

/// Adds the encoded collection plus the running total to `batch`.
pub fn stage_collection(
    batch: WriteBatch,
    kind: EntryKind,
    entries: &[Entry],
    total: f64,
) -> Result<WriteBatch> {
    Ok(batch
        .set(LedgerKey::for_kind(kind).as_str(), encode_entries(entries)?)
        .set(LedgerKey::Total.as_str(), encode_number(total)))
}
