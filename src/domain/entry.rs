use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable, NamedEntity};

/// Distinguishes calories taken in from calories burned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Meal,
    Workout,
}

impl EntryKind {
    /// Sign applied to an entry's calories when it contributes to the running total.
    pub fn sign(self) -> f64 {
        match self {
            EntryKind::Meal => 1.0,
            EntryKind::Workout => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Meal => "meal",
            EntryKind::Workout => "workout",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded meal or workout.
///
/// Entries are immutable once created. Two entries compare equal when their ids match,
/// regardless of the remaining fields.
#[derive(Debug, Clone)]
pub struct Entry {
    id: Uuid,
    name: String,
    calories: f64,
    kind: EntryKind,
    logged_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Creates an entry with a freshly generated id.
    pub fn new(name: impl Into<String>, calories: f64, kind: EntryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            calories,
            kind,
            logged_at: Some(Utc::now()),
        }
    }

    pub fn meal(name: impl Into<String>, calories: f64) -> Self {
        Self::new(name, calories, EntryKind::Meal)
    }

    pub fn workout(name: impl Into<String>, calories: f64) -> Self {
        Self::new(name, calories, EntryKind::Workout)
    }

    /// Rebuilds an entry from its persisted form; the kind comes from the key it was stored under.
    pub fn from_stored(stored: StoredEntry, kind: EntryKind) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            calories: stored.calories,
            kind,
            logged_at: stored.logged_at,
        }
    }

    pub fn to_stored(&self) -> StoredEntry {
        StoredEntry {
            id: self.id,
            name: self.name.clone(),
            calories: self.calories,
            logged_at: self.logged_at,
        }
    }

    /// Files the entry under `kind`, mirroring how the storage key decides the kind.
    pub(crate) fn into_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn logged_at(&self) -> Option<DateTime<Utc>> {
        self.logged_at
    }

    /// Calories as they count toward the net total: positive for meals, negative for workouts.
    pub fn net_calories(&self) -> f64 {
        self.kind.sign() * self.calories
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl Identifiable for Entry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Entry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Entry {
    fn display_label(&self) -> String {
        format!("{} ({} kcal)", self.name, format_calories(self.calories))
    }
}

/// Wire representation of an entry inside the `meals` / `workouts` keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEntry {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<Utc>>,
}

/// Renders a calorie amount without a trailing `.0` for whole numbers.
pub fn format_calories(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_id_only() {
        let eggs = Entry::meal("Eggs", 300.0);
        let mut stored = eggs.to_stored();
        stored.name = "Renamed".into();
        stored.calories = 1.0;
        let same_id = Entry::from_stored(stored, EntryKind::Meal);
        assert_eq!(eggs, same_id);
        assert_ne!(eggs, Entry::meal("Eggs", 300.0));
    }

    #[test]
    fn net_calories_follow_kind() {
        assert_eq!(Entry::meal("Toast", 120.0).net_calories(), 120.0);
        assert_eq!(Entry::workout("Swim", 250.0).net_calories(), -250.0);
    }

    #[test]
    fn stored_form_omits_kind_and_keeps_fields() {
        let run = Entry::workout("Run", 200.5);
        let json = serde_json::to_value(run.to_stored()).expect("serialize entry");
        assert!(json.get("kind").is_none());
        assert_eq!(json["name"], "Run");
        assert_eq!(json["calories"], 200.5);
        assert_eq!(json["id"], run.id().to_string());
    }

    #[test]
    fn legacy_entries_without_timestamp_decode() {
        let raw = r#"{"id":"2f1c6f3e-9a51-4b43-9a43-0c2a4f4c8f11","name":"Soup","calories":150}"#;
        let stored: StoredEntry = serde_json::from_str(raw).expect("decode legacy entry");
        let entry = Entry::from_stored(stored, EntryKind::Meal);
        assert_eq!(entry.name(), "Soup");
        assert!(entry.logged_at().is_none());
    }

    #[test]
    fn calorie_formatting_drops_whole_fraction() {
        assert_eq!(format_calories(300.0), "300");
        assert_eq!(format_calories(-50.0), "-50");
        assert_eq!(format_calories(12.34), "12.3");
    }
}
