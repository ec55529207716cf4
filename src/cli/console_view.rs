use uuid::Uuid;

use crate::{
    domain::{entry::format_calories, Displayable, Entry, EntryKind, Identifiable},
    ledger::BudgetSnapshot,
    view::{filter_entries, LedgerView},
};

use super::output;

const BAR_WIDTH: usize = 20;
const SHORT_ID_LEN: usize = 8;

/// Terminal rendering of the ledger.
///
/// Keeps its own copy of the entries so listing and filtering never go back to the ledger.
#[derive(Debug, Default)]
pub struct ConsoleView {
    meals: Vec<Entry>,
    workouts: Vec<Entry>,
    announce_entries: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry notifications are silent until this is switched on, so the initial replay
    /// only fills the local copy.
    pub fn set_announce_entries(&mut self, announce: bool) {
        self.announce_entries = announce;
    }

    pub fn entries(&self, kind: EntryKind) -> &[Entry] {
        match kind {
            EntryKind::Meal => &self.meals,
            EntryKind::Workout => &self.workouts,
        }
    }

    /// Resolves a 1-based list position or an id prefix to an entry id.
    ///
    /// A reference as long as the listed short id is looked up as an id first, since short
    /// ids can be all digits. Shorter numbers are positions.
    pub fn resolve(&self, kind: EntryKind, reference: &str) -> Option<Uuid> {
        let needle = reference.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        if needle.len() >= SHORT_ID_LEN {
            if let Some(id) = self.match_prefix(kind, &needle) {
                return Some(id);
            }
        }
        if let Ok(position) = needle.parse::<usize>() {
            if let Some(entry) = position
                .checked_sub(1)
                .and_then(|idx| self.entries(kind).get(idx))
            {
                return Some(entry.id());
            }
        }
        self.match_prefix(kind, &needle)
    }

    fn match_prefix(&self, kind: EntryKind, needle: &str) -> Option<Uuid> {
        let mut matches = self.entries(kind).iter().filter(|entry| {
            let id = entry.id();
            id.to_string().starts_with(needle) || id.simple().to_string().starts_with(needle)
        });
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry.id()),
            _ => None,
        }
    }

    /// Prints both lists, keeping only names containing `query`.
    pub fn render_lists(&self, query: &str) {
        for kind in [EntryKind::Meal, EntryKind::Workout] {
            let title = match kind {
                EntryKind::Meal => "Meals",
                EntryKind::Workout => "Workouts",
            };
            output::section(title);
            let entries = self.entries(kind);
            let visible = filter_entries(entries, query);
            if visible.is_empty() {
                output::line("  (none)");
                continue;
            }
            for entry in visible {
                let position = entries
                    .iter()
                    .position(|candidate| candidate == entry)
                    .map(|idx| idx + 1)
                    .unwrap_or_default();
                output::line(format!(
                    "  {:>2}. {}  [{}]",
                    position,
                    entry.display_label(),
                    short_id(entry.id())
                ));
            }
        }
    }

    fn record(&mut self, entry: &Entry) {
        let list = match entry.kind() {
            EntryKind::Meal => &mut self.meals,
            EntryKind::Workout => &mut self.workouts,
        };
        list.push(entry.clone());
        if self.announce_entries {
            output::success(format!("Added {}: {}", entry.kind(), entry.display_label()));
        }
    }
}

impl LedgerView for ConsoleView {
    fn on_new_meal(&mut self, entry: &Entry) {
        self.record(entry);
    }

    fn on_new_workout(&mut self, entry: &Entry) {
        self.record(entry);
    }

    fn on_entry_removed(&mut self, kind: EntryKind, id: Uuid) {
        let list = match kind {
            EntryKind::Meal => &mut self.meals,
            EntryKind::Workout => &mut self.workouts,
        };
        if let Some(idx) = list.iter().position(|entry| entry.id() == id) {
            let removed = list.remove(idx);
            output::success(format!("Removed {}: {}", kind, removed.display_label()));
        }
    }

    fn on_reset(&mut self) {
        self.meals.clear();
        self.workouts.clear();
        output::success("All meals and workouts cleared.");
    }

    fn on_recompute(&mut self, snapshot: &BudgetSnapshot) {
        for line in summary_lines(snapshot) {
            output::line(line);
        }
        if let Some(warning) = budget_warning(snapshot) {
            output::warning(warning);
        }
    }
}

/// Alert shown under the summary, if any.
pub fn budget_warning(snapshot: &BudgetSnapshot) -> Option<String> {
    if snapshot.limit <= 0.0 {
        return Some(format!(
            "The daily limit is {} kcal; set a positive limit with `limit <calories>`",
            format_calories(snapshot.limit)
        ));
    }
    snapshot.over_budget.then(|| {
        format!(
            "Over budget by {} kcal",
            format_calories(-snapshot.remaining)
        )
    })
}

/// Text block describing a snapshot.
pub fn summary_lines(snapshot: &BudgetSnapshot) -> Vec<String> {
    vec![
        format!(
            "Limit: {} | Consumed: {} | Burned: {} | Net: {}",
            format_calories(snapshot.limit),
            format_calories(snapshot.consumed),
            format_calories(snapshot.burned),
            format_calories(snapshot.total),
        ),
        format!(
            "Remaining: {} kcal  {} {:.0}%",
            format_calories(snapshot.remaining),
            progress_bar(snapshot.progress_percent),
            snapshot.progress_percent
        ),
    ]
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(SHORT_ID_LEN);
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoredEntry;

    #[test]
    fn summary_mentions_every_figure() {
        let snapshot = BudgetSnapshot::compute(2000.0, 300.0, 300.0, 0.0);
        let lines = summary_lines(&snapshot);
        assert_eq!(lines[0], "Limit: 2000 | Consumed: 300 | Burned: 0 | Net: 300");
        assert!(lines[1].starts_with("Remaining: 1700 kcal"));
        assert!(lines[1].ends_with("15%"));
    }

    #[test]
    fn progress_bar_is_bounded() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(50.0).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn references_resolve_by_position_or_prefix() {
        let mut view = ConsoleView::new();
        let eggs = Entry::meal("Eggs", 300.0);
        let toast = Entry::meal("Toast", 120.0);
        view.on_new_meal(&eggs);
        view.on_new_meal(&toast);

        assert_eq!(view.resolve(EntryKind::Meal, "2"), Some(toast.id()));
        assert_eq!(view.resolve(EntryKind::Meal, "0"), None);
        assert_eq!(view.resolve(EntryKind::Meal, "3"), None);
        assert_eq!(
            view.resolve(EntryKind::Meal, &short_id(eggs.id())),
            Some(eggs.id())
        );
        assert_eq!(view.resolve(EntryKind::Workout, "1"), None);
    }

    #[test]
    fn all_digit_short_ids_resolve_to_their_entry() {
        let stored = |id: &str, name: &str| StoredEntry {
            id: Uuid::parse_str(id).unwrap(),
            name: name.into(),
            calories: 100.0,
            logged_at: None,
        };
        let mut view = ConsoleView::new();
        let first = Entry::from_stored(
            stored("a1b2c3d4-0000-4000-8000-000000000000", "Oats"),
            EntryKind::Meal,
        );
        let digits = Entry::from_stored(
            stored("00000001-0000-4000-8000-000000000000", "Soup"),
            EntryKind::Meal,
        );
        view.on_new_meal(&first);
        view.on_new_meal(&digits);

        assert_eq!(short_id(digits.id()), "00000001");
        assert_eq!(view.resolve(EntryKind::Meal, "00000001"), Some(digits.id()));
        assert_eq!(view.resolve(EntryKind::Meal, "1"), Some(first.id()));
        assert_eq!(view.resolve(EntryKind::Meal, "a1b2"), Some(first.id()));
    }

    #[test]
    fn warning_wording_depends_on_the_limit() {
        let over = BudgetSnapshot::compute(150.0, 200.0, 200.0, 0.0);
        assert_eq!(budget_warning(&over).as_deref(), Some("Over budget by 50 kcal"));

        let within = BudgetSnapshot::compute(2000.0, 300.0, 300.0, 0.0);
        assert_eq!(budget_warning(&within), None);

        let no_limit = BudgetSnapshot::compute(0.0, -100.0, 0.0, 100.0);
        let warning = budget_warning(&no_limit).unwrap();
        assert!(warning.starts_with("The daily limit is 0 kcal"));
        assert!(!warning.contains("-100"));
    }

    #[test]
    fn local_copy_follows_notifications() {
        let mut view = ConsoleView::new();
        let run = Entry::workout("Run", 200.0);
        view.on_new_workout(&run);
        assert_eq!(view.entries(EntryKind::Workout).len(), 1);
        view.on_entry_removed(EntryKind::Workout, run.id());
        assert!(view.entries(EntryKind::Workout).is_empty());
        view.on_new_meal(&Entry::meal("Eggs", 300.0));
        view.on_reset();
        assert!(view.entries(EntryKind::Meal).is_empty());
    }
}
