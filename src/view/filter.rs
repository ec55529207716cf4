use crate::domain::{Entry, NamedEntity};

/// Entries whose name contains `query`, ignoring case. A blank query keeps everything.
///
/// Works on the caller's copy; the ledger is never consulted or changed.
pub fn filter_entries<'a>(entries: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|entry| entry.name().to_lowercase().contains(&needle))
        .collect()
}
