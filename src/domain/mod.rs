//! Passive value types shared by the ledger, the storage layer and the views.

pub mod common;
pub mod entry;

pub use common::{Displayable, Identifiable, NamedEntity};
pub use entry::{Entry, EntryKind, StoredEntry};
