//! Durable key-value persistence used by the ledger.
//!
//! The ledger only ever talks to a [`KeyValueStore`]; the concrete backend is chosen by the
//! composition root. Every ledger mutation is expressed as one [`WriteBatch`] so a backend can
//! make the whole mutation durable in a single step.

pub mod codec;
pub mod json_file;
pub mod memory;

use crate::errors::Result;

pub use codec::{LedgerKey, PersistedState};
pub use json_file::{JsonFileStore, StorePaths};
pub use memory::MemoryStore;

/// A single pending change inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
}

/// Ordered set of writes applied atomically by [`KeyValueStore::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Remove { key: key.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// String-keyed, last-write-wins storage.
///
/// `apply` must either persist every operation of the batch or none of them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn apply(&mut self, batch: WriteBatch) -> Result<()>;

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(WriteBatch::new().set(key, value))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.apply(WriteBatch::new().remove(key))
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        (**self).apply(batch)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        (**self).apply(batch)
    }
}
