use std::collections::BTreeMap;

use crate::errors::Result;

use super::{KeyValueStore, WriteBatch, WriteOp};

/// Volatile store used by tests and throwaway sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        for op in batch {
            match op {
                WriteOp::Set { key, value } => {
                    self.values.insert(key, value);
                }
                WriteOp::Remove { key } => {
                    self.values.remove(&key);
                }
            }
        }
        Ok(())
    }
}
