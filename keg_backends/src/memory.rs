use keg_traits::{BoxError, KvStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Key-value pairs plus the capped event log; shared by the memory and
/// file stores.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Doc {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub events: VecDeque<String>,
}

impl Doc {
    pub fn push_event(&mut self, entry: &str, cap: usize) {
        self.events.push_back(entry.to_string());
        while self.events.len() > cap {
            self.events.pop_front();
        }
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<Doc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Doc) -> T) -> T {
        let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut doc)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.with(|d| d.values.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        self.with(|d| d.values.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn append_event(&self, entry: &str, cap: usize) -> Result<(), BoxError> {
        self.with(|d| d.push_event(entry, cap));
        Ok(())
    }

    fn events(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.with(|d| d.events.iter().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_of_unknown_key_is_none() {
        let s = MemoryStore::new();
        assert_eq!(s.get("weight").unwrap(), None);
        s.set("weight", "16000").unwrap();
        assert_eq!(s.get("weight").unwrap().as_deref(), Some("16000"));
    }

    #[test]
    fn event_log_keeps_the_newest_entries() {
        let s = MemoryStore::new();
        for i in 0..7 {
            s.append_event(&format!("e{i}"), 3).unwrap();
        }
        assert_eq!(s.events().unwrap(), vec!["e4", "e5", "e6"]);
    }
}
