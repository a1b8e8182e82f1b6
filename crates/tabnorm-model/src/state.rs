use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Open-ended key/value store shared by every callable within one run.
///
/// Used for deliberate cross-stage communication (caches, flags, patches).
/// Created at run start and dropped with the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    values: BTreeMap<String, Value>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed read; `None` when absent or of the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Stores any serializable value; values that fail to serialize are
    /// stored as `null`.
    pub fn insert_serialized<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn entry(&mut self, key: impl Into<String>) -> &mut Value {
        self.values.entry(key.into()).or_insert(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trip() {
        let mut state = RunState::new();
        state.insert("seen", 3);
        state.insert_serialized("names", &vec!["a", "b"]);
        assert_eq!(state.get_as::<u32>("seen"), Some(3));
        assert_eq!(state.get_as::<Vec<String>>("names").unwrap(), vec!["a", "b"]);
        assert_eq!(state.get_as::<String>("seen"), None);
    }

    #[test]
    fn entry_counts_up() {
        let mut state = RunState::new();
        for _ in 0..3 {
            let counter = state.entry("calls");
            *counter = Value::from(counter.as_u64().unwrap_or(0) + 1);
        }
        assert_eq!(state.get_as::<u64>("calls"), Some(3));
    }
}
