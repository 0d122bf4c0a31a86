use super::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub value: Value,
}

/// Published values of a composition, in declaration order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSet {
    entries: Vec<Output>,
}

impl OutputSet {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|output| output.name == name)
            .map(|output| &output.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|output| output.name.as_str()).collect()
    }

    /// Returns `false` without writing when the name is already taken.
    pub(crate) fn insert(&mut self, name: String, value: Value) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.entries.push(Output { name, value });
        true
    }
}
