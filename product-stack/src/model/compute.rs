use super::Value;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Runtime {
    #[serde(rename = "nodejs14.x")]
    Nodejs14x,
}

impl Runtime {
    pub fn identifier(self) -> &'static str {
        match self {
            Runtime::Nodejs14x => "nodejs14.x",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// Packaged artifact directory, relative to the asset root.
    Asset(PathBuf),
}

impl Code {
    pub fn path(&self) -> &PathBuf {
        match self {
            Code::Asset(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ComputeHandler {
    pub runtime: Runtime,
    #[validate(length(min = 1, max = 128, message = "Handler must be 1-128 characters"))]
    pub handler: String,
    pub code: Code,
    #[validate(range(min = 128, max = 10240, message = "Memory must be 128-10240 MB"))]
    pub memory_size: u32,
    environment: BTreeMap<String, Value>,
}

impl ComputeHandler {
    pub fn new(runtime: Runtime, handler: impl Into<String>, code: Code, memory_size: u32) -> Self {
        Self {
            runtime,
            handler: handler.into(),
            code,
            memory_size,
            environment: BTreeMap::new(),
        }
    }

    pub fn environment(&self) -> &BTreeMap<String, Value> {
        &self.environment
    }

    /// Returns false, leaving the entry untouched, if `name` is already set.
    pub(crate) fn set_environment(&mut self, name: String, value: Value) -> bool {
        match self.environment.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }
}
