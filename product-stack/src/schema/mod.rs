//! GraphQL schema source and the operation catalog derived from it.
//!
//! Only the root operation types matter to the composition: bindings are
//! checked against the field names declared on `Query`, `Mutation` and
//! `Subscription` (or whatever a `schema { ... }` block renames them to).

pub mod parser;

pub use parser::parse_schema;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationCategory {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationCategory::Query => write!(f, "Query"),
            OperationCategory::Mutation => write!(f, "Mutation"),
            OperationCategory::Subscription => write!(f, "Subscription"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

/// Root operation fields declared by a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    queries: BTreeSet<String>,
    mutations: BTreeSet<String>,
    subscriptions: BTreeSet<String>,
}

impl SchemaCatalog {
    pub fn fields(&self, category: OperationCategory) -> &BTreeSet<String> {
        match category {
            OperationCategory::Query => &self.queries,
            OperationCategory::Mutation => &self.mutations,
            OperationCategory::Subscription => &self.subscriptions,
        }
    }

    pub fn contains(&self, category: OperationCategory, field: &str) -> bool {
        self.fields(category).contains(field)
    }

    pub fn operation_count(&self) -> usize {
        self.queries.len() + self.mutations.len() + self.subscriptions.len()
    }

    pub(crate) fn insert(&mut self, category: OperationCategory, field: &str) {
        let fields = match category {
            OperationCategory::Query => &mut self.queries,
            OperationCategory::Mutation => &mut self.mutations,
            OperationCategory::Subscription => &mut self.subscriptions,
        };
        fields.insert(field.to_string());
    }
}

/// A schema file reference together with its parsed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    pub path: PathBuf,
    pub catalog: SchemaCatalog,
}

impl SchemaSource {
    /// Build a source from SDL text already in memory. `path` is recorded as
    /// the location the provisioning engine will read at deploy time.
    pub fn from_definition(path: impl Into<PathBuf>, sdl: &str) -> Result<Self, SchemaError> {
        let catalog = parse_schema(sdl)?;
        Ok(Self {
            path: path.into(),
            catalog,
        })
    }
}
