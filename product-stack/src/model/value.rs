use super::{Attribute, LogicalId};
use serde::{Deserialize, Serialize};

/// A value whose concrete form is only known once the provisioning engine
/// has resolved the composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Literal(String),
    Attribute {
        logical_id: LogicalId,
        attribute: Attribute,
    },
    /// Region the composition is deployed into.
    Region,
}

impl Value {
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }

    /// Entity this value projects from, if any.
    pub fn referenced(&self) -> Option<&LogicalId> {
        match self {
            Value::Attribute { logical_id, .. } => Some(logical_id),
            Value::Literal(_) | Value::Region => None,
        }
    }
}
