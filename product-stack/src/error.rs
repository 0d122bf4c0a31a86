use crate::engine::ProvisioningError;
use crate::model::{Attribute, LogicalId, ResourceKind};
use crate::schema::{OperationCategory, SchemaError};
use stack_core::error::AppError;
use thiserror::Error;

/// Failures raised while declaring a composition.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("logical id '{0}' is already declared")]
    DuplicateLogicalId(LogicalId),

    #[error("logical id '{0}' must be non-empty ASCII letters, digits, '-' or '_'")]
    InvalidLogicalId(LogicalId),

    #[error("{kind} '{logical_id}' does not expose attribute {attribute}")]
    UnsupportedAttribute {
        logical_id: LogicalId,
        kind: ResourceKind,
        attribute: Attribute,
    },

    #[error("identity pool '{0}' already has a client")]
    DuplicateClient(LogicalId),

    #[error("environment variable '{name}' is already set on '{handler}'")]
    DuplicateEnvironment { handler: LogicalId, name: String },

    #[error("index '{index}' on '{table}' reuses the primary key '{key}'")]
    IndexKeyCollision {
        table: LogicalId,
        index: String,
        key: String,
    },

    #[error("index '{index}' is already defined on '{table}'")]
    DuplicateIndex { table: LogicalId, index: String },

    #[error("operation {category}.{field} is not declared by schema '{schema}'")]
    UnknownOperation {
        category: OperationCategory,
        field: String,
        schema: String,
    },

    #[error("operation {category}.{field} is already bound on '{api}'")]
    DuplicateBinding {
        api: LogicalId,
        category: OperationCategory,
        field: String,
    },

    #[error("output '{0}' is already declared")]
    DuplicateOutput(String),

    #[error("API '{0}' needs at least one trust mode")]
    NoTrustMode(LogicalId),

    #[error("dependency cycle through '{0}'")]
    Cycle(LogicalId),

    #[error("invalid {kind} '{logical_id}': {source}")]
    Validation {
        logical_id: LogicalId,
        kind: ResourceKind,
        #[source]
        source: validator::ValidationErrors,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<CompositionError> for AppError {
    fn from(err: CompositionError) -> Self {
        AppError::CompositionError(anyhow::Error::new(err))
    }
}

impl From<ProvisioningError> for AppError {
    fn from(err: ProvisioningError) -> Self {
        AppError::ProvisioningError(anyhow::Error::new(err))
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::CompositionError(anyhow::Error::new(err))
    }
}
