//! Provisioning engine seam.
//!
//! A composition is only a description; an engine turns it into resources
//! and reports back the generated identifiers the outputs project from.

pub mod local;
mod naming;

pub use local::LocalEngine;

use crate::graph::Composition;
use crate::model::{Attribute, LogicalId, ResourceKind};
use crate::schema::SchemaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use validator::{Validate, ValidationError};

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("invalid deploy target: {0}")]
    InvalidTarget(#[from] validator::ValidationErrors),

    #[error("artifact for '{logical_id}' not found at '{}'", path.display())]
    ArtifactMissing { logical_id: LogicalId, path: PathBuf },

    #[error("schema for '{logical_id}' not found at '{}'", path.display())]
    SchemaMissing { logical_id: LogicalId, path: PathBuf },

    #[error("schema for '{logical_id}' is invalid: {source}")]
    SchemaInvalid {
        logical_id: LogicalId,
        #[source]
        source: SchemaError,
    },

    #[error("'{logical_id}' binds {operation}, which the deployed schema does not declare")]
    UnknownOperation {
        logical_id: LogicalId,
        operation: String,
    },

    #[error("{attribute} of '{logical_id}' could not be resolved")]
    UnresolvedAttribute {
        logical_id: LogicalId,
        attribute: Attribute,
    },

    #[error("'{0}' appears in the deployment order but not in the composition")]
    UnknownResource(LogicalId),
}

/// Account and region a composition is realized in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DeployTarget {
    #[validate(custom(function = "validate_account_id"))]
    pub account: String,
    #[validate(length(min = 1, message = "Region cannot be empty"))]
    pub region: String,
}

fn validate_account_id(account: &str) -> Result<(), ValidationError> {
    if account.len() == 12 && account.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("account_id")
            .with_message("Account id must be 12 digits".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub logical_id: LogicalId,
    pub kind: ResourceKind,
    pub physical_id: String,
    pub attributes: BTreeMap<Attribute, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// What an engine reports after realizing a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub stack_name: String,
    pub target: DeployTarget,
    /// Resources in the order they were realized.
    pub resources: Vec<ResolvedResource>,
    pub outputs: BTreeMap<String, String>,
}

impl Deployment {
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&ResolvedResource> {
        self.resources
            .iter()
            .find(|resource| resource.logical_id == logical_id)
    }
}

#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    async fn deploy(
        &self,
        composition: &Composition,
        target: &DeployTarget,
    ) -> Result<Deployment, ProvisioningError>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_must_be_twelve_digits() {
        let target = DeployTarget {
            account: "123456789012".to_string(),
            region: "us-east-1".to_string(),
        };
        assert!(target.validate().is_ok());

        let short = DeployTarget {
            account: "12345".to_string(),
            ..target.clone()
        };
        assert!(short.validate().is_err());

        let no_region = DeployTarget {
            region: String::new(),
            ..target
        };
        assert!(no_region.validate().is_err());
    }
}
