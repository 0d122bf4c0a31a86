use crate::model::{Binding, DeclaredResource, Declared, LogicalId, OutputSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Child entity that only exists inside its parent (client, key, resolver).
    Owner,
    /// API trust mode backed by an identity pool.
    Authorization,
    /// Data source backed by a compute handler.
    Backend,
    /// Binding routed through a data source.
    Routing,
    /// Environment value projected from another entity.
    Environment,
    GrantSubject,
    GrantObject,
}

/// `dependent` can only be realized after `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub dependent: LogicalId,
    pub dependency: LogicalId,
    pub kind: EdgeKind,
}

/// Immutable result of a composition build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    stack_name: String,
    resources: Vec<DeclaredResource>,
    dependencies: Vec<Dependency>,
    deployment_order: Vec<LogicalId>,
    outputs: OutputSet,
}

impl Composition {
    pub(crate) fn new(
        stack_name: String,
        resources: Vec<DeclaredResource>,
        dependencies: Vec<Dependency>,
        deployment_order: Vec<LogicalId>,
        outputs: OutputSet,
    ) -> Self {
        Self {
            stack_name,
            resources,
            dependencies,
            deployment_order,
            outputs,
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Entities in declaration order.
    pub fn resources(&self) -> &[DeclaredResource] {
        &self.resources
    }

    pub fn resource(&self, logical_id: &str) -> Option<&DeclaredResource> {
        self.resources
            .iter()
            .find(|declared| declared.logical_id == logical_id)
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Direct dependencies of one entity.
    pub fn dependencies_of(&self, logical_id: &str) -> Vec<&LogicalId> {
        self.dependencies
            .iter()
            .filter(|edge| edge.dependent == logical_id)
            .map(|edge| &edge.dependency)
            .collect()
    }

    /// Every entity appears after all of its dependencies.
    pub fn deployment_order(&self) -> &[LogicalId] {
        &self.deployment_order
    }

    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    pub fn entities<K: Declared>(&self) -> impl Iterator<Item = (&LogicalId, &K)> {
        self.resources.iter().filter_map(|declared| {
            K::from_resource(&declared.resource).map(|entity| (&declared.logical_id, entity))
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.entities::<Binding>().map(|(_, binding)| binding)
    }
}
