//! Composition builder.
//!
//! Entities are nodes of a directed graph whose edges point from a dependent
//! to the entity it needs. The builder only hands out typed [`Handle`]s for
//! nodes it already holds, and every reference (environment values, outputs,
//! trust modes, bindings) is formed from such a handle, so an entity can never
//! be referenced before it is declared. [`CompositionBuilder::build`] then
//! derives the deployment order from the graph itself.

mod composition;

pub use composition::{Composition, Dependency, EdgeKind};

use crate::error::CompositionError;
use crate::model::{
    AccessScope, ApiKey, Attribute, AuthorizationConfig, AuthorizationMode, Binding,
    ComputeHandler, DataSource, DataStore, DeclaredResource, Declared, FieldLogLevel,
    GlobalSecondaryIndex, GraphqlApi, IdentityClient, IdentityPool, LogicalId, OutputSet,
    PermissionGrant, ProductOperation, Resource, ResourceKind, Value,
};
use crate::schema::{OperationCategory, SchemaSource};
use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use validator::Validate;

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Typed reference to an entity held by one [`CompositionBuilder`].
pub struct Handle<K> {
    scope: u64,
    index: NodeIndex,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    fn new(scope: u64, index: NodeIndex) -> Self {
        Self {
            scope,
            index,
            _kind: PhantomData,
        }
    }
}

impl<K: Declared> Handle<K> {
    /// Reference to one of this entity's resolved attributes.
    pub fn attr(&self, attribute: Attribute) -> AttrRef {
        AttrRef {
            scope: self.scope,
            index: self.index,
            attribute,
        }
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.index == other.index
    }
}

impl<K> Eq for Handle<K> {}

impl<K: Declared> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &K::KIND)
            .field("index", &self.index.index())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrRef {
    scope: u64,
    index: NodeIndex,
    attribute: Attribute,
}

/// Unresolved input to an environment entry or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Literal(String),
    Attribute(AttrRef),
    Region,
}

impl From<AttrRef> for ValueSource {
    fn from(attr: AttrRef) -> Self {
        ValueSource::Attribute(attr)
    }
}

impl From<&str> for ValueSource {
    fn from(value: &str) -> Self {
        ValueSource::Literal(value.to_string())
    }
}

impl From<String> for ValueSource {
    fn from(value: String) -> Self {
        ValueSource::Literal(value)
    }
}

/// API trust mode as requested at declaration time.
#[derive(Debug, Clone, Copy)]
pub enum TrustMode {
    /// Key-based access; the key expires this long after the declaration instant.
    ApiKey { expires_after: chrono::Duration },
    UserPool(Handle<IdentityPool>),
}

#[derive(Debug, Clone)]
pub struct GraphqlApiProps {
    pub name: String,
    pub log_level: FieldLogLevel,
    pub schema: SchemaSource,
    /// First entry is the default mode, the rest are additional modes.
    pub trust_modes: Vec<TrustMode>,
}

pub struct CompositionBuilder {
    scope: u64,
    stack_name: String,
    declared_at: DateTime<Utc>,
    graph: DiGraph<DeclaredResource, EdgeKind>,
    by_id: HashMap<LogicalId, NodeIndex>,
    api_keys: HashMap<NodeIndex, NodeIndex>,
    bound: HashSet<(NodeIndex, OperationCategory, String)>,
    outputs: OutputSet,
}

impl CompositionBuilder {
    pub fn new(stack_name: impl Into<String>, declared_at: DateTime<Utc>) -> Self {
        Self {
            scope: NEXT_SCOPE.fetch_add(1, Ordering::Relaxed),
            stack_name: stack_name.into(),
            declared_at,
            graph: DiGraph::new(),
            by_id: HashMap::new(),
            api_keys: HashMap::new(),
            bound: HashSet::new(),
            outputs: OutputSet::default(),
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn declared_at(&self) -> DateTime<Utc> {
        self.declared_at
    }

    pub fn resource_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a declared entity by logical id.
    pub fn find<K: Declared>(&self, logical_id: &str) -> Result<Handle<K>, CompositionError> {
        match self.by_id.get(logical_id) {
            Some(&index) if self.graph[index].kind() == K::KIND => {
                Ok(Handle::new(self.scope, index))
            }
            Some(&index) => Err(CompositionError::UnresolvedReference {
                reference: format!(
                    "'{logical_id}' is a {}, not a {}",
                    self.graph[index].kind(),
                    K::KIND
                ),
            }),
            None => Err(CompositionError::UnresolvedReference {
                reference: format!("'{logical_id}' has not been declared"),
            }),
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn add_identity_pool(
        &mut self,
        logical_id: impl Into<LogicalId>,
        pool: IdentityPool,
    ) -> Result<Handle<IdentityPool>, CompositionError> {
        let logical_id = logical_id.into();
        validated(&logical_id, ResourceKind::IdentityPool, &pool)?;
        for attribute in &pool.standard_attributes {
            validated(&logical_id, ResourceKind::IdentityPool, attribute)?;
        }

        self.declare(logical_id, pool, &[])
    }

    pub fn add_identity_client(
        &mut self,
        logical_id: impl Into<LogicalId>,
        pool: &Handle<IdentityPool>,
    ) -> Result<Handle<IdentityClient>, CompositionError> {
        let pool_index = self.check(pool)?;
        let pool_id = self.logical_id(pool_index).clone();
        let has_client = self.graph.node_weights().any(|node| {
            matches!(&node.resource, Resource::IdentityClient(client) if client.user_pool == pool_id)
        });
        if has_client {
            return Err(CompositionError::DuplicateClient(pool_id));
        }
        let client = IdentityClient { user_pool: pool_id };

        self.declare(logical_id.into(), client, &[(pool_index, EdgeKind::Owner)])
    }

    // =========================================================================
    // Data store
    // =========================================================================

    pub fn add_data_store(
        &mut self,
        logical_id: impl Into<LogicalId>,
        store: DataStore,
    ) -> Result<Handle<DataStore>, CompositionError> {
        let logical_id = logical_id.into();
        validated(&logical_id, ResourceKind::DataStore, store.partition_key())?;

        self.declare(logical_id, store, &[])
    }

    /// Add an alternate access pattern. Its partition key must differ from the
    /// table's primary key and its name must be unused on the table.
    pub fn add_global_secondary_index(
        &mut self,
        table: &Handle<DataStore>,
        index: GlobalSecondaryIndex,
    ) -> Result<(), CompositionError> {
        let table_index = self.check(table)?;
        let logical_id = self.logical_id(table_index).clone();
        validated(&logical_id, ResourceKind::DataStore, &index)?;
        validated(&logical_id, ResourceKind::DataStore, &index.partition_key)?;

        let store = self.entity_mut::<DataStore>(table_index)?;
        if store.partition_key().name == index.partition_key.name {
            return Err(CompositionError::IndexKeyCollision {
                table: logical_id,
                index: index.index_name,
                key: index.partition_key.name,
            });
        }
        if store.index(&index.index_name).is_some() {
            return Err(CompositionError::DuplicateIndex {
                table: logical_id,
                index: index.index_name,
            });
        }

        tracing::info!(
            table = %logical_id,
            index = %index.index_name,
            partition_key = %index.partition_key.name,
            "Secondary index added"
        );
        store.push_index(index);

        Ok(())
    }

    // =========================================================================
    // Compute
    // =========================================================================

    pub fn add_compute_handler(
        &mut self,
        logical_id: impl Into<LogicalId>,
        handler: ComputeHandler,
    ) -> Result<Handle<ComputeHandler>, CompositionError> {
        let logical_id = logical_id.into();
        validated(&logical_id, ResourceKind::ComputeHandler, &handler)?;

        self.declare(logical_id, handler, &[])
    }

    /// Inject an environment entry. A value projected from another entity
    /// makes the handler depend on that entity. Each variable is set once.
    pub fn add_environment(
        &mut self,
        handler: &Handle<ComputeHandler>,
        name: impl Into<String>,
        value: impl Into<ValueSource>,
    ) -> Result<(), CompositionError> {
        let handler_index = self.check(handler)?;
        let (value, target) = self.resolve(value.into())?;
        if target == Some(handler_index) {
            return Err(CompositionError::Cycle(
                self.logical_id(handler_index).clone(),
            ));
        }

        let name = name.into();
        let source = value.referenced().cloned();
        if !self
            .entity_mut::<ComputeHandler>(handler_index)?
            .set_environment(name.clone(), value)
        {
            return Err(CompositionError::DuplicateEnvironment {
                handler: self.logical_id(handler_index).clone(),
                name,
            });
        }
        tracing::debug!(
            handler = %self.logical_id(handler_index),
            variable = %name,
            source = ?source,
            "Environment entry injected"
        );
        if let Some(target) = target {
            self.graph
                .update_edge(handler_index, target, EdgeKind::Environment);
        }

        Ok(())
    }

    // =========================================================================
    // API
    // =========================================================================

    /// Declare an API. A key-based trust mode also declares the API key entity.
    pub fn add_graphql_api(
        &mut self,
        logical_id: impl Into<LogicalId>,
        props: GraphqlApiProps,
    ) -> Result<Handle<GraphqlApi>, CompositionError> {
        let logical_id = logical_id.into();

        let mut modes = Vec::with_capacity(props.trust_modes.len());
        let mut dependencies = Vec::new();
        for mode in props.trust_modes {
            match mode {
                TrustMode::ApiKey { expires_after } => modes.push(AuthorizationMode::ApiKey {
                    expires: self.declared_at + expires_after,
                }),
                TrustMode::UserPool(pool) => {
                    let pool_index = self.check(&pool)?;
                    dependencies.push((pool_index, EdgeKind::Authorization));
                    modes.push(AuthorizationMode::UserPool {
                        user_pool: self.logical_id(pool_index).clone(),
                    });
                }
            }
        }
        let mut modes = modes.into_iter();
        let Some(default_mode) = modes.next() else {
            return Err(CompositionError::NoTrustMode(logical_id));
        };

        let api = GraphqlApi {
            name: props.name,
            log_level: props.log_level,
            schema: props.schema,
            authorization: AuthorizationConfig {
                default_mode,
                additional_modes: modes.collect(),
            },
        };
        validated(&logical_id, ResourceKind::GraphqlApi, &api)?;

        let key_id = LogicalId::new(format!("{logical_id}DefaultApiKey"));
        let expiry = api.authorization.api_key_expiry();
        if expiry.is_some() && self.by_id.contains_key(&key_id) {
            return Err(CompositionError::DuplicateLogicalId(key_id));
        }

        let handle = self.declare(logical_id.clone(), api, &dependencies)?;
        if let Some(expires) = expiry {
            let key = ApiKey {
                api: logical_id,
                expires,
            };
            let key_handle = self.declare(key_id, key, &[(handle.index, EdgeKind::Owner)])?;
            self.api_keys.insert(handle.index, key_handle.index);
        }

        Ok(handle)
    }

    /// The key declared for an API with a key-based trust mode.
    pub fn api_key(
        &self,
        api: &Handle<GraphqlApi>,
    ) -> Result<Option<Handle<ApiKey>>, CompositionError> {
        let api_index = self.check(api)?;
        Ok(self
            .api_keys
            .get(&api_index)
            .map(|&key_index| Handle::new(self.scope, key_index)))
    }

    /// Register a compute handler as a named backend of an API.
    pub fn add_lambda_data_source(
        &mut self,
        api: &Handle<GraphqlApi>,
        name: &str,
        handler: &Handle<ComputeHandler>,
    ) -> Result<Handle<DataSource>, CompositionError> {
        let api_index = self.check(api)?;
        let handler_index = self.check(handler)?;
        let api_id = self.logical_id(api_index).clone();

        let data_source = DataSource {
            api: api_id.clone(),
            name: name.to_string(),
            handler: self.logical_id(handler_index).clone(),
        };
        let logical_id = LogicalId::new(format!("{api_id}{name}"));
        validated(&logical_id, ResourceKind::DataSource, &data_source)?;

        self.declare(
            logical_id,
            data_source,
            &[
                (api_index, EdgeKind::Owner),
                (handler_index, EdgeKind::Backend),
            ],
        )
    }

    /// Route one operation to the data source's handler. The operation must be
    /// declared by the API's schema and may be bound only once per API.
    pub fn bind(
        &mut self,
        data_source: &Handle<DataSource>,
        operation: ProductOperation,
    ) -> Result<Handle<Binding>, CompositionError> {
        let ds_index = self.check(data_source)?;
        let ds_id = self.logical_id(ds_index).clone();
        let ds = self.entity::<DataSource>(ds_index)?.clone();
        let api_index = self.index_of(&ds.api)?;
        let api = self.entity::<GraphqlApi>(api_index)?;

        let category = operation.category();
        let field = operation.field_name();
        if !api.schema.catalog.contains(category, field) {
            return Err(CompositionError::UnknownOperation {
                category,
                field: field.to_string(),
                schema: api.schema.path.display().to_string(),
            });
        }
        let key = (api_index, category, field.to_string());
        if self.bound.contains(&key) {
            return Err(CompositionError::DuplicateBinding {
                api: ds.api,
                category,
                field: field.to_string(),
            });
        }

        let binding = Binding {
            api: ds.api,
            data_source: ds_id.clone(),
            handler: ds.handler,
            category,
            field_name: field.to_string(),
        };
        let logical_id = LogicalId::new(format!("{ds_id}{category}{field}Resolver"));
        let handle = self.declare(
            logical_id,
            binding,
            &[(ds_index, EdgeKind::Routing), (api_index, EdgeKind::Owner)],
        )?;
        self.bound.insert(key);

        Ok(handle)
    }

    // =========================================================================
    // Grants & outputs
    // =========================================================================

    pub fn grant(
        &mut self,
        subject: &Handle<ComputeHandler>,
        object: &Handle<DataStore>,
        scope: AccessScope,
    ) -> Result<Handle<PermissionGrant>, CompositionError> {
        let subject_index = self.check(subject)?;
        let object_index = self.check(object)?;
        let grant = PermissionGrant {
            subject: self.logical_id(subject_index).clone(),
            object: self.logical_id(object_index).clone(),
            scope,
        };
        let logical_id = LogicalId::new(format!("{}{}Grant", grant.subject, grant.object));

        self.declare(
            logical_id,
            grant,
            &[
                (subject_index, EdgeKind::GrantSubject),
                (object_index, EdgeKind::GrantObject),
            ],
        )
    }

    /// Publish a value. Outputs never declare entities or add edges.
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ValueSource>,
    ) -> Result<(), CompositionError> {
        let name = name.into();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CompositionError::InvalidLogicalId(LogicalId::new(name)));
        }
        let (value, _) = self.resolve(value.into())?;

        tracing::debug!(output = %name, source = ?value.referenced(), "Output declared");
        if !self.outputs.insert(name.clone(), value) {
            return Err(CompositionError::DuplicateOutput(name));
        }

        Ok(())
    }

    /// Freeze the graph into a composition with a topological deployment order.
    pub fn build(self) -> Result<Composition, CompositionError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            CompositionError::Cycle(self.graph[cycle.node_id()].logical_id.clone())
        })?;

        // edges point at dependencies, so reverse to deploy those first
        let deployment_order: Vec<LogicalId> = order
            .into_iter()
            .rev()
            .map(|index| self.graph[index].logical_id.clone())
            .collect();

        let dependencies: Vec<Dependency> = self
            .graph
            .edge_references()
            .map(|edge| Dependency {
                dependent: self.graph[edge.source()].logical_id.clone(),
                dependency: self.graph[edge.target()].logical_id.clone(),
                kind: *edge.weight(),
            })
            .collect();

        tracing::info!(
            stack = %self.stack_name,
            resources = self.graph.node_count(),
            dependencies = dependencies.len(),
            outputs = self.outputs.len(),
            "Composition built"
        );

        let (nodes, _) = self.graph.into_nodes_edges();
        let resources = nodes.into_iter().map(|node| node.weight).collect();

        Ok(Composition::new(
            self.stack_name,
            resources,
            dependencies,
            deployment_order,
            self.outputs,
        ))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn declare<K: Declared>(
        &mut self,
        logical_id: LogicalId,
        descriptor: K,
        dependencies: &[(NodeIndex, EdgeKind)],
    ) -> Result<Handle<K>, CompositionError> {
        if !logical_id.is_well_formed() {
            return Err(CompositionError::InvalidLogicalId(logical_id));
        }
        if self.by_id.contains_key(&logical_id) {
            return Err(CompositionError::DuplicateLogicalId(logical_id));
        }

        let index = self.graph.add_node(DeclaredResource {
            logical_id: logical_id.clone(),
            resource: descriptor.into_resource(),
        });
        for &(dependency, kind) in dependencies {
            self.graph.update_edge(index, dependency, kind);
        }
        self.by_id.insert(logical_id.clone(), index);

        tracing::info!(
            logical_id = %logical_id,
            kind = %K::KIND,
            dependencies = dependencies.len(),
            "Entity declared"
        );

        Ok(Handle::new(self.scope, index))
    }

    fn check<K: Declared>(&self, handle: &Handle<K>) -> Result<NodeIndex, CompositionError> {
        if handle.scope != self.scope {
            return Err(CompositionError::UnresolvedReference {
                reference: format!("{} handle issued by another composition", K::KIND),
            });
        }
        match self.graph.node_weight(handle.index) {
            Some(node) if node.kind() == K::KIND => Ok(handle.index),
            _ => Err(CompositionError::UnresolvedReference {
                reference: format!("{} #{} is not declared", K::KIND, handle.index.index()),
            }),
        }
    }

    fn resolve(&self, source: ValueSource) -> Result<(Value, Option<NodeIndex>), CompositionError> {
        match source {
            ValueSource::Literal(value) => Ok((Value::Literal(value), None)),
            ValueSource::Region => Ok((Value::Region, None)),
            ValueSource::Attribute(attr) => {
                let node = (attr.scope == self.scope)
                    .then(|| self.graph.node_weight(attr.index))
                    .flatten()
                    .ok_or_else(|| CompositionError::UnresolvedReference {
                        reference: format!("{} of an entity this composition has not declared", attr.attribute),
                    })?;
                if !node.kind().supports(attr.attribute) {
                    return Err(CompositionError::UnsupportedAttribute {
                        logical_id: node.logical_id.clone(),
                        kind: node.kind(),
                        attribute: attr.attribute,
                    });
                }

                Ok((
                    Value::Attribute {
                        logical_id: node.logical_id.clone(),
                        attribute: attr.attribute,
                    },
                    Some(attr.index),
                ))
            }
        }
    }

    fn logical_id(&self, index: NodeIndex) -> &LogicalId {
        &self.graph[index].logical_id
    }

    fn index_of(&self, logical_id: &LogicalId) -> Result<NodeIndex, CompositionError> {
        self.by_id
            .get(logical_id)
            .copied()
            .ok_or_else(|| CompositionError::UnresolvedReference {
                reference: format!("'{logical_id}' has not been declared"),
            })
    }

    fn entity<K: Declared>(&self, index: NodeIndex) -> Result<&K, CompositionError> {
        let node = &self.graph[index];
        K::from_resource(&node.resource).ok_or_else(|| CompositionError::UnresolvedReference {
            reference: format!("'{}' is a {}, not a {}", node.logical_id, node.kind(), K::KIND),
        })
    }

    fn entity_mut<K: Declared>(&mut self, index: NodeIndex) -> Result<&mut K, CompositionError> {
        let node = &mut self.graph[index];
        let kind = node.resource.kind();
        let logical_id = node.logical_id.clone();
        K::from_resource_mut(&mut node.resource).ok_or_else(|| {
            CompositionError::UnresolvedReference {
                reference: format!("'{logical_id}' is a {kind}, not a {}", K::KIND),
            }
        })
    }
}

fn validated<T: Validate>(
    logical_id: &LogicalId,
    kind: ResourceKind,
    descriptor: &T,
) -> Result<(), CompositionError> {
    descriptor
        .validate()
        .map_err(|source| CompositionError::Validation {
            logical_id: logical_id.clone(),
            kind,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Code, KeyAttribute, Runtime};
    use chrono::TimeZone;

    const SDL: &str = "type Query { getProductById(productId: ID!): String listProducts: [String] }\n\
                       type Mutation { createProduct(name: String!): String }";

    fn builder() -> CompositionBuilder {
        let declared_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CompositionBuilder::new("TestStack", declared_at)
    }

    fn handler() -> ComputeHandler {
        ComputeHandler::new(
            Runtime::Nodejs14x,
            "main.handler",
            Code::Asset("lambda-fns".into()),
            1024,
        )
    }

    fn api_props(trust_modes: Vec<TrustMode>) -> GraphqlApiProps {
        GraphqlApiProps {
            name: "test-api".to_string(),
            log_level: FieldLogLevel::All,
            schema: SchemaSource::from_definition("schema.graphql", SDL).unwrap(),
            trust_modes,
        }
    }

    #[test]
    fn environment_reference_adds_dependency_edge() {
        let mut b = builder();
        let table = b
            .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
            .unwrap();
        let function = b.add_compute_handler("Function", handler()).unwrap();

        b.add_environment(&function, "TABLE", table.attr(Attribute::TableName))
            .unwrap();

        let composition = b.build().unwrap();
        assert_eq!(
            composition.dependencies_of("Function"),
            vec![&LogicalId::from("Table")]
        );
        assert_eq!(
            composition.deployment_order(),
            &[LogicalId::from("Table"), LogicalId::from("Function")]
        );
    }

    #[test]
    fn unsupported_attribute_is_rejected() {
        let mut b = builder();
        let table = b
            .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
            .unwrap();
        let function = b.add_compute_handler("Function", handler()).unwrap();

        let err = b
            .add_environment(&function, "TABLE", table.attr(Attribute::FunctionArn))
            .unwrap_err();
        assert!(matches!(err, CompositionError::UnsupportedAttribute { .. }));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut b = builder();
        let function = b.add_compute_handler("Function", handler()).unwrap();

        let err = b
            .add_environment(&function, "SELF", function.attr(Attribute::FunctionArn))
            .unwrap_err();
        assert!(matches!(err, CompositionError::Cycle(_)));
    }

    #[test]
    fn find_rejects_wrong_kind_and_unknown_ids() {
        let mut b = builder();
        b.add_compute_handler("Function", handler()).unwrap();

        assert!(b.find::<ComputeHandler>("Function").is_ok());
        assert!(matches!(
            b.find::<DataStore>("Function"),
            Err(CompositionError::UnresolvedReference { .. })
        ));
        assert!(matches!(
            b.find::<DataStore>("Missing"),
            Err(CompositionError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn duplicate_logical_ids_are_rejected() {
        let mut b = builder();
        b.add_compute_handler("Function", handler()).unwrap();
        let err = b.add_compute_handler("Function", handler()).unwrap_err();
        assert!(matches!(err, CompositionError::DuplicateLogicalId(_)));
    }

    #[test]
    fn memory_outside_limits_fails_validation() {
        let mut b = builder();
        let mut small = handler();
        small.memory_size = 64;

        let err = b.add_compute_handler("Function", small).unwrap_err();
        assert!(matches!(
            err,
            CompositionError::Validation {
                kind: ResourceKind::ComputeHandler,
                ..
            }
        ));
        assert_eq!(b.resource_count(), 0);
    }

    #[test]
    fn api_key_mode_declares_key_with_absolute_expiry() {
        let mut b = builder();
        let api = b
            .add_graphql_api(
                "Api",
                api_props(vec![TrustMode::ApiKey {
                    expires_after: chrono::Duration::days(365),
                }]),
            )
            .unwrap();

        assert!(b.api_key(&api).unwrap().is_some());
        let composition = b.build().unwrap();
        let (_, key) = composition.entities::<ApiKey>().next().unwrap();
        assert_eq!(
            key.expires,
            Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn api_without_trust_modes_is_rejected() {
        let mut b = builder();
        let err = b.add_graphql_api("Api", api_props(vec![])).unwrap_err();
        assert!(matches!(err, CompositionError::NoTrustMode(_)));
    }

    #[test]
    fn binding_requires_schema_field_and_is_unique() {
        let mut b = builder();
        let function = b.add_compute_handler("Function", handler()).unwrap();
        let key_mode = TrustMode::ApiKey {
            expires_after: chrono::Duration::days(1),
        };
        let api = b.add_graphql_api("Api", api_props(vec![key_mode])).unwrap();
        let ds = b.add_lambda_data_source(&api, "lambdaDatasource", &function).unwrap();

        b.bind(&ds, ProductOperation::GetProductById).unwrap();
        assert!(matches!(
            b.bind(&ds, ProductOperation::GetProductById),
            Err(CompositionError::DuplicateBinding { .. })
        ));
        assert!(matches!(
            b.bind(&ds, ProductOperation::DeleteProduct),
            Err(CompositionError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn outputs_are_write_once_and_add_nothing_to_the_graph() {
        let mut b = builder();
        let table = b
            .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
            .unwrap();
        let (nodes, edges) = (b.resource_count(), b.dependency_count());

        b.add_output("TableName", table.attr(Attribute::TableName)).unwrap();
        b.add_output("Region", ValueSource::Region).unwrap();
        assert!(matches!(
            b.add_output("Region", "eu-west-1"),
            Err(CompositionError::DuplicateOutput(_))
        ));

        assert_eq!((b.resource_count(), b.dependency_count()), (nodes, edges));
    }

    #[test]
    fn identity_pool_takes_a_single_client() {
        let mut b = builder();
        let pool = b
            .add_identity_pool("Pool", IdentityPool::self_service_email())
            .unwrap();
        b.add_identity_client("Client", &pool).unwrap();

        let err = b.add_identity_client("SecondClient", &pool).unwrap_err();
        assert!(matches!(err, CompositionError::DuplicateClient(id) if id == "Pool"));
    }

    #[test]
    fn environment_variables_are_set_once() {
        let mut b = builder();
        let table = b
            .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
            .unwrap();
        let function = b.add_compute_handler("Function", handler()).unwrap();
        b.add_environment(&function, "TABLE", table.attr(Attribute::TableName))
            .unwrap();

        let err = b.add_environment(&function, "TABLE", "literal").unwrap_err();
        assert!(matches!(
            err,
            CompositionError::DuplicateEnvironment { ref name, .. } if name == "TABLE"
        ));

        let composition = b.build().unwrap();
        let (_, function) = composition.entities::<ComputeHandler>().next().unwrap();
        assert_eq!(
            function.environment().get("TABLE"),
            Some(&Value::Attribute {
                logical_id: LogicalId::from("Table"),
                attribute: Attribute::TableName,
            })
        );
        assert_eq!(
            composition.dependencies_of("Function"),
            vec![&LogicalId::from("Table")]
        );
    }

    #[test]
    fn index_names_are_unique_per_table() {
        let mut b = builder();
        let table = b
            .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
            .unwrap();
        b.add_global_secondary_index(
            &table,
            GlobalSecondaryIndex::new("productsByCategory", KeyAttribute::string("category")),
        )
        .unwrap();

        let err = b
            .add_global_secondary_index(
                &table,
                GlobalSecondaryIndex::new("productsByCategory", KeyAttribute::string("name")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::DuplicateIndex { ref index, .. } if index == "productsByCategory"
        ));
    }

    #[test]
    fn handlers_referencing_each_other_fail_to_build() {
        let mut b = builder();
        let first = b.add_compute_handler("A", handler()).unwrap();
        let second = b.add_compute_handler("Z", handler()).unwrap();
        b.add_environment(&first, "PEER", second.attr(Attribute::FunctionName))
            .unwrap();
        b.add_environment(&second, "PEER", first.attr(Attribute::FunctionName))
            .unwrap();

        let err = b.build().unwrap_err();
        assert!(matches!(err, CompositionError::Cycle(ref id) if id == "A" || id == "Z"));
    }
}
