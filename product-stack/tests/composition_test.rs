//! Properties of the declared product API composition.

mod common;

use product_stack::graph::{CompositionBuilder, EdgeKind};
use product_stack::model::{
    AccessScope, ApiKey, Attribute, AuthorizationMode, Binding, ComputeHandler, DataSource,
    DataStore, GlobalSecondaryIndex, GraphqlApi, IdentityPool, KeyAttribute, PermissionGrant,
    ProductOperation, Value,
};
use product_stack::schema::{OperationCategory, SchemaSource};
use product_stack::stack::{self, TrustModeKind};
use product_stack::CompositionError;
use std::collections::BTreeSet;

#[test]
fn declares_every_entity_once() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let ids: Vec<&str> = composition
        .resources()
        .iter()
        .map(|resource| resource.logical_id.as_str())
        .collect();
    for expected in [
        stack::USER_POOL_ID,
        stack::USER_POOL_CLIENT_ID,
        stack::TABLE_ID,
        stack::HANDLER_ID,
        stack::API_ID,
        "cdk-product-appDefaultApiKey",
        "cdk-product-applambdaDatasource",
        "AppSyncProductHandlerCDKProductTableGrant",
    ] {
        assert!(ids.contains(&expected), "missing {expected}");
    }
    // identity x2, table, handler, api, key, data source, 6 bindings, grant
    assert_eq!(composition.resources().len(), 14);
}

#[test]
fn every_binding_targets_the_single_backend() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let data_sources: Vec<_> = composition.entities::<DataSource>().collect();
    assert_eq!(data_sources.len(), 1);
    let (data_source_id, data_source) = data_sources[0];
    assert_eq!(data_source.name, stack::DATA_SOURCE_NAME);
    assert_eq!(data_source.handler, stack::HANDLER_ID);

    let bindings: Vec<&Binding> = composition.bindings().collect();
    assert_eq!(bindings.len(), 6);
    assert!(bindings
        .iter()
        .all(|b| &b.data_source == data_source_id && b.handler == stack::HANDLER_ID));
}

#[test]
fn binds_the_six_product_operations() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let bound: BTreeSet<String> = composition.bindings().map(Binding::operation).collect();
    let expected: BTreeSet<String> = [
        "Query.getProductById",
        "Query.listProducts",
        "Query.productsByCategory",
        "Mutation.createProduct",
        "Mutation.deleteProduct",
        "Mutation.updateProduct",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(bound, expected);
}

#[test]
fn secondary_index_uses_a_different_key_than_the_table() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let (_, table) = composition
        .entities::<DataStore>()
        .next()
        .expect("one table");
    let index = table
        .index(stack::CATEGORY_INDEX)
        .expect("category index declared");

    assert_eq!(table.partition_key().name, "id");
    assert_eq!(index.partition_key.name, "category");
    assert_ne!(index.partition_key.name, table.partition_key().name);
}

#[test]
fn index_on_the_primary_key_is_rejected() {
    let mut builder = CompositionBuilder::new(common::STACK_NAME, common::declared_at());
    let table = builder
        .add_data_store("Table", DataStore::on_demand(KeyAttribute::string("id")))
        .expect("table declares");

    let err = builder
        .add_global_secondary_index(&table, GlobalSecondaryIndex::new("byId", KeyAttribute::string("id")))
        .unwrap_err();

    assert!(matches!(err, CompositionError::IndexKeyCollision { ref key, .. } if key == "id"));
}

#[test]
fn environment_cannot_reference_an_undeclared_store() {
    let mut builder = CompositionBuilder::new(common::STACK_NAME, common::declared_at());
    let handler = builder
        .add_compute_handler(
            stack::HANDLER_ID,
            ComputeHandler::new(
                product_stack::model::Runtime::Nodejs14x,
                "main.handler",
                product_stack::model::Code::Asset("lambda-fns".into()),
                1024,
            ),
        )
        .expect("handler declares");

    // no table in this builder yet
    let lookup = builder.find::<DataStore>(stack::TABLE_ID);
    assert!(matches!(lookup, Err(CompositionError::UnresolvedReference { .. })));

    // a table declared elsewhere is not a reference this builder can resolve
    let mut other = CompositionBuilder::new("Other", common::declared_at());
    let foreign = other
        .add_data_store(stack::TABLE_ID, DataStore::on_demand(KeyAttribute::string("id")))
        .expect("table declares");
    let err = builder
        .add_environment(&handler, stack::TABLE_ENV_VAR, foreign.attr(Attribute::TableName))
        .unwrap_err();
    assert!(matches!(err, CompositionError::UnresolvedReference { .. }));
    assert_eq!(builder.dependency_count(), 0);
}

#[test]
fn handler_environment_carries_the_table_name() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let (_, handler) = composition
        .entities::<ComputeHandler>()
        .next()
        .expect("one handler");
    assert_eq!(handler.memory_size, stack::HANDLER_MEMORY_MB);
    assert_eq!(
        handler.environment().get(stack::TABLE_ENV_VAR),
        Some(&Value::Attribute {
            logical_id: stack::TABLE_ID.into(),
            attribute: Attribute::TableName,
        })
    );
    assert!(composition.dependencies().iter().any(|dep| {
        dep.dependent == stack::HANDLER_ID
            && dep.dependency == stack::TABLE_ID
            && dep.kind == EdgeKind::Environment
    }));
}

#[test]
fn handler_gets_full_access_to_the_table() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let grants: Vec<_> = composition.entities::<PermissionGrant>().collect();
    assert_eq!(grants.len(), 1);
    let (_, grant) = grants[0];
    assert_eq!(grant.subject, stack::HANDLER_ID);
    assert_eq!(grant.object, stack::TABLE_ID);
    assert_eq!(grant.scope, AccessScope::Full);
}

#[test]
fn publishes_exactly_five_outputs() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let mut names = composition.outputs().names();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "AppSychAPIKey",
            "GraphQLAPIURL",
            "ProjectRegion",
            "UserPoolClientId",
            "UserPoolId",
        ]
    );
    assert_eq!(composition.outputs().get("ProjectRegion"), Some(&Value::Region));
    assert_eq!(
        composition.outputs().get("GraphQLAPIURL"),
        Some(&Value::Attribute {
            logical_id: stack::API_ID.into(),
            attribute: Attribute::GraphQlUrl,
        })
    );
}

#[test]
fn outputs_neither_declare_entities_nor_add_edges() {
    let mut builder = CompositionBuilder::new(common::STACK_NAME, common::declared_at());
    let pool = builder
        .add_identity_pool(stack::USER_POOL_ID, IdentityPool::self_service_email())
        .expect("pool declares");
    let client = builder
        .add_identity_client(stack::USER_POOL_CLIENT_ID, &pool)
        .expect("client declares");
    let (resources, edges) = (builder.resource_count(), builder.dependency_count());

    builder
        .add_output("UserPoolId", pool.attr(Attribute::UserPoolId))
        .expect("output declares");
    builder
        .add_output("UserPoolClientId", client.attr(Attribute::ClientId))
        .expect("output declares");
    builder
        .add_output("ProjectRegion", product_stack::graph::ValueSource::Region)
        .expect("output declares");

    assert_eq!(builder.resource_count(), resources);
    assert_eq!(builder.dependency_count(), edges);

    let err = builder.add_output("UserPoolId", "again").unwrap_err();
    assert!(matches!(err, CompositionError::DuplicateOutput(name) if name == "UserPoolId"));
}

#[test]
fn repeated_declarations_are_identical() {
    let first = stack::declare(&common::props()).expect("stack should declare");
    let second = stack::declare(&common::props()).expect("stack should declare");

    assert_eq!(first, second);
}

#[test]
fn deployment_order_places_dependencies_first() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let order = composition.deployment_order();
    let position = |id: &str| {
        order
            .iter()
            .position(|entry| entry == id)
            .unwrap_or_else(|| panic!("{id} missing from deployment order"))
    };

    assert_eq!(order.len(), composition.resources().len());
    for dependency in composition.dependencies() {
        assert!(
            position(dependency.dependency.as_str()) < position(dependency.dependent.as_str()),
            "{} must deploy before {}",
            dependency.dependency,
            dependency.dependent
        );
    }
}

#[test]
fn identity_outputs_resolve_without_user_pool_trust_mode() {
    let mut props = common::props();
    props.trust_modes = vec![TrustModeKind::ApiKey];
    let composition = stack::declare(&props).expect("stack should declare");

    let (_, api) = composition
        .entities::<GraphqlApi>()
        .next()
        .expect("one api");
    assert!(api.authorization.user_pools().is_empty());
    assert!(composition.resource(stack::USER_POOL_ID).is_some());
    assert_eq!(
        composition.outputs().get("UserPoolId"),
        Some(&Value::Attribute {
            logical_id: stack::USER_POOL_ID.into(),
            attribute: Attribute::UserPoolId,
        })
    );
    assert_eq!(
        composition.outputs().get("UserPoolClientId"),
        Some(&Value::Attribute {
            logical_id: stack::USER_POOL_CLIENT_ID.into(),
            attribute: Attribute::ClientId,
        })
    );
}

#[test]
fn key_output_is_empty_without_key_trust_mode() {
    let mut props = common::props();
    props.trust_modes = vec![TrustModeKind::UserPool];
    let composition = stack::declare(&props).expect("stack should declare");

    assert_eq!(composition.entities::<ApiKey>().count(), 0);
    assert_eq!(
        composition.outputs().get("AppSychAPIKey"),
        Some(&Value::literal(""))
    );
    let (_, api) = composition
        .entities::<GraphqlApi>()
        .next()
        .expect("one api");
    assert!(matches!(
        api.authorization.default_mode,
        AuthorizationMode::UserPool { .. }
    ));
}

#[test]
fn api_key_expires_a_year_after_declaration() {
    let composition = stack::declare(&common::props()).expect("stack should declare");

    let (_, key) = composition.entities::<ApiKey>().next().expect("one key");
    assert_eq!(key.expires, common::declared_at() + chrono::Duration::days(365));
    assert_eq!(key.api, stack::API_ID);
}

#[test]
fn api_without_trust_modes_is_rejected() {
    let mut props = common::props();
    props.trust_modes.clear();

    let err = stack::declare(&props).unwrap_err();
    assert!(matches!(err, CompositionError::NoTrustMode(id) if id == stack::API_ID));
}

#[test]
fn operation_missing_from_schema_is_rejected() {
    let mut props = common::props();
    let sdl = common::PRODUCT_SCHEMA.replace("deleteProduct", "archiveProduct");
    props.schema = SchemaSource::from_definition(common::SCHEMA_PATH, &sdl).expect("schema parses");

    let err = stack::declare(&props).unwrap_err();
    match err {
        CompositionError::UnknownOperation {
            category, field, ..
        } => {
            assert_eq!(category, OperationCategory::Mutation);
            assert_eq!(field, ProductOperation::DeleteProduct.field_name());
        }
        other => panic!("expected unknown operation, got {other:?}"),
    }
}
