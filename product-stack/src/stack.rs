//! The product API stack: identity provider, product table, handler, GraphQL
//! API and the wiring between them.

use crate::error::CompositionError;
use crate::graph::{
    Composition, CompositionBuilder, GraphqlApiProps, Handle, TrustMode, ValueSource,
};
use crate::model::{
    AccessScope, Attribute, Code, ComputeHandler, DataStore, FieldLogLevel, GlobalSecondaryIndex,
    GraphqlApi, IdentityClient, IdentityPool, KeyAttribute, ProductOperation, Runtime,
};
use crate::schema::SchemaSource;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub const USER_POOL_ID: &str = "cdk-products-user-pool";
pub const USER_POOL_CLIENT_ID: &str = "UserPoolClient";
pub const API_ID: &str = "cdk-product-app";
pub const API_NAME: &str = "cdk-product-api";
pub const HANDLER_ID: &str = "AppSyncProductHandler";
pub const DATA_SOURCE_NAME: &str = "lambdaDatasource";
pub const TABLE_ID: &str = "CDKProductTable";
pub const CATEGORY_INDEX: &str = "productsByCategory";
pub const TABLE_ENV_VAR: &str = "PRODUCT_TABLE";
pub const HANDLER_MEMORY_MB: u32 = 1024;
pub const API_KEY_VALIDITY_DAYS: i64 = 365;

pub const OUTPUT_GRAPHQL_URL: &str = "GraphQLAPIURL";
pub const OUTPUT_API_KEY: &str = "AppSychAPIKey";
pub const OUTPUT_REGION: &str = "ProjectRegion";
pub const OUTPUT_USER_POOL_ID: &str = "UserPoolId";
pub const OUTPUT_USER_POOL_CLIENT_ID: &str = "UserPoolClientId";

/// Trust modes the API may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustModeKind {
    ApiKey,
    UserPool,
}

#[derive(Debug, Clone)]
pub struct ProductStackProps {
    pub stack_name: String,
    /// Instant the API key expiry is measured from.
    pub declared_at: DateTime<Utc>,
    pub schema: SchemaSource,
    pub asset_path: PathBuf,
    /// First entry is the API's default mode.
    pub trust_modes: Vec<TrustModeKind>,
}

impl ProductStackProps {
    pub fn new(stack_name: impl Into<String>, schema: SchemaSource, declared_at: DateTime<Utc>) -> Self {
        Self {
            stack_name: stack_name.into(),
            declared_at,
            schema,
            asset_path: PathBuf::from("lambda-fns"),
            trust_modes: vec![TrustModeKind::ApiKey, TrustModeKind::UserPool],
        }
    }
}

struct Identity {
    pool: Handle<IdentityPool>,
    client: Handle<IdentityClient>,
}

/// Build the product API composition.
pub fn declare(props: &ProductStackProps) -> Result<Composition, CompositionError> {
    tracing::info!(stack = %props.stack_name, "Declaring product API stack");
    let mut builder = CompositionBuilder::new(props.stack_name.clone(), props.declared_at);

    let identity = declare_identity(&mut builder)?;
    let table = declare_data_store(&mut builder)?;
    let handler = declare_compute(&mut builder, &props.asset_path, &table)?;
    let api = declare_api(&mut builder, props, &identity, &handler)?;
    assemble_grants_and_outputs(&mut builder, &identity, &table, &handler, &api)?;

    builder.build()
}

fn declare_identity(builder: &mut CompositionBuilder) -> Result<Identity, CompositionError> {
    let pool = builder.add_identity_pool(USER_POOL_ID, IdentityPool::self_service_email())?;
    let client = builder.add_identity_client(USER_POOL_CLIENT_ID, &pool)?;

    Ok(Identity { pool, client })
}

fn declare_data_store(builder: &mut CompositionBuilder) -> Result<Handle<DataStore>, CompositionError> {
    let table = builder.add_data_store(TABLE_ID, DataStore::on_demand(KeyAttribute::string("id")))?;
    builder.add_global_secondary_index(
        &table,
        GlobalSecondaryIndex::new(CATEGORY_INDEX, KeyAttribute::string("category")),
    )?;

    Ok(table)
}

fn declare_compute(
    builder: &mut CompositionBuilder,
    asset_path: &std::path::Path,
    table: &Handle<DataStore>,
) -> Result<Handle<ComputeHandler>, CompositionError> {
    let handler = builder.add_compute_handler(
        HANDLER_ID,
        ComputeHandler::new(
            Runtime::Nodejs14x,
            "main.handler",
            Code::Asset(asset_path.to_path_buf()),
            HANDLER_MEMORY_MB,
        ),
    )?;
    builder.add_environment(&handler, TABLE_ENV_VAR, table.attr(Attribute::TableName))?;

    Ok(handler)
}

fn declare_api(
    builder: &mut CompositionBuilder,
    props: &ProductStackProps,
    identity: &Identity,
    handler: &Handle<ComputeHandler>,
) -> Result<Handle<GraphqlApi>, CompositionError> {
    let trust_modes = props
        .trust_modes
        .iter()
        .map(|kind| match kind {
            TrustModeKind::ApiKey => TrustMode::ApiKey {
                expires_after: chrono::Duration::days(API_KEY_VALIDITY_DAYS),
            },
            TrustModeKind::UserPool => TrustMode::UserPool(identity.pool),
        })
        .collect();

    let api = builder.add_graphql_api(
        API_ID,
        GraphqlApiProps {
            name: API_NAME.to_string(),
            log_level: FieldLogLevel::All,
            schema: props.schema.clone(),
            trust_modes,
        },
    )?;

    let data_source = builder.add_lambda_data_source(&api, DATA_SOURCE_NAME, handler)?;
    for operation in ProductOperation::ALL {
        builder.bind(&data_source, operation)?;
    }

    Ok(api)
}

fn assemble_grants_and_outputs(
    builder: &mut CompositionBuilder,
    identity: &Identity,
    table: &Handle<DataStore>,
    handler: &Handle<ComputeHandler>,
    api: &Handle<GraphqlApi>,
) -> Result<(), CompositionError> {
    builder.grant(handler, table, AccessScope::Full)?;

    // no key-based trust mode publishes an empty key
    let api_key = match builder.api_key(api)? {
        Some(key) => ValueSource::from(key.attr(Attribute::ApiKey)),
        None => ValueSource::from(""),
    };

    builder.add_output(OUTPUT_GRAPHQL_URL, api.attr(Attribute::GraphQlUrl))?;
    builder.add_output(OUTPUT_API_KEY, api_key)?;
    builder.add_output(OUTPUT_REGION, ValueSource::Region)?;
    builder.add_output(OUTPUT_USER_POOL_ID, identity.pool.attr(Attribute::UserPoolId))?;
    builder.add_output(
        OUTPUT_USER_POOL_CLIENT_ID,
        identity.client.attr(Attribute::ClientId),
    )?;

    Ok(())
}
