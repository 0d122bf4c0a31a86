//! Renders a composition as a CloudFormation-shaped JSON template.

use crate::graph::Composition;
use crate::model::{
    AuthorizationMode, BillingMode, DeclaredResource, IdentityPool, LogicalId, Resource, Value,
    VerificationStyle,
};
use serde_json::{json, Map, Value as Json};

pub fn synthesize(composition: &Composition) -> Json {
    let mut resources = Map::new();
    for declared in composition.resources() {
        let role = match &declared.resource {
            Resource::ComputeHandler(_) => Some(service_role_id(&declared.logical_id)),
            _ => None,
        };
        let mut depends_on: Vec<&str> = composition
            .dependencies_of(declared.logical_id.as_str())
            .into_iter()
            .map(LogicalId::as_str)
            .chain(role.as_deref())
            .collect();
        depends_on.sort_unstable();
        depends_on.dedup();

        if let Some(role) = &role {
            resources.insert(role.clone(), service_role());
        }
        let mut entry = Map::new();
        entry.insert("Type".into(), json!(declared.kind().cfn_type()));
        entry.insert("Properties".into(), properties(composition, declared));
        if !depends_on.is_empty() {
            entry.insert("DependsOn".into(), json!(depends_on));
        }
        resources.insert(declared.logical_id.to_string(), Json::Object(entry));
    }

    let mut outputs = Map::new();
    for output in composition.outputs().iter() {
        outputs.insert(output.name.clone(), json!({ "Value": render(&output.value) }));
    }

    tracing::debug!(
        stack = %composition.stack_name(),
        resources = resources.len(),
        outputs = outputs.len(),
        "Template synthesized"
    );

    json!({
        "Description": format!("{} (product API stack)", composition.stack_name()),
        "Resources": resources,
        "Outputs": outputs,
    })
}

/// Render a value the way a template references it.
pub fn render(value: &Value) -> Json {
    match value {
        Value::Literal(literal) => json!(literal),
        Value::Attribute {
            logical_id,
            attribute,
        } => get_att(logical_id.as_str(), attribute.cfn_name()),
        Value::Region => json!({ "Ref": "AWS::Region" }),
    }
}

fn get_att(logical_id: &str, attribute: &str) -> Json {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// Execution role synthesized alongside every compute handler.
fn service_role_id(handler: &LogicalId) -> String {
    format!("{handler}ServiceRole")
}

fn service_role() -> Json {
    json!({
        "Type": "AWS::IAM::Role",
        "Properties": {
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                    "Action": "sts:AssumeRole",
                }],
            },
            "ManagedPolicyArns": [{
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
                ]],
            }],
        },
    })
}

fn reference(logical_id: &LogicalId) -> Json {
    json!({ "Ref": logical_id.as_str() })
}

fn properties(composition: &Composition, declared: &DeclaredResource) -> Json {
    match &declared.resource {
        Resource::IdentityPool(pool) => identity_pool(pool),
        Resource::IdentityClient(client) => json!({
            "UserPoolId": reference(&client.user_pool),
            "GenerateSecret": false,
        }),
        Resource::DataStore(store) => {
            let definitions: Vec<Json> = store
                .key_attributes()
                .into_iter()
                .map(|key| json!({ "AttributeName": key.name, "AttributeType": key.attribute_type.code() }))
                .collect();
            let indexes: Vec<Json> = store
                .global_secondary_indexes()
                .iter()
                .map(|index| {
                    json!({
                        "IndexName": index.index_name,
                        "KeySchema": [{ "AttributeName": index.partition_key.name, "KeyType": "HASH" }],
                        "Projection": { "ProjectionType": "ALL" },
                    })
                })
                .collect();

            let mut props = json!({
                "AttributeDefinitions": definitions,
                "KeySchema": [{ "AttributeName": store.partition_key().name, "KeyType": "HASH" }],
                "GlobalSecondaryIndexes": indexes,
            });
            match store.billing_mode() {
                BillingMode::PayPerRequest => props["BillingMode"] = json!("PAY_PER_REQUEST"),
            }
            props
        }
        Resource::ComputeHandler(handler) => {
            let variables: Map<String, Json> = handler
                .environment()
                .iter()
                .map(|(name, value)| (name.clone(), render(value)))
                .collect();
            json!({
                "Runtime": handler.runtime.identifier(),
                "Handler": handler.handler,
                "MemorySize": handler.memory_size,
                "Role": get_att(&service_role_id(&declared.logical_id), "Arn"),
                "Code": { "Asset": handler.code.path().display().to_string() },
                "Environment": { "Variables": variables },
            })
        }
        Resource::GraphqlApi(api) => {
            let additional: Vec<Json> = api
                .authorization
                .additional_modes
                .iter()
                .map(authentication_provider)
                .collect();

            let mut props = authentication_provider(&api.authorization.default_mode);
            props["Name"] = json!(api.name);
            props["LogConfig"] = json!({ "FieldLogLevel": api.log_level.as_str() });
            props["SchemaLocation"] = json!(api.schema.path.display().to_string());
            if !additional.is_empty() {
                props["AdditionalAuthenticationProviders"] = json!(additional);
            }
            props
        }
        Resource::ApiKey(key) => json!({
            "ApiId": get_att(key.api.as_str(), "ApiId"),
            "Expires": key.expires.timestamp(),
        }),
        Resource::DataSource(data_source) => json!({
            "ApiId": get_att(data_source.api.as_str(), "ApiId"),
            "Name": data_source.name,
            "Type": "AWS_LAMBDA",
            "LambdaConfig": {
                "LambdaFunctionArn": get_att(data_source.handler.as_str(), "Arn"),
            },
        }),
        Resource::Binding(binding) => {
            let data_source_name = match composition.resource(binding.data_source.as_str()) {
                Some(DeclaredResource {
                    resource: Resource::DataSource(data_source),
                    ..
                }) => json!(data_source.name),
                _ => reference(&binding.data_source),
            };
            json!({
                "ApiId": get_att(binding.api.as_str(), "ApiId"),
                "TypeName": binding.category.to_string(),
                "FieldName": binding.field_name,
                "DataSourceName": data_source_name,
            })
        }
        Resource::PermissionGrant(grant) => {
            let object_arn = get_att(grant.object.as_str(), "Arn");
            json!({
                "PolicyName": declared.logical_id.as_str(),
                "Roles": [{ "Ref": service_role_id(&grant.subject) }],
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": grant.scope.actions(),
                        "Resource": [
                            object_arn.clone(),
                            { "Fn::Join": ["", [object_arn, "/index/*"]] },
                        ],
                    }],
                },
            })
        }
    }
}

fn identity_pool(pool: &IdentityPool) -> Json {
    let recovery: Vec<Json> = pool
        .account_recovery
        .mechanisms()
        .iter()
        .enumerate()
        .map(|(priority, name)| json!({ "Name": name, "Priority": priority + 1 }))
        .collect();
    let schema: Vec<Json> = pool
        .standard_attributes
        .iter()
        .map(|attribute| {
            json!({
                "Name": attribute.name,
                "Required": attribute.required,
                "Mutable": attribute.mutable,
            })
        })
        .collect();
    let auto_verified: Vec<&str> = if pool.auto_verify_email {
        vec!["email"]
    } else {
        Vec::new()
    };
    let email_option = match pool.email_style {
        VerificationStyle::Code => "CONFIRM_WITH_CODE",
    };

    json!({
        "AccountRecoverySetting": { "RecoveryMechanisms": recovery },
        "AdminCreateUserConfig": { "AllowAdminCreateUserOnly": !pool.self_sign_up_enabled },
        "AutoVerifiedAttributes": auto_verified,
        "Schema": schema,
        "VerificationMessageTemplate": { "DefaultEmailOption": email_option },
    })
}

fn authentication_provider(mode: &AuthorizationMode) -> Json {
    let mut provider = json!({ "AuthenticationType": mode.cfn_type() });
    if let AuthorizationMode::UserPool { user_pool } = mode {
        provider["UserPoolConfig"] = json!({
            "UserPoolId": reference(user_pool),
            "AwsRegion": { "Ref": "AWS::Region" },
        });
    }
    provider
}
