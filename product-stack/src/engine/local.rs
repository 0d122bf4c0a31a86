use super::naming::{physical_name, token};
use super::{DeployTarget, Deployment, ProvisioningEngine, ProvisioningError, ResolvedResource};
use crate::graph::Composition;
use crate::model::{Attribute, DeclaredResource, Resource, Value};
use crate::schema::{parse_schema, SchemaCatalog, SchemaError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Offline engine: checks what a real engine would check on disk and
/// derives every generated identifier from the stack and logical id, so
/// repeated deployments of the same composition report the same values.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    asset_root: PathBuf,
}

impl LocalEngine {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    fn locate(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }
}

#[async_trait]
impl ProvisioningEngine for LocalEngine {
    async fn deploy(
        &self,
        composition: &Composition,
        target: &DeployTarget,
    ) -> Result<Deployment, ProvisioningError> {
        target.validate()?;

        let stack = composition.stack_name();
        tracing::info!(
            engine = self.name(),
            stack = %stack,
            account = %target.account,
            region = %target.region,
            "Deploying composition"
        );

        let mut resolved: Vec<ResolvedResource> = Vec::with_capacity(composition.resources().len());
        let mut catalogs: HashMap<String, SchemaCatalog> = HashMap::new();

        for logical_id in composition.deployment_order() {
            let declared = composition
                .resource(logical_id.as_str())
                .ok_or_else(|| ProvisioningError::UnknownResource(logical_id.clone()))?;
            let mut resource = realize(stack, target, declared);

            match &declared.resource {
                Resource::ComputeHandler(handler) => {
                    let path = self.locate(handler.code.path());
                    if tokio::fs::metadata(&path).await.is_err() {
                        return Err(ProvisioningError::ArtifactMissing {
                            logical_id: logical_id.clone(),
                            path,
                        });
                    }
                    for (name, value) in handler.environment() {
                        let value = resolve_value(value, &resolved, target)?;
                        resource.environment.insert(name.clone(), value);
                    }
                }
                Resource::GraphqlApi(api) => {
                    let path = self.locate(&api.schema.path);
                    let sdl = match tokio::fs::read_to_string(&path).await {
                        Ok(sdl) => sdl,
                        Err(err) if err.kind() == ErrorKind::NotFound => {
                            return Err(ProvisioningError::SchemaMissing {
                                logical_id: logical_id.clone(),
                                path,
                            });
                        }
                        Err(source) => {
                            return Err(ProvisioningError::SchemaInvalid {
                                logical_id: logical_id.clone(),
                                source: SchemaError::Io { path, source },
                            });
                        }
                    };
                    let catalog =
                        parse_schema(&sdl).map_err(|source| ProvisioningError::SchemaInvalid {
                            logical_id: logical_id.clone(),
                            source,
                        })?;
                    catalogs.insert(logical_id.to_string(), catalog);
                }
                Resource::Binding(binding) => {
                    let declared_in_schema = catalogs
                        .get(binding.api.as_str())
                        .is_some_and(|catalog| catalog.contains(binding.category, &binding.field_name));
                    if !declared_in_schema {
                        return Err(ProvisioningError::UnknownOperation {
                            logical_id: logical_id.clone(),
                            operation: binding.operation(),
                        });
                    }
                }
                _ => {}
            }

            tracing::info!(
                logical_id = %logical_id,
                kind = %resource.kind,
                physical_id = %resource.physical_id,
                "Resource resolved"
            );
            resolved.push(resource);
        }

        let mut outputs = BTreeMap::new();
        for output in composition.outputs().iter() {
            let value = resolve_value(&output.value, &resolved, target)?;
            outputs.insert(output.name.clone(), value);
        }

        tracing::info!(
            stack = %stack,
            resources = resolved.len(),
            outputs = outputs.len(),
            "Deployment complete"
        );

        Ok(Deployment {
            stack_name: stack.to_string(),
            target: target.clone(),
            resources: resolved,
            outputs,
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

fn realize(stack: &str, target: &DeployTarget, declared: &DeclaredResource) -> ResolvedResource {
    let id = declared.logical_id.as_str();
    let region = &target.region;
    let account = &target.account;

    let (physical_id, attributes) = match &declared.resource {
        Resource::IdentityPool(_) => {
            let pool_id = format!("{region}_{}", token(stack, id, 9));
            let arn = format!("arn:aws:cognito-idp:{region}:{account}:userpool/{pool_id}");
            (
                pool_id.clone(),
                vec![(Attribute::UserPoolId, pool_id), (Attribute::UserPoolArn, arn)],
            )
        }
        Resource::IdentityClient(_) => {
            let client_id = token(stack, id, 26);
            (client_id.clone(), vec![(Attribute::ClientId, client_id)])
        }
        Resource::DataStore(_) => {
            let name = physical_name(stack, id, 255);
            let arn = format!("arn:aws:dynamodb:{region}:{account}:table/{name}");
            (
                name.clone(),
                vec![(Attribute::TableName, name), (Attribute::TableArn, arn)],
            )
        }
        Resource::ComputeHandler(_) => {
            let name = physical_name(stack, id, 64);
            let arn = format!("arn:aws:lambda:{region}:{account}:function:{name}");
            (
                name.clone(),
                vec![(Attribute::FunctionName, name), (Attribute::FunctionArn, arn)],
            )
        }
        Resource::GraphqlApi(_) => {
            let api_id = token(stack, id, 26);
            let url = format!("https://{api_id}.appsync-api.{region}.amazonaws.com/graphql");
            (
                api_id.clone(),
                vec![(Attribute::ApiId, api_id), (Attribute::GraphQlUrl, url)],
            )
        }
        Resource::ApiKey(_) => {
            let key = format!("da2-{}", token(stack, id, 26));
            (key.clone(), vec![(Attribute::ApiKey, key)])
        }
        Resource::DataSource(data_source) => (data_source.name.clone(), Vec::new()),
        Resource::Binding(binding) => (binding.operation(), Vec::new()),
        Resource::PermissionGrant(_) => (physical_name(stack, id, 128), Vec::new()),
    };

    ResolvedResource {
        logical_id: declared.logical_id.clone(),
        kind: declared.kind(),
        physical_id,
        attributes: attributes.into_iter().collect(),
        environment: BTreeMap::new(),
    }
}

fn resolve_value(
    value: &Value,
    resolved: &[ResolvedResource],
    target: &DeployTarget,
) -> Result<String, ProvisioningError> {
    match value {
        Value::Literal(literal) => Ok(literal.clone()),
        Value::Region => Ok(target.region.clone()),
        Value::Attribute {
            logical_id,
            attribute,
        } => resolved
            .iter()
            .find(|resource| &resource.logical_id == logical_id)
            .and_then(|resource| resource.attributes.get(attribute))
            .cloned()
            .ok_or_else(|| ProvisioningError::UnresolvedAttribute {
                logical_id: logical_id.clone(),
                attribute: *attribute,
            }),
    }
}
