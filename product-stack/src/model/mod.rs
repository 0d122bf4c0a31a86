//! Declared resource descriptors.
//!
//! Every entity in a composition is one of the [`Resource`] variants, keyed by
//! a [`LogicalId`]. Descriptors only ever point at each other through logical
//! ids; the composition owns them all.

pub mod api;
pub mod compute;
pub mod grant;
pub mod identity;
pub mod output;
pub mod store;
pub mod value;

pub use api::{
    ApiKey, AuthorizationConfig, AuthorizationMode, Binding, DataSource, FieldLogLevel,
    GraphqlApi, ProductOperation,
};
pub use compute::{Code, ComputeHandler, Runtime};
pub use grant::{AccessScope, PermissionGrant};
pub use identity::{AccountRecovery, IdentityClient, IdentityPool, StandardAttribute, VerificationStyle};
pub use output::{Output, OutputSet};
pub use store::{AttributeType, BillingMode, DataStore, GlobalSecondaryIndex, KeyAttribute};
pub use value::Value;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical ids are non-empty and limited to ASCII letters, digits, `-` and `_`.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LogicalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for LogicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LogicalId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LogicalId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    IdentityPool,
    IdentityClient,
    DataStore,
    ComputeHandler,
    GraphqlApi,
    ApiKey,
    DataSource,
    Binding,
    PermissionGrant,
}

impl ResourceKind {
    /// Attributes the provisioning engine hands back for this kind.
    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            ResourceKind::IdentityPool => &[Attribute::UserPoolId, Attribute::UserPoolArn],
            ResourceKind::IdentityClient => &[Attribute::ClientId],
            ResourceKind::DataStore => &[Attribute::TableName, Attribute::TableArn],
            ResourceKind::ComputeHandler => &[Attribute::FunctionName, Attribute::FunctionArn],
            ResourceKind::GraphqlApi => &[Attribute::ApiId, Attribute::GraphQlUrl],
            ResourceKind::ApiKey => &[Attribute::ApiKey],
            ResourceKind::DataSource | ResourceKind::Binding | ResourceKind::PermissionGrant => &[],
        }
    }

    pub fn supports(self, attribute: Attribute) -> bool {
        self.attributes().contains(&attribute)
    }

    pub fn cfn_type(self) -> &'static str {
        match self {
            ResourceKind::IdentityPool => "AWS::Cognito::UserPool",
            ResourceKind::IdentityClient => "AWS::Cognito::UserPoolClient",
            ResourceKind::DataStore => "AWS::DynamoDB::Table",
            ResourceKind::ComputeHandler => "AWS::Lambda::Function",
            ResourceKind::GraphqlApi => "AWS::AppSync::GraphQLApi",
            ResourceKind::ApiKey => "AWS::AppSync::ApiKey",
            ResourceKind::DataSource => "AWS::AppSync::DataSource",
            ResourceKind::Binding => "AWS::AppSync::Resolver",
            ResourceKind::PermissionGrant => "AWS::IAM::Policy",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Resolved attribute an entity exposes once provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    UserPoolId,
    UserPoolArn,
    ClientId,
    TableName,
    TableArn,
    FunctionName,
    FunctionArn,
    ApiId,
    GraphQlUrl,
    ApiKey,
}

impl Attribute {
    /// Attribute name as rendered in a `Fn::GetAtt`.
    pub fn cfn_name(self) -> &'static str {
        match self {
            Attribute::UserPoolId => "UserPoolId",
            Attribute::UserPoolArn | Attribute::TableArn | Attribute::FunctionArn => "Arn",
            Attribute::ClientId => "ClientId",
            Attribute::TableName => "TableName",
            Attribute::FunctionName => "FunctionName",
            Attribute::ApiId => "ApiId",
            Attribute::GraphQlUrl => "GraphQLUrl",
            Attribute::ApiKey => "ApiKey",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Resource {
    IdentityPool(IdentityPool),
    IdentityClient(IdentityClient),
    DataStore(DataStore),
    ComputeHandler(ComputeHandler),
    GraphqlApi(GraphqlApi),
    ApiKey(ApiKey),
    DataSource(DataSource),
    Binding(Binding),
    PermissionGrant(PermissionGrant),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::IdentityPool(_) => ResourceKind::IdentityPool,
            Resource::IdentityClient(_) => ResourceKind::IdentityClient,
            Resource::DataStore(_) => ResourceKind::DataStore,
            Resource::ComputeHandler(_) => ResourceKind::ComputeHandler,
            Resource::GraphqlApi(_) => ResourceKind::GraphqlApi,
            Resource::ApiKey(_) => ResourceKind::ApiKey,
            Resource::DataSource(_) => ResourceKind::DataSource,
            Resource::Binding(_) => ResourceKind::Binding,
            Resource::PermissionGrant(_) => ResourceKind::PermissionGrant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub logical_id: LogicalId,
    pub resource: Resource,
}

impl DeclaredResource {
    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }
}

/// Descriptor types that can be declared into a composition.
pub trait Declared: Sized + 'static {
    const KIND: ResourceKind;

    fn into_resource(self) -> Resource;
    fn from_resource(resource: &Resource) -> Option<&Self>;
    fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self>;
}

macro_rules! declared {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Declared for $ty {
                const KIND: ResourceKind = ResourceKind::$ty;

                fn into_resource(self) -> Resource {
                    Resource::$ty(self)
                }

                fn from_resource(resource: &Resource) -> Option<&Self> {
                    match resource {
                        Resource::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self> {
                    match resource {
                        Resource::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

declared!(
    IdentityPool,
    IdentityClient,
    DataStore,
    ComputeHandler,
    GraphqlApi,
    ApiKey,
    DataSource,
    Binding,
    PermissionGrant,
);
