use super::LogicalId;
use crate::schema::{OperationCategory, SchemaSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldLogLevel {
    All,
}

impl FieldLogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldLogLevel::All => "ALL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Anonymous access with an issued key valid until `expires`.
    ApiKey { expires: DateTime<Utc> },
    UserPool { user_pool: LogicalId },
}

impl AuthorizationMode {
    pub fn cfn_type(&self) -> &'static str {
        match self {
            AuthorizationMode::ApiKey { .. } => "API_KEY",
            AuthorizationMode::UserPool { .. } => "AMAZON_COGNITO_USER_POOLS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    pub default_mode: AuthorizationMode,
    pub additional_modes: Vec<AuthorizationMode>,
}

impl AuthorizationConfig {
    /// Default mode first, then additional modes in declaration order.
    pub fn modes(&self) -> impl Iterator<Item = &AuthorizationMode> {
        std::iter::once(&self.default_mode).chain(self.additional_modes.iter())
    }

    pub fn api_key_expiry(&self) -> Option<DateTime<Utc>> {
        self.modes().find_map(|mode| match mode {
            AuthorizationMode::ApiKey { expires } => Some(*expires),
            _ => None,
        })
    }

    pub fn user_pools(&self) -> Vec<&LogicalId> {
        self.modes()
            .filter_map(|mode| match mode {
                AuthorizationMode::UserPool { user_pool } => Some(user_pool),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GraphqlApi {
    #[validate(length(min = 1, max = 65, message = "API name must be 1-65 characters"))]
    pub name: String,
    pub log_level: FieldLogLevel,
    pub schema: SchemaSource,
    pub authorization: AuthorizationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub api: LogicalId,
    pub expires: DateTime<Utc>,
}

/// A compute handler registered as a named backend of an API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DataSource {
    pub api: LogicalId,
    #[validate(custom(function = "validate_data_source_name"))]
    pub name: String,
    pub handler: LogicalId,
}

fn validate_data_source_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("data_source_name")
            .with_message("Data source names use letters, digits and underscores".into()))
    }
}

/// Operations the product API routes to its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductOperation {
    GetProductById,
    ListProducts,
    ProductsByCategory,
    CreateProduct,
    DeleteProduct,
    UpdateProduct,
}

impl ProductOperation {
    pub const ALL: [ProductOperation; 6] = [
        ProductOperation::GetProductById,
        ProductOperation::ListProducts,
        ProductOperation::ProductsByCategory,
        ProductOperation::CreateProduct,
        ProductOperation::DeleteProduct,
        ProductOperation::UpdateProduct,
    ];

    pub fn category(self) -> OperationCategory {
        match self {
            ProductOperation::GetProductById
            | ProductOperation::ListProducts
            | ProductOperation::ProductsByCategory => OperationCategory::Query,
            ProductOperation::CreateProduct
            | ProductOperation::DeleteProduct
            | ProductOperation::UpdateProduct => OperationCategory::Mutation,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            ProductOperation::GetProductById => "getProductById",
            ProductOperation::ListProducts => "listProducts",
            ProductOperation::ProductsByCategory => "productsByCategory",
            ProductOperation::CreateProduct => "createProduct",
            ProductOperation::DeleteProduct => "deleteProduct",
            ProductOperation::UpdateProduct => "updateProduct",
        }
    }
}

impl fmt::Display for ProductOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category(), self.field_name())
    }
}

/// Routes one API operation to the handler behind a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub api: LogicalId,
    pub data_source: LogicalId,
    pub handler: LogicalId,
    pub category: OperationCategory,
    pub field_name: String,
}

impl Binding {
    pub fn operation(&self) -> String {
        format!("{}.{}", self.category, self.field_name)
    }
}
