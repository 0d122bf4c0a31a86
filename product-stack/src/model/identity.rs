use super::LogicalId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRecovery {
    PhoneAndEmail,
}

impl AccountRecovery {
    /// Recovery mechanisms in priority order.
    pub fn mechanisms(self) -> &'static [&'static str] {
        match self {
            AccountRecovery::PhoneAndEmail => &["verified_phone_number", "verified_email"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStyle {
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StandardAttribute {
    #[validate(length(min = 1, message = "Attribute name cannot be empty"))]
    pub name: String,
    pub required: bool,
    pub mutable: bool,
}

/// User directory the API's identity trust mode and the client hang off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IdentityPool {
    pub self_sign_up_enabled: bool,
    pub account_recovery: AccountRecovery,
    pub email_style: VerificationStyle,
    pub auto_verify_email: bool,
    #[validate(length(min = 1, message = "At least one standard attribute is required"))]
    pub standard_attributes: Vec<StandardAttribute>,
}

impl IdentityPool {
    /// Self-service signup directory verified by an emailed numeric code,
    /// with `email` required and mutable.
    pub fn self_service_email() -> Self {
        Self {
            self_sign_up_enabled: true,
            account_recovery: AccountRecovery::PhoneAndEmail,
            email_style: VerificationStyle::Code,
            auto_verify_email: true,
            standard_attributes: vec![StandardAttribute {
                name: "email".to_string(),
                required: true,
                mutable: true,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClient {
    pub user_pool: LogicalId,
}
