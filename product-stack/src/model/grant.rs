use super::LogicalId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    Full,
}

impl AccessScope {
    pub fn actions(self) -> &'static [&'static str] {
        match self {
            AccessScope::Full => &["dynamodb:*"],
        }
    }
}

/// Authorizes `subject` to act on `object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub subject: LogicalId,
    pub object: LogicalId,
    pub scope: AccessScope,
}
