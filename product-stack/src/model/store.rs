use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
}

impl AttributeType {
    pub fn code(self) -> &'static str {
        match self {
            AttributeType::String => "S",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct KeyAttribute {
    #[validate(length(min = 1, max = 255, message = "Key name must be 1-255 characters"))]
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    PayPerRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GlobalSecondaryIndex {
    #[validate(length(min = 3, max = 255, message = "Index name must be 3-255 characters"))]
    pub index_name: String,
    pub partition_key: KeyAttribute,
}

impl GlobalSecondaryIndex {
    pub fn new(index_name: impl Into<String>, partition_key: KeyAttribute) -> Self {
        Self {
            index_name: index_name.into(),
            partition_key,
        }
    }
}

/// Key-value table. The partition key is fixed at construction; indexes are
/// appended through the composition builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStore {
    partition_key: KeyAttribute,
    billing_mode: BillingMode,
    global_secondary_indexes: Vec<GlobalSecondaryIndex>,
}

impl DataStore {
    pub fn new(partition_key: KeyAttribute, billing_mode: BillingMode) -> Self {
        Self {
            partition_key,
            billing_mode,
            global_secondary_indexes: Vec::new(),
        }
    }

    pub fn on_demand(partition_key: KeyAttribute) -> Self {
        Self::new(partition_key, BillingMode::PayPerRequest)
    }

    pub fn partition_key(&self) -> &KeyAttribute {
        &self.partition_key
    }

    pub fn billing_mode(&self) -> BillingMode {
        self.billing_mode
    }

    pub fn global_secondary_indexes(&self) -> &[GlobalSecondaryIndex] {
        &self.global_secondary_indexes
    }

    pub fn index(&self, index_name: &str) -> Option<&GlobalSecondaryIndex> {
        self.global_secondary_indexes
            .iter()
            .find(|index| index.index_name == index_name)
    }

    /// Key attributes in definition order, deduplicated by name.
    pub fn key_attributes(&self) -> Vec<&KeyAttribute> {
        let mut keys = vec![&self.partition_key];
        for index in &self.global_secondary_indexes {
            if !keys.iter().any(|k| k.name == index.partition_key.name) {
                keys.push(&index.partition_key);
            }
        }
        keys
    }

    pub(crate) fn push_index(&mut self, index: GlobalSecondaryIndex) {
        self.global_secondary_indexes.push(index);
    }
}
