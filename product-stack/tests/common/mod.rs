//! Shared fixtures for product-stack integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use product_stack::engine::DeployTarget;
use product_stack::schema::SchemaSource;
use product_stack::stack::ProductStackProps;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const STACK_NAME: &str = "ProductApiStack";
pub const SCHEMA_PATH: &str = "graphql/schema.graphql";
pub const PRODUCT_SCHEMA: &str = include_str!("../../graphql/schema.graphql");

/// Fixed declaration instant so API key expiries are comparable.
pub fn declared_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn schema() -> SchemaSource {
    SchemaSource::from_definition(SCHEMA_PATH, PRODUCT_SCHEMA).expect("product schema parses")
}

pub fn props() -> ProductStackProps {
    ProductStackProps::new(STACK_NAME, schema(), declared_at())
}

pub fn target() -> DeployTarget {
    DeployTarget {
        account: "123456789012".to_string(),
        region: "us-east-1".to_string(),
    }
}

/// On-disk layout the local engine expects: the schema file and the
/// handler artifact directory under one root.
pub struct AssetRoot {
    pub dir: TempDir,
}

impl AssetRoot {
    pub fn new() -> Self {
        Self::with_schema(PRODUCT_SCHEMA)
    }

    pub fn with_schema(sdl: &str) -> Self {
        let root = Self::empty();
        root.write_schema(sdl);
        root.write_artifact();
        root
    }

    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_schema(&self, sdl: &str) {
        let path = self.dir.path().join(SCHEMA_PATH);
        fs::create_dir_all(path.parent().expect("schema has a parent")).expect("create graphql dir");
        fs::write(path, sdl).expect("write schema");
    }

    pub fn write_artifact(&self) {
        let dir = self.dir.path().join("lambda-fns");
        fs::create_dir_all(&dir).expect("create artifact dir");
        fs::write(dir.join("main.js"), "exports.handler = async () => null;\n")
            .expect("write artifact");
    }
}
