use crate::engine::DeployTarget;
use serde::Deserialize;
use stack_core::config as core_config;
use stack_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub stack_name: String,
    pub log_level: String,
    pub target: DeployTarget,
    /// Schema location, relative to `asset_root` unless absolute.
    pub schema_path: PathBuf,
    pub asset_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl StackConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_vars(common_config, |key| env::var(key).ok())
    }

    /// Assemble the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let var = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let config = StackConfig {
            common,
            environment: environment.clone(),
            stack_name: var("STACK_NAME", Some("ProductApiStack"))?,
            log_level: var("LOG_LEVEL", Some("info"))?,
            target: DeployTarget {
                account: var("PERSONALACCOUNT", Some("123456789012"))?,
                region: var("REGION", Some("us-east-1"))?,
            },
            schema_path: PathBuf::from(var("SCHEMA_PATH", Some("graphql/schema.graphql"))?),
            asset_root: PathBuf::from(var("ASSET_ROOT", Some("."))?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Schema path as the binary reads it.
    pub fn schema_file(&self) -> PathBuf {
        if self.schema_path.is_absolute() {
            self.schema_path.clone()
        } else {
            self.asset_root.join(&self.schema_path)
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.stack_name.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STACK_NAME cannot be empty"
            )));
        }

        if self.environment == Environment::Prod && self.target.account == "123456789012" {
            tracing::warn!("PERSONALACCOUNT is the placeholder account in production");
        }

        Ok(())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
