use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_synth_dir")]
    pub synth_dir: PathBuf,
}

fn default_synth_dir() -> PathBuf {
    PathBuf::from("synth.out")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            synth_dir: default_synth_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
